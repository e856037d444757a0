//! services/studio/src/web/middleware.rs
//!
//! License middleware for protecting gated routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

/// Lets the request through only while a license key is confirmed.
///
/// A stored key alone is not enough: the gate must have seen a successful
/// remote check during this run. Otherwise returns 403 Forbidden.
pub async fn require_license(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let unlocked = state.license.lock().await.require_unlocked();
    if let Err(e) = unlocked {
        warn!("Blocked {} {}: no confirmed license", req.method(), req.uri().path());
        return Err((StatusCode::FORBIDDEN, e.to_string()));
    }

    Ok(next.run(req).await)
}
