//! services/studio/src/web/license.rs
//!
//! License endpoints: checking an entered key and closing the invalid-key
//! notice.

use crate::web::{
    port_error,
    protocol::{LicensePayload, LicenseView},
    state::AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::error;

async fn license_view(app_state: &AppState) -> LicenseView {
    LicenseView::from(&*app_state.license.lock().await)
}

/// Returns the license gate.
#[utoipa::path(
    get,
    path = "/license",
    responses((status = 200, description = "The license gate", body = LicenseView))
)]
pub async fn get_license_handler(State(app_state): State<Arc<AppState>>) -> Json<LicenseView> {
    Json(license_view(&app_state).await)
}

/// Checks a license key with the remote service.
///
/// A confirmed key is stored and unlocks the gated features. A rejected key
/// clears any stored key and raises the notice. A failed check changes nothing
/// that is stored.
#[utoipa::path(
    post,
    path = "/license",
    request_body = LicensePayload,
    responses(
        (status = 200, description = "The gate after the check", body = LicenseView),
        (status = 422, description = "The key was blank"),
        (status = 502, description = "The license service could not be reached")
    )
)]
pub async fn check_license_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<LicensePayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state.check_license(&payload.key).await.map_err(|e| {
        error!("License check failed: {}", e);
        port_error(e)
    })?;
    Ok(Json(license_view(&app_state).await))
}

/// Closes the invalid-key notice. The stored key is only cleared when the
/// notice follows a rejected key.
#[utoipa::path(
    post,
    path = "/license/notice/ack",
    responses((status = 200, description = "Notice closed", body = LicenseView))
)]
pub async fn acknowledge_notice_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let verdict = app_state.license.lock().await.acknowledge_notice();
    if let Some(verdict) = verdict {
        app_state.apply_verdict(&verdict).await.map_err(port_error)?;
    }
    Ok(Json(license_view(&app_state).await))
}
