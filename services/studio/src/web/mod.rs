pub mod license;
pub mod middleware;
pub mod order;
pub mod outline;
pub mod protocol;
pub mod rest;
pub mod session_task;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use freeplotter_core::ports::PortError;
use std::sync::Arc;
use tracing::error;

pub use middleware::require_license;
pub use rest::ApiDoc;
pub use state::{AppState, Ports};

/// Maps a port failure onto the HTTP status the UI reacts to.
pub fn port_error(e: PortError) -> (StatusCode, String) {
    let status = match &e {
        PortError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::ConfirmationRequired(_) => StatusCode::CONFLICT,
        PortError::InvalidLicense | PortError::Unauthorized => StatusCode::FORBIDDEN,
        PortError::Remote { .. } | PortError::Transport(_) => StatusCode::BAD_GATEWAY,
        PortError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        PortError::Unexpected(_) => {
            error!("Unexpected failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

/// Builds every studio route on top of the shared state.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Routes that need a confirmed license.
    let gated_routes = Router::new()
        .route("/stories", post(rest::new_story_handler))
        .route("/outline/generate", post(outline::generate_outline_handler))
        .route("/outline/reset", post(outline::reset_outline_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_license,
        ));

    let open_routes = Router::new()
        .route("/session", get(rest::get_session_handler))
        .route("/session/sentences", post(rest::submit_sentence_handler))
        .route("/session/paragraphs", post(rest::promote_paragraph_handler))
        .route("/session/paragraphs/{index}", put(rest::edit_paragraph_handler))
        .route(
            "/session/paragraphs/{index}/suggestion",
            post(rest::request_suggestion_handler),
        )
        .route(
            "/session/suggestion",
            axum::routing::delete(rest::dismiss_suggestion_handler),
        )
        .route("/stories", get(rest::list_stories_handler))
        .route("/stories/{id}/select", post(rest::select_story_handler))
        .route(
            "/outline",
            get(outline::get_outline_handler).put(outline::update_outline_handler),
        )
        .route("/outline/plots", post(outline::add_plot_handler))
        .route(
            "/outline/plots/{id}",
            put(outline::update_plot_handler).delete(outline::remove_plot_handler),
        )
        .route("/outline/plots/reorder", post(outline::reorder_plots_handler))
        .route(
            "/license",
            get(license::get_license_handler).post(license::check_license_handler),
        )
        .route("/license/notice/ack", post(license::acknowledge_notice_handler))
        .route("/order/quote", get(order::quote_handler))
        .route("/order", post(order::submit_order_handler))
        .route(
            "/order/last",
            get(order::last_order_handler).delete(order::reset_order_handler),
        );

    Router::new()
        .merge(open_routes)
        .merge(gated_routes)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(app_state)
}
