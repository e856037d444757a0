//! services/studio/src/web/outline.rs
//!
//! Handlers for the outline builder: editing the draft's fields and plot
//! points, generating the outline document and starting over.

use crate::web::{
    port_error,
    protocol::{OutlineFieldsPayload, OutlineView, PlotPayload, ReorderPayload},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use freeplotter_core::{
    ports::{PortError, PortResult},
    OutlineDocument, PlotId,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

fn parse_plot_id(raw: &str) -> PortResult<PlotId> {
    raw.parse::<PlotId>()
        .map_err(|_| PortError::NotFound(format!("Plot {} not found", raw)))
}

async fn outline_view(app_state: &AppState) -> OutlineView {
    OutlineView::from(&*app_state.outline.lock().await)
}

/// Returns the outline draft.
#[utoipa::path(
    get,
    path = "/outline",
    responses((status = 200, description = "The outline draft", body = OutlineView))
)]
pub async fn get_outline_handler(State(app_state): State<Arc<AppState>>) -> Json<OutlineView> {
    Json(outline_view(&app_state).await)
}

/// Updates the draft's title, summary, genre or number of chapters.
#[utoipa::path(
    put,
    path = "/outline",
    request_body = OutlineFieldsPayload,
    responses(
        (status = 200, description = "Draft updated", body = OutlineView),
        (status = 422, description = "Unknown genre or chapter count out of range")
    )
)]
pub async fn update_outline_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<OutlineFieldsPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut draft = app_state.outline.lock().await;
    // Validate everything before touching the draft.
    let mut updated = draft.clone();
    if let Some(title) = &payload.title {
        updated.set_title(title);
    }
    if let Some(summary) = &payload.summary {
        updated.set_summary(summary);
    }
    if let Some(genre) = &payload.genre {
        updated.set_genre(genre).map_err(port_error)?;
    }
    if let Some(num_chapters) = payload.num_chapters {
        updated.set_num_chapters(num_chapters).map_err(port_error)?;
    }
    *draft = updated;
    Ok(Json(OutlineView::from(&*draft)))
}

/// Appends an empty plot point.
#[utoipa::path(
    post,
    path = "/outline/plots",
    responses(
        (status = 201, description = "Plot point added", body = OutlineView),
        (status = 422, description = "The plot list is full")
    )
)]
pub async fn add_plot_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut draft = app_state.outline.lock().await;
    draft.plots_mut().add().map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(OutlineView::from(&*draft))))
}

/// Replaces one plot point's text.
#[utoipa::path(
    put,
    path = "/outline/plots/{id}",
    request_body = PlotPayload,
    params(("id" = String, Path, description = "The plot point id")),
    responses(
        (status = 200, description = "Plot point updated", body = OutlineView),
        (status = 404, description = "No plot point with that id")
    )
)]
pub async fn update_plot_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<PlotPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let plot_id = parse_plot_id(&id).map_err(port_error)?;
    let mut draft = app_state.outline.lock().await;
    draft
        .plots_mut()
        .update(plot_id, &payload.context)
        .map_err(port_error)?;
    Ok(Json(OutlineView::from(&*draft)))
}

/// Removes one plot point. The first one cannot be removed.
#[utoipa::path(
    delete,
    path = "/outline/plots/{id}",
    params(("id" = String, Path, description = "The plot point id")),
    responses(
        (status = 200, description = "Plot point removed", body = OutlineView),
        (status = 404, description = "No plot point with that id"),
        (status = 422, description = "The first plot point is pinned")
    )
)]
pub async fn remove_plot_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let plot_id = parse_plot_id(&id).map_err(port_error)?;
    let mut draft = app_state.outline.lock().await;
    draft.plots_mut().remove(plot_id).map_err(port_error)?;
    Ok(Json(OutlineView::from(&*draft)))
}

/// Moves one plot point to the position of another.
#[utoipa::path(
    post,
    path = "/outline/plots/reorder",
    request_body = ReorderPayload,
    responses(
        (status = 200, description = "Plot points reordered", body = OutlineView),
        (status = 404, description = "One of the ids is unknown")
    )
)]
pub async fn reorder_plots_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ReorderPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let from = parse_plot_id(&payload.from).map_err(port_error)?;
    let to = parse_plot_id(&payload.to).map_err(port_error)?;
    let mut draft = app_state.outline.lock().await;
    draft.plots_mut().reorder(from, to).map_err(port_error)?;
    Ok(Json(OutlineView::from(&*draft)))
}

/// Generates the outline and returns the rendered document.
#[utoipa::path(
    post,
    path = "/outline/generate",
    responses(
        (status = 200, description = "The rendered outline document", content_type = "text/html"),
        (status = 403, description = "No confirmed license"),
        (status = 422, description = "The draft needs a title and at least 5 plot points"),
        (status = 502, description = "The outline service failed")
    )
)]
pub async fn generate_outline_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // Rejected drafts never reach the network.
    let request = app_state
        .outline
        .lock()
        .await
        .outline_request()
        .map_err(port_error)?;

    let start_time = Instant::now();
    let outcome = tokio::select! {
        _ = app_state.shutdown.cancelled() => Err(PortError::Cancelled),
        result = app_state.outlines.generate_outline(&request) => result,
    };
    info!("⏱️ Outline generation took: {:?}", start_time.elapsed());

    let generated = outcome.map_err(|e| {
        error!("Outline generation failed: {}", e);
        port_error(e)
    })?;
    let document = OutlineDocument::assemble(&request, generated);
    let rendered = app_state
        .renderer
        .render_outline(&document)
        .map_err(port_error)?;

    Ok(([(header::CONTENT_TYPE, rendered.content_type)], rendered.bytes))
}

/// Starts a blank outline draft.
#[utoipa::path(
    post,
    path = "/outline/reset",
    responses(
        (status = 200, description = "A fresh draft", body = OutlineView),
        (status = 403, description = "No confirmed license")
    )
)]
pub async fn reset_outline_handler(State(app_state): State<Arc<AppState>>) -> Json<OutlineView> {
    let mut draft = app_state.outline.lock().await;
    draft.reset();
    info!("Outline draft reset.");
    Json(OutlineView::from(&*draft))
}
