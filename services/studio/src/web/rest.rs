//! services/studio/src/web/rest.rs
//!
//! Contains the Axum handlers for the writing session and story endpoints,
//! and the master definition for the OpenAPI specification.

use crate::web::{
    license, order, outline, port_error,
    protocol::{
        LicensePayload, LicenseView, NewStoryPayload, OrderReceiptView, OutlineFieldsPayload,
        OutlineView, ParagraphPayload, PlotPayload, PlotView, QuoteView, ReorderPayload,
        SentencePayload, SessionView, StoryEntryView, SuggestionView,
    },
    session_task,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use freeplotter_core::{persist_snapshot, ports::PortError, story_index, StoryId};
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        get_session_handler,
        submit_sentence_handler,
        promote_paragraph_handler,
        edit_paragraph_handler,
        request_suggestion_handler,
        dismiss_suggestion_handler,
        list_stories_handler,
        select_story_handler,
        new_story_handler,
        outline::get_outline_handler,
        outline::update_outline_handler,
        outline::add_plot_handler,
        outline::update_plot_handler,
        outline::remove_plot_handler,
        outline::reorder_plots_handler,
        outline::generate_outline_handler,
        outline::reset_outline_handler,
        license::get_license_handler,
        license::check_license_handler,
        license::acknowledge_notice_handler,
        order::quote_handler,
        order::submit_order_handler,
        order::last_order_handler,
        order::reset_order_handler,
    ),
    components(
        schemas(
            SessionView, SuggestionView, SentencePayload, ParagraphPayload, StoryEntryView,
            NewStoryPayload, OutlineView, PlotView, OutlineFieldsPayload, PlotPayload,
            ReorderPayload, LicenseView, LicensePayload, QuoteView, OrderReceiptView
        )
    ),
    tags(
        (name = "Freeplotter Studio API", description = "Writing session, outline and license endpoints for the Freeplotter editor.")
    )
)]
pub struct ApiDoc;

async fn session_view(app_state: &AppState) -> SessionView {
    SessionView::from(&*app_state.session.lock().await)
}

//=========================================================================================
// Writing Session Handlers
//=========================================================================================

/// Returns the active writing session.
#[utoipa::path(
    get,
    path = "/session",
    responses((status = 200, description = "The active session", body = SessionView))
)]
pub async fn get_session_handler(State(app_state): State<Arc<AppState>>) -> Json<SessionView> {
    Json(session_view(&app_state).await)
}

/// Appends a sentence and waits for the assistant's follow-up question.
#[utoipa::path(
    post,
    path = "/session/sentences",
    request_body = SentencePayload,
    responses(
        (status = 200, description = "Sentence added; the session carries the new question", body = SessionView),
        (status = 422, description = "The sentence was blank"),
        (status = 502, description = "The question service failed")
    )
)]
pub async fn submit_sentence_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SentencePayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    session_task::submit_sentence(&app_state, &payload.text)
        .await
        .map_err(port_error)?;
    Ok(Json(session_view(&app_state).await))
}

/// Commits the pending sentences as one paragraph.
#[utoipa::path(
    post,
    path = "/session/paragraphs",
    responses(
        (status = 200, description = "The session after promotion (unchanged when nothing was pending)", body = SessionView),
        (status = 502, description = "The follow-up question failed")
    )
)]
pub async fn promote_paragraph_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let promoted = session_task::promote_paragraph(&app_state)
        .await
        .map_err(port_error)?;
    if promoted {
        info!("Paragraph committed.");
    }
    Ok(Json(session_view(&app_state).await))
}

/// Overwrites one committed paragraph.
#[utoipa::path(
    put,
    path = "/session/paragraphs/{index}",
    request_body = ParagraphPayload,
    params(("index" = usize, Path, description = "Zero-based paragraph index")),
    responses(
        (status = 200, description = "Paragraph updated", body = SessionView),
        (status = 422, description = "No paragraph at that index")
    )
)]
pub async fn edit_paragraph_handler(
    State(app_state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(payload): Json<ParagraphPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut session = app_state.session.lock().await;
    session
        .edit_paragraph(index, &payload.text)
        .map_err(port_error)?;
    persist_snapshot(app_state.stories.as_ref(), &session)
        .await
        .map_err(port_error)?;
    Ok(Json(SessionView::from(&*session)))
}

/// Requests a "show don't tell" rewrite of one paragraph.
#[utoipa::path(
    post,
    path = "/session/paragraphs/{index}/suggestion",
    params(("index" = usize, Path, description = "Zero-based paragraph index")),
    responses(
        (status = 200, description = "The session carrying the suggestion", body = SessionView),
        (status = 422, description = "No paragraph at that index"),
        (status = 502, description = "The suggestion service failed")
    )
)]
pub async fn request_suggestion_handler(
    State(app_state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    session_task::request_suggestion(&app_state, index)
        .await
        .map_err(port_error)?;
    Ok(Json(session_view(&app_state).await))
}

/// Closes the open suggestion, dropping any response still in flight.
#[utoipa::path(
    delete,
    path = "/session/suggestion",
    responses((status = 200, description = "Suggestion dismissed", body = SessionView))
)]
pub async fn dismiss_suggestion_handler(State(app_state): State<Arc<AppState>>) -> Json<SessionView> {
    let mut session = app_state.session.lock().await;
    session.dismiss_suggestion();
    Json(SessionView::from(&*session))
}

//=========================================================================================
// Story Handlers
//=========================================================================================

/// Lists every stored story, newest first.
#[utoipa::path(
    get,
    path = "/stories",
    responses((status = 200, description = "The story index", body = [StoryEntryView]))
)]
pub async fn list_stories_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let stories = app_state.stories.list_stories().await.map_err(port_error)?;
    let entries: Vec<StoryEntryView> = story_index(&stories)
        .into_iter()
        .map(StoryEntryView::from)
        .collect();
    Ok(Json(entries))
}

/// Makes a stored story the active session.
#[utoipa::path(
    post,
    path = "/stories/{id}/select",
    params(("id" = String, Path, description = "The story id")),
    responses(
        (status = 200, description = "Story selected", body = SessionView),
        (status = 404, description = "No story with that id")
    )
)]
pub async fn select_story_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let not_found = || PortError::NotFound(format!("Story {} not found", id));
    let story_id = id.parse::<StoryId>().map_err(|_| port_error(not_found()))?;
    let story = app_state
        .stories
        .get_story(story_id)
        .await
        .map_err(port_error)?
        .ok_or_else(|| port_error(not_found()))?;

    let mut session = app_state.session.lock().await;
    session.select_story(&story);
    info!("Selected story {}", story_id);
    Ok(Json(SessionView::from(&*session)))
}

/// Starts a new story. Requires a confirmed license, and `confirm` when the
/// current story already has paragraphs.
#[utoipa::path(
    post,
    path = "/stories",
    request_body = NewStoryPayload,
    responses(
        (status = 201, description = "New empty session", body = SessionView),
        (status = 403, description = "No confirmed license"),
        (status = 409, description = "The current story has paragraphs and `confirm` was not set")
    )
)]
pub async fn new_story_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<NewStoryPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut session = app_state.session.lock().await;
    let story_id = session.new_story(payload.confirm).map_err(port_error)?;
    info!("Started new story {}", story_id);
    Ok((StatusCode::CREATED, Json(SessionView::from(&*session))))
}
