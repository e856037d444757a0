//! services/studio/src/web/session_task.rs
//!
//! The asynchronous workers that carry one prompt or suggestion request from
//! the writing session to the remote service and back.
//!
//! The session lock is only held while the request is issued and while its
//! outcome is applied, never across the remote call itself. Whatever changed
//! is persisted before the lock is released.

use crate::web::state::AppState;
use freeplotter_core::{
    persist_snapshot,
    ports::{PortError, PortResult},
    PromptRequest, SuggestionRequest, WritingSession,
};
use std::time::Instant;
use tracing::{error, info, warn};

/// Appends a sentence and waits for the follow-up question.
pub async fn submit_sentence(app_state: &AppState, text: &str) -> PortResult<()> {
    let request = {
        let mut session = app_state.session.lock().await;
        let request = session.submit_sentence(text)?;
        persist_snapshot(app_state.stories.as_ref(), &session).await?;
        request
    };
    run_prompt(app_state, request).await
}

/// Commits the pending sentences as a paragraph. When configured, a question
/// about the new paragraph is requested right away.
pub async fn promote_paragraph(app_state: &AppState) -> PortResult<bool> {
    let follow_up = {
        let mut session = app_state.session.lock().await;
        if !session.promote_paragraph() {
            return Ok(false);
        }
        persist_snapshot(app_state.stories.as_ref(), &session).await?;
        if app_state.config.prompt_after_paragraph {
            session.paragraph_prompt()
        } else {
            None
        }
    };

    if let Some(request) = follow_up {
        run_prompt(app_state, request).await?;
    }
    Ok(true)
}

/// Sends one question request and applies its outcome.
pub async fn run_prompt(app_state: &AppState, request: PromptRequest) -> PortResult<()> {
    let start_time = Instant::now();
    let outcome = tokio::select! {
        _ = app_state.shutdown.cancelled() => Err(PortError::Cancelled),
        result = app_state.prompts.next_question(&request.body) => result,
    };
    info!("⏱️ Question request took: {:?}", start_time.elapsed());

    let mut session = app_state.session.lock().await;
    match session.complete_prompt(request.ticket, outcome) {
        Ok(true) => save(app_state, &session).await,
        Ok(false) => {
            warn!("Discarding a superseded question response.");
            Ok(())
        }
        Err(e) => {
            error!("Question request failed: {}", e);
            Err(e)
        }
    }
}

/// Opens a "show don't tell" suggestion for one paragraph and waits for it.
pub async fn request_suggestion(app_state: &AppState, index: usize) -> PortResult<()> {
    let request = app_state.session.lock().await.request_suggestion(index)?;
    run_suggestion(app_state, request).await
}

pub async fn run_suggestion(app_state: &AppState, request: SuggestionRequest) -> PortResult<()> {
    let start_time = Instant::now();
    let outcome = tokio::select! {
        _ = app_state.shutdown.cancelled() => Err(PortError::Cancelled),
        result = app_state.showing.show_dont_tell(&request.body) => result,
    };
    info!("⏱️ Suggestion request took: {:?}", start_time.elapsed());

    let mut session = app_state.session.lock().await;
    match session.complete_suggestion(request.ticket, outcome) {
        Ok(applied) => {
            if !applied {
                warn!("Discarding a superseded suggestion response.");
            }
            Ok(())
        }
        Err(e) => {
            error!("Suggestion request failed: {}", e);
            Err(e)
        }
    }
}

async fn save(app_state: &AppState, session: &WritingSession) -> PortResult<()> {
    persist_snapshot(app_state.stories.as_ref(), session).await?;
    Ok(())
}
