//! crates/freeplotter_core/src/session.rs
//!
//! The writing session controller. It owns the in-memory state of the active
//! story and turns user actions into state changes plus outgoing requests.
//!
//! Remote calls are split into two phases so that no lock has to be held while
//! a request is in flight: an action mutates the state and returns a request
//! tagged with a [`Ticket`], and the caller later hands the outcome back to a
//! `complete_*` method, which drops it if a newer request superseded it.

use crate::domain::{
    QuestionRequest, SessionPhase, ShowingRequest, Story, StoryId, SuggestionState, WritingState,
};
use crate::ports::{PortError, PortResult, StoryStore};
use crate::sequence::{RequestSequencer, RequestSlot, Ticket};
use chrono::Utc;

pub const ANALYZING_PLACEHOLDER: &str = "Analyzing your story's progression...";
pub const PROMPT_FALLBACK: &str =
    "There's an error while generating question, please contact support.";
pub const SUGGESTION_PLACEHOLDER: &str =
    "Thinking possibilities of \"Show Don't Tell\" suggestion...";
pub const NEW_STORY_WARNING: &str =
    "Start a new story? The current one stays saved and can be reopened from the story list.";

/// A follow-up question request issued by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub ticket: Ticket,
    pub body: QuestionRequest,
}

/// A "show don't tell" request issued by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub ticket: Ticket,
    pub body: ShowingRequest,
}

#[derive(Debug, Clone)]
pub struct WritingSession {
    story_id: StoryId,
    title: String,
    context: String,
    state: WritingState,
    suggestion: SuggestionState,
    sequencer: RequestSequencer,
}

impl Default for WritingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WritingSession {
    /// An empty session under a freshly generated story id.
    pub fn new() -> Self {
        Self {
            story_id: StoryId::generate(),
            title: String::new(),
            context: String::new(),
            state: WritingState::default(),
            suggestion: SuggestionState::default(),
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn from_story(story: &Story) -> Self {
        let mut session = Self::new();
        session.select_story(story);
        session
    }

    pub fn story_id(&self) -> StoryId {
        self.story_id
    }

    pub fn state(&self) -> &WritingState {
        &self.state
    }

    pub fn suggestion(&self) -> &SuggestionState {
        &self.suggestion
    }

    pub fn phase(&self) -> SessionPhase {
        if !self.state.sentences.is_empty() {
            SessionPhase::Drafting
        } else if !self.state.paragraphs.is_empty() {
            SessionPhase::Paragraph
        } else {
            SessionPhase::Empty
        }
    }

    //-------------------------------------------------------------------------------------
    // Sentences and prompts
    //-------------------------------------------------------------------------------------

    /// Appends a sentence and starts a follow-up question request.
    pub fn submit_sentence(&mut self, text: &str) -> PortResult<PromptRequest> {
        let sentence = text.trim();
        if sentence.is_empty() {
            return Err(PortError::Validation(
                "Please write a sentence first.".to_string(),
            ));
        }

        self.state.sentences.push(sentence.to_string());
        self.state.is_loading = true;
        self.state.current_prompt = Some(ANALYZING_PLACEHOLDER.to_string());

        let body = QuestionRequest {
            sentences: self.state.sentences.join(" "),
            paragraph: join_non_empty(&self.state.paragraphs),
        };
        Ok(PromptRequest {
            ticket: self.sequencer.issue(RequestSlot::Prompt),
            body,
        })
    }

    /// Applies the outcome of a prompt request.
    ///
    /// Returns `Ok(false)` when the ticket was superseded and the outcome was
    /// dropped, and the request's error when the current request failed.
    pub fn complete_prompt(
        &mut self,
        ticket: Ticket,
        outcome: PortResult<String>,
    ) -> PortResult<bool> {
        if !self.sequencer.is_current(ticket) {
            return Ok(false);
        }

        self.state.is_loading = false;
        match outcome {
            Ok(question) => {
                let question = question.trim();
                self.state.current_prompt = Some(if question.is_empty() {
                    PROMPT_FALLBACK.to_string()
                } else {
                    question.to_string()
                });
                Ok(true)
            }
            Err(e) => {
                self.state.current_prompt = None;
                Err(e)
            }
        }
    }

    //-------------------------------------------------------------------------------------
    // Paragraphs
    //-------------------------------------------------------------------------------------

    /// Commits the pending sentences as one paragraph. Returns `false` when
    /// there was nothing to commit.
    pub fn promote_paragraph(&mut self) -> bool {
        if self.state.sentences.is_empty() {
            return false;
        }

        let paragraph = self.state.sentences.join(" ");
        self.state.paragraphs.push(paragraph);
        self.state.sentences.clear();
        self.state.is_loading = false;
        true
    }

    /// Starts a question request about the newest paragraph, using the earlier
    /// paragraphs as context.
    pub fn paragraph_prompt(&mut self) -> Option<PromptRequest> {
        let (latest, earlier) = self.state.paragraphs.split_last()?;
        let body = QuestionRequest {
            sentences: latest.clone(),
            paragraph: join_non_empty(earlier),
        };

        self.state.is_loading = true;
        self.state.current_prompt = Some(ANALYZING_PLACEHOLDER.to_string());
        Some(PromptRequest {
            ticket: self.sequencer.issue(RequestSlot::Prompt),
            body,
        })
    }

    /// Overwrites a committed paragraph. An open suggestion for that paragraph
    /// is dismissed when the text actually changes.
    pub fn edit_paragraph(&mut self, index: usize, text: &str) -> PortResult<()> {
        let paragraph = self
            .state
            .paragraphs
            .get_mut(index)
            .ok_or_else(|| PortError::Validation(format!("No paragraph at index {}", index)))?;

        if paragraph.as_str() == text {
            return Ok(());
        }
        *paragraph = text.to_string();

        let suggestion_open =
            self.suggestion.is_loading || self.suggestion.current_suggestion.is_some();
        if suggestion_open && self.suggestion.paragraph_index == index {
            self.dismiss_suggestion();
        }
        Ok(())
    }

    //-------------------------------------------------------------------------------------
    // Suggestions
    //-------------------------------------------------------------------------------------

    /// Opens a suggestion for one paragraph, replacing any suggestion already open.
    pub fn request_suggestion(&mut self, index: usize) -> PortResult<SuggestionRequest> {
        let paragraph = self
            .state
            .paragraphs
            .get(index)
            .cloned()
            .ok_or_else(|| PortError::Validation(format!("No paragraph at index {}", index)))?;

        self.suggestion = SuggestionState {
            paragraph_index: index,
            current_suggestion: Some(SUGGESTION_PLACEHOLDER.to_string()),
            is_loading: true,
        };

        // Only the paragraphs before the target count as context.
        let body = ShowingRequest {
            paragraph,
            prev_paragraph: join_non_empty(&self.state.paragraphs[..index]),
        };
        Ok(SuggestionRequest {
            ticket: self.sequencer.issue(RequestSlot::Suggestion),
            body,
        })
    }

    pub fn complete_suggestion(
        &mut self,
        ticket: Ticket,
        outcome: PortResult<String>,
    ) -> PortResult<bool> {
        if !self.sequencer.is_current(ticket) {
            return Ok(false);
        }

        self.suggestion.is_loading = false;
        match outcome {
            Ok(story) => {
                self.suggestion.current_suggestion = Some(story);
                Ok(true)
            }
            Err(e) => {
                self.suggestion.current_suggestion = None;
                Err(e)
            }
        }
    }

    pub fn dismiss_suggestion(&mut self) {
        self.suggestion = SuggestionState::default();
        self.sequencer.invalidate(RequestSlot::Suggestion);
    }

    //-------------------------------------------------------------------------------------
    // Story switching
    //-------------------------------------------------------------------------------------

    /// Makes a persisted story the active one.
    pub fn select_story(&mut self, story: &Story) {
        self.story_id = story.id;
        self.title = story.title.clone();
        self.context = story.context.clone();
        self.state = WritingState {
            sentences: story.sentences.clone(),
            paragraphs: story.paragraphs.clone(),
            current_prompt: None,
            is_loading: false,
        };
        self.suggestion = SuggestionState::default();
        self.sequencer.invalidate_all();
    }

    /// Resets to an empty session under a fresh id. A session with committed
    /// paragraphs is only abandoned when `confirm` is set.
    pub fn new_story(&mut self, confirm: bool) -> PortResult<StoryId> {
        if !self.state.paragraphs.is_empty() && !confirm {
            return Err(PortError::ConfirmationRequired(
                NEW_STORY_WARNING.to_string(),
            ));
        }

        self.story_id = StoryId::generate();
        self.title.clear();
        self.context.clear();
        self.state = WritingState::default();
        self.suggestion = SuggestionState::default();
        self.sequencer.invalidate_all();
        Ok(self.story_id)
    }

    /// The full story record for the current session, or `None` while the
    /// session holds no text.
    pub fn snapshot(&self) -> Option<Story> {
        if self.state.sentences.is_empty() && self.state.paragraphs.is_empty() {
            return None;
        }

        Some(Story {
            id: self.story_id,
            title: self.title.clone(),
            context: self.context.clone(),
            date: Utc::now(),
            sentences: self.state.sentences.clone(),
            paragraphs: self.state.paragraphs.clone(),
        })
    }
}

/// Upserts the session's snapshot. Returns `false` when there was nothing to save.
pub async fn persist_snapshot(store: &dyn StoryStore, session: &WritingSession) -> PortResult<bool> {
    match session.snapshot() {
        Some(story) => {
            store.upsert_story(&story).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn join_non_empty(paragraphs: &[String]) -> Option<String> {
    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStoryStore;

    fn session_with(sentences: &[&str], paragraphs: &[&str]) -> WritingSession {
        let story = Story {
            id: StoryId::generate(),
            title: String::new(),
            context: String::new(),
            date: Utc::now(),
            sentences: sentences.iter().map(|s| s.to_string()).collect(),
            paragraphs: paragraphs.iter().map(|s| s.to_string()).collect(),
        };
        WritingSession::from_story(&story)
    }

    #[test]
    fn test_submit_sentence_appends_trimmed_text() {
        let mut session = WritingSession::new();
        let request = session.submit_sentence("  The rain fell.  ").unwrap();

        assert_eq!(session.state().sentences, vec!["The rain fell."]);
        assert!(session.state().paragraphs.is_empty());
        assert!(session.state().is_loading);
        assert_eq!(
            session.state().current_prompt.as_deref(),
            Some(ANALYZING_PLACEHOLDER)
        );
        assert_eq!(request.body.sentences, "The rain fell.");
        assert_eq!(request.body.paragraph, None);
        assert_eq!(session.phase(), SessionPhase::Drafting);
    }

    #[test]
    fn test_submit_blank_sentence_is_rejected() {
        let mut session = WritingSession::new();
        let err = session.submit_sentence("   ").unwrap_err();

        assert!(matches!(err, PortError::Validation(_)));
        assert!(session.state().sentences.is_empty());
        assert!(!session.state().is_loading);
    }

    #[test]
    fn test_question_request_carries_paragraph_context() {
        let mut session = session_with(&["She ran."], &["First.", "Second."]);
        let request = session.submit_sentence("He followed.").unwrap();

        assert_eq!(request.body.sentences, "She ran. He followed.");
        assert_eq!(request.body.paragraph.as_deref(), Some("First.\nSecond."));
    }

    #[test]
    fn test_complete_prompt_sets_question() {
        let mut session = WritingSession::new();
        let request = session.submit_sentence("The rain fell.").unwrap();

        let applied = session
            .complete_prompt(request.ticket, Ok("Why was she outside?".to_string()))
            .unwrap();

        assert!(applied);
        assert!(!session.state().is_loading);
        assert_eq!(
            session.state().current_prompt.as_deref(),
            Some("Why was she outside?")
        );
    }

    #[test]
    fn test_complete_prompt_falls_back_on_blank_answer() {
        let mut session = WritingSession::new();
        let request = session.submit_sentence("The rain fell.").unwrap();
        session.complete_prompt(request.ticket, Ok("  ".to_string())).unwrap();

        assert_eq!(
            session.state().current_prompt.as_deref(),
            Some(PROMPT_FALLBACK)
        );
    }

    #[test]
    fn test_complete_prompt_failure_clears_loading() {
        let mut session = WritingSession::new();
        let request = session.submit_sentence("The rain fell.").unwrap();
        let err = session
            .complete_prompt(
                request.ticket,
                Err(PortError::Remote {
                    message: "Quota exceeded".to_string(),
                    cause: "limit".to_string(),
                }),
            )
            .unwrap_err();

        assert_eq!(err.to_string(), "Quota exceeded: limit");
        assert!(!session.state().is_loading);
        assert_eq!(session.state().sentences.len(), 1);
    }

    #[test]
    fn test_stale_prompt_response_is_dropped() {
        let mut session = WritingSession::new();
        let first = session.submit_sentence("One.").unwrap();
        let second = session.submit_sentence("Two.").unwrap();

        session
            .complete_prompt(second.ticket, Ok("newest".to_string()))
            .unwrap();
        let applied = session
            .complete_prompt(first.ticket, Ok("oldest".to_string()))
            .unwrap();

        assert!(!applied);
        assert_eq!(session.state().current_prompt.as_deref(), Some("newest"));
    }

    #[test]
    fn test_promote_with_no_sentences_is_noop() {
        let mut session = session_with(&[], &["Only."]);
        assert!(!session.promote_paragraph());
        assert_eq!(session.state().paragraphs.len(), 1);
    }

    #[test]
    fn test_promote_joins_sentences_with_spaces() {
        let mut session = WritingSession::new();
        session.submit_sentence("The rain fell.").unwrap();
        session.submit_sentence("She ran.").unwrap();

        assert!(session.promote_paragraph());
        assert_eq!(session.state().paragraphs, vec!["The rain fell. She ran."]);
        assert!(session.state().sentences.is_empty());
        assert!(!session.state().is_loading);
        assert_eq!(session.phase(), SessionPhase::Paragraph);
    }

    #[test]
    fn test_paragraph_prompt_uses_latest_paragraph() {
        let mut session = session_with(&[], &["First.", "Second."]);
        let request = session.paragraph_prompt().unwrap();

        assert_eq!(request.body.sentences, "Second.");
        assert_eq!(request.body.paragraph.as_deref(), Some("First."));
        assert!(session.state().is_loading);
    }

    #[test]
    fn test_paragraph_prompt_without_paragraphs() {
        let mut session = WritingSession::new();
        assert!(session.paragraph_prompt().is_none());
    }

    #[test]
    fn test_edit_paragraph_out_of_range() {
        let mut session = session_with(&[], &["Only."]);
        assert!(session.edit_paragraph(3, "x").is_err());
    }

    #[test]
    fn test_edit_paragraph_dismisses_its_suggestion() {
        let mut session = session_with(&[], &["First.", "Second."]);
        let request = session.request_suggestion(1).unwrap();
        session
            .complete_suggestion(request.ticket, Ok("Shown.".to_string()))
            .unwrap();

        session.edit_paragraph(1, "Second, revised.").unwrap();

        assert_eq!(session.state().paragraphs[1], "Second, revised.");
        assert_eq!(session.suggestion(), &SuggestionState::default());
    }

    #[test]
    fn test_edit_other_paragraph_keeps_suggestion() {
        let mut session = session_with(&[], &["First.", "Second."]);
        let request = session.request_suggestion(1).unwrap();
        session
            .complete_suggestion(request.ticket, Ok("Shown.".to_string()))
            .unwrap();

        session.edit_paragraph(0, "First, revised.").unwrap();

        assert_eq!(
            session.suggestion().current_suggestion.as_deref(),
            Some("Shown.")
        );
    }

    #[test]
    fn test_suggestion_uses_only_preceding_paragraphs() {
        let mut session = session_with(&[], &["A.", "B.", "C."]);
        let request = session.request_suggestion(1).unwrap();

        assert_eq!(request.body.paragraph, "B.");
        assert_eq!(request.body.prev_paragraph.as_deref(), Some("A."));
        assert_eq!(session.suggestion().paragraph_index, 1);
        assert!(session.suggestion().is_loading);
        assert_eq!(
            session.suggestion().current_suggestion.as_deref(),
            Some(SUGGESTION_PLACEHOLDER)
        );

        let first = session.request_suggestion(0).unwrap();
        assert_eq!(first.body.prev_paragraph, None);
    }

    #[test]
    fn test_new_suggestion_replaces_pending_one() {
        let mut session = session_with(&[], &["A.", "B."]);
        let first = session.request_suggestion(0).unwrap();
        let second = session.request_suggestion(1).unwrap();

        assert!(!session
            .complete_suggestion(first.ticket, Ok("late".to_string()))
            .unwrap());
        assert!(session
            .complete_suggestion(second.ticket, Ok("fresh".to_string()))
            .unwrap());
        assert_eq!(session.suggestion().paragraph_index, 1);
        assert_eq!(
            session.suggestion().current_suggestion.as_deref(),
            Some("fresh")
        );
    }

    #[test]
    fn test_dismiss_drops_in_flight_suggestion() {
        let mut session = session_with(&[], &["A."]);
        let request = session.request_suggestion(0).unwrap();
        session.dismiss_suggestion();

        assert!(!session
            .complete_suggestion(request.ticket, Ok("late".to_string()))
            .unwrap());
        assert_eq!(session.suggestion(), &SuggestionState::default());
    }

    #[test]
    fn test_select_story_replaces_state() {
        let mut session = WritingSession::new();
        let pending = session.submit_sentence("Old.").unwrap();
        let story = Story {
            id: StoryId::generate(),
            title: "Kept".to_string(),
            context: String::new(),
            date: Utc::now(),
            sentences: vec!["Pending.".to_string()],
            paragraphs: vec!["Done.".to_string()],
        };

        session.select_story(&story);

        assert_eq!(session.story_id(), story.id);
        assert_eq!(session.state().sentences, vec!["Pending."]);
        assert_eq!(session.state().paragraphs, vec!["Done."]);
        assert_eq!(session.state().current_prompt, None);
        assert!(!session
            .complete_prompt(pending.ticket, Ok("stale".to_string()))
            .unwrap());
        assert_eq!(session.snapshot().unwrap().title, "Kept");
    }

    #[test]
    fn test_new_story_requires_confirmation_with_paragraphs() {
        let mut session = session_with(&[], &["Done."]);
        let before = session.story_id();

        let err = session.new_story(false).unwrap_err();
        assert!(matches!(err, PortError::ConfirmationRequired(_)));
        assert_eq!(session.story_id(), before);

        let fresh = session.new_story(true).unwrap();
        assert_ne!(fresh, before);
        assert_eq!(session.phase(), SessionPhase::Empty);
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn test_new_story_without_paragraphs_needs_no_confirmation() {
        let mut session = WritingSession::new();
        session.submit_sentence("Draft.").unwrap();
        assert!(session.new_story(false).is_ok());
    }

    #[tokio::test]
    async fn test_persist_and_reload_round_trip() {
        let store = MemoryStoryStore::new();
        let mut session = WritingSession::new();

        assert!(!persist_snapshot(&store, &session).await.unwrap());

        session.submit_sentence("The rain fell.").unwrap();
        session.submit_sentence("She ran.").unwrap();
        session.promote_paragraph();
        session.submit_sentence("Thunder.").unwrap();
        session.edit_paragraph(0, "The rain fell hard. She ran.").unwrap();
        assert!(persist_snapshot(&store, &session).await.unwrap());

        let stored = store
            .get_story(session.story_id())
            .await
            .unwrap()
            .expect("story should be stored");
        let reloaded = WritingSession::from_story(&stored);

        assert_eq!(reloaded.state().sentences, session.state().sentences);
        assert_eq!(reloaded.state().paragraphs, session.state().paragraphs);
    }
}
