//! crates/freeplotter_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Identifiers
//=========================================================================================

/// Identifies a story. Backed by a UUID v7, so the hyphenated string form
/// sorts lexicographically in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoryId(Uuid);

impl StoryId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for StoryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identifies one plot point in an outline draft. Stable across reorders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlotId(Uuid);

impl PlotId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for PlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for PlotId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

//=========================================================================================
// Stories
//=========================================================================================

/// One complete writing session: committed paragraphs plus the sentences of the
/// paragraph still being drafted.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub context: String,
    /// Time of the last update.
    pub date: DateTime<Utc>,
    pub sentences: Vec<String>,
    pub paragraphs: Vec<String>,
}

impl Story {
    /// The text shown for this story in the sidebar: the first committed
    /// paragraph, or else the pending sentences.
    pub fn preview(&self) -> String {
        self.paragraphs
            .first()
            .cloned()
            .unwrap_or_else(|| self.sentences.join(" "))
    }
}

/// Sidebar projection of a [`Story`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoryListEntry {
    pub id: StoryId,
    pub date: DateTime<Utc>,
    pub title: String,
    pub context: String,
    pub paragraph: String,
}

impl From<&Story> for StoryListEntry {
    fn from(story: &Story) -> Self {
        Self {
            id: story.id,
            date: story.date,
            title: story.title.clone(),
            context: story.context.clone(),
            paragraph: story.preview(),
        }
    }
}

/// Recomputes the story index from the authoritative story set, keeping the
/// order in which the stories were given.
pub fn story_index(stories: &[Story]) -> Vec<StoryListEntry> {
    stories.iter().map(StoryListEntry::from).collect()
}

//=========================================================================================
// Writing session state
//=========================================================================================

/// The in-memory editing state of the active story.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WritingState {
    pub sentences: Vec<String>,
    pub paragraphs: Vec<String>,
    /// `None`, a loading placeholder, or the latest question from the assistant.
    pub current_prompt: Option<String>,
    pub is_loading: bool,
}

/// Tracks the single paragraph that currently has a "show don't tell" suggestion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionState {
    pub paragraph_index: usize,
    pub current_suggestion: Option<String>,
    pub is_loading: bool,
}

/// Coarse lifecycle of a writing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    /// Sentences are pending, whether or not paragraphs were committed before.
    Drafting,
    /// Only committed paragraphs, no pending sentences.
    Paragraph,
}

/// Body of a follow-up question request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    pub sentences: String,
    pub paragraph: Option<String>,
}

/// Body of a "show don't tell" rewrite request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowingRequest {
    pub paragraph: String,
    pub prev_paragraph: Option<String>,
}

//=========================================================================================
// Licenses
//=========================================================================================

/// An opaque license credential. Never considered valid on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LicenseKey(String);

impl LicenseKey {
    /// Trims the raw input; blank input is not a key.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//=========================================================================================
// Outlines
//=========================================================================================

/// One plot point of an outline draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotItem {
    pub id: PlotId,
    pub context: String,
}

/// Body of an outline generation request. Plot order is meaningful.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineRequest {
    pub title: String,
    pub summary: Option<String>,
    pub genre: String,
    pub num_chapters: u8,
    pub plots: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineSection {
    pub title: String,
    pub content: String,
}

/// What the outline generator returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOutline {
    pub premise: String,
    pub outline: Vec<OutlineSection>,
}

/// Everything that goes into the rendered outline document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineDocument {
    pub title: String,
    pub summary: Option<String>,
    pub premise: String,
    pub sections: Vec<OutlineSection>,
}

/// A rendered, self-contained document ready to hand to a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

//=========================================================================================
// Orders
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LicenseType {
    Standard,
    Premium,
}

impl LicenseType {
    /// The numeric code used on the order form.
    pub fn code(self) -> u8 {
        match self {
            LicenseType::Standard => 1,
            LicenseType::Premium => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(LicenseType::Standard),
            2 => Some(LicenseType::Premium),
            _ => None,
        }
    }
}

/// The bank-transfer receipt attached to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A validated, priced purchase order ready to submit.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSubmission {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub license_type: LicenseType,
    pub price: u64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub receipt: ReceiptImage,
}

/// The issued license returned for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub license_key: String,
    pub start_date: String,
    pub end_date: String,
}
