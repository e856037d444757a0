//! services/studio/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser UI and the studio.
//! JSON and query keys are camelCase. Only the multipart order form keeps the
//! snake_case field names of the remote order endpoint.

use chrono::{DateTime, Utc};
use freeplotter_core::{
    order::{tier, Quote},
    LicenseGate, LicenseStatus, LicenseType, OrderReceipt, OutlineDraft, SessionPhase,
    StoryListEntry, WritingSession,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

//=========================================================================================
// Writing Session
//=========================================================================================

#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionView {
    pub paragraph_index: usize,
    pub current_suggestion: Option<String>,
    pub is_loading: bool,
}

/// The active writing session as the editor renders it.
#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub story_id: String,
    /// One of `empty`, `drafting` or `paragraph`.
    pub phase: String,
    pub sentences: Vec<String>,
    pub paragraphs: Vec<String>,
    pub current_prompt: Option<String>,
    pub is_loading: bool,
    pub suggestion: SuggestionView,
}

impl From<&WritingSession> for SessionView {
    fn from(session: &WritingSession) -> Self {
        let state = session.state();
        let suggestion = session.suggestion();
        let phase = match session.phase() {
            SessionPhase::Empty => "empty",
            SessionPhase::Drafting => "drafting",
            SessionPhase::Paragraph => "paragraph",
        };
        Self {
            story_id: session.story_id().to_string(),
            phase: phase.to_string(),
            sentences: state.sentences.clone(),
            paragraphs: state.paragraphs.clone(),
            current_prompt: state.current_prompt.clone(),
            is_loading: state.is_loading,
            suggestion: SuggestionView {
                paragraph_index: suggestion.paragraph_index,
                current_suggestion: suggestion.current_suggestion.clone(),
                is_loading: suggestion.is_loading,
            },
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SentencePayload {
    pub text: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ParagraphPayload {
    pub text: String,
}

//=========================================================================================
// Stories
//=========================================================================================

/// One row of the story sidebar.
#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoryEntryView {
    pub id: String,
    pub date: DateTime<Utc>,
    pub title: String,
    pub context: String,
    pub paragraph: String,
}

impl From<StoryListEntry> for StoryEntryView {
    fn from(entry: StoryListEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            date: entry.date,
            title: entry.title,
            context: entry.context,
            paragraph: entry.paragraph,
        }
    }
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct NewStoryPayload {
    /// Abandon a story with committed paragraphs.
    #[serde(default)]
    pub confirm: bool,
}

//=========================================================================================
// Outline
//=========================================================================================

#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlotView {
    pub id: String,
    pub context: String,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutlineView {
    pub title: String,
    pub summary: String,
    pub genre: String,
    pub num_chapters: u8,
    pub plots: Vec<PlotView>,
    pub is_full: bool,
}

impl From<&OutlineDraft> for OutlineView {
    fn from(draft: &OutlineDraft) -> Self {
        Self {
            title: draft.title().to_string(),
            summary: draft.summary().to_string(),
            genre: draft.genre().to_string(),
            num_chapters: draft.num_chapters(),
            plots: draft
                .plots()
                .items()
                .iter()
                .map(|plot| PlotView {
                    id: plot.id.to_string(),
                    context: plot.context.clone(),
                })
                .collect(),
            is_full: draft.plots().is_full(),
        }
    }
}

/// Partial update of the draft's form fields. Absent fields are left alone.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutlineFieldsPayload {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub genre: Option<String>,
    pub num_chapters: Option<u8>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct PlotPayload {
    pub context: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ReorderPayload {
    pub from: String,
    pub to: String,
}

//=========================================================================================
// License
//=========================================================================================

#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LicenseView {
    /// One of `unchecked`, `checking`, `valid` or `invalid`.
    pub status: String,
    pub unlocked: bool,
    pub notice: Option<String>,
}

impl From<&LicenseGate> for LicenseView {
    fn from(gate: &LicenseGate) -> Self {
        let status = match gate.status() {
            LicenseStatus::Unchecked => "unchecked",
            LicenseStatus::Checking => "checking",
            LicenseStatus::Valid => "valid",
            LicenseStatus::Invalid => "invalid",
        };
        Self {
            status: status.to_string(),
            unlocked: gate.is_unlocked(),
            notice: gate.notice().map(str::to_string),
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LicensePayload {
    pub key: String,
}

//=========================================================================================
// Orders
//=========================================================================================

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    /// 1 for Standard, 2 for Premium.
    pub license_type: u8,
    /// Duration step, 1 to 7.
    pub duration: u8,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteView {
    pub license_type: u8,
    pub label: String,
    pub max_story: u32,
    pub max_paragraph: u32,
    pub max_outline_generation: u32,
    pub duration: String,
    pub list_price: u64,
    pub bundle_price: Option<u64>,
    pub unique_code: u32,
    pub total: u64,
}

impl QuoteView {
    pub fn new(license_type: LicenseType, duration: String, quote: Quote) -> Self {
        let tier = tier(license_type);
        Self {
            license_type: license_type.code(),
            label: tier.label.to_string(),
            max_story: tier.max_story,
            max_paragraph: tier.max_paragraph,
            max_outline_generation: tier.max_outline_generation,
            duration,
            list_price: quote.list_price,
            bundle_price: quote.bundle_price,
            unique_code: quote.unique_code,
            total: quote.total,
        }
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceiptView {
    pub license_key: String,
    pub start_date: String,
    pub end_date: String,
}

impl From<OrderReceipt> for OrderReceiptView {
    fn from(receipt: OrderReceipt) -> Self {
        Self {
            license_key: receipt.license_key,
            start_date: receipt.start_date,
            end_date: receipt.end_date,
        }
    }
}
