//! crates/freeplotter_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{
    GeneratedOutline, LicenseKey, OrderReceipt, OrderSubmission, OutlineDocument, OutlineRequest,
    QuestionRequest, RenderedDocument, ShowingRequest, Story, StoryId,
};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// Rejected locally before any network call.
    #[error("{0}")]
    Validation(String),
    /// The remote service answered with an `{ error: true, message, cause }` payload.
    #[error("{message}: {cause}")]
    Remote { message: String, cause: String },
    /// The request never produced a usable response.
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Invalid license key")]
    InvalidLicense,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    ConfirmationRequired(String),
    #[error("Request cancelled")]
    Cancelled,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Local Persistence Ports
//=========================================================================================

#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Every stored story, newest identifier first.
    async fn list_stories(&self) -> PortResult<Vec<Story>>;

    /// A missing id is `Ok(None)`.
    async fn get_story(&self, id: StoryId) -> PortResult<Option<Story>>;

    /// Full overwrite keyed by `story.id`; last write wins.
    async fn upsert_story(&self, story: &Story) -> PortResult<()>;
}

/// Small key-value settings that outlive the process.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn license_key(&self) -> PortResult<Option<LicenseKey>>;

    async fn set_license_key(&self, key: Option<&LicenseKey>) -> PortResult<()>;

    async fn last_order(&self) -> PortResult<Option<OrderReceipt>>;

    async fn set_last_order(&self, order: Option<&OrderReceipt>) -> PortResult<()>;
}

//=========================================================================================
// Remote Service Ports
//=========================================================================================

#[async_trait]
pub trait PromptService: Send + Sync {
    /// Asks for one question that helps the writer continue.
    async fn next_question(&self, request: &QuestionRequest) -> PortResult<String>;
}

#[async_trait]
pub trait ShowingService: Send + Sync {
    /// Rewrites a paragraph using "show, don't tell".
    async fn show_dont_tell(&self, request: &ShowingRequest) -> PortResult<String>;
}

#[async_trait]
pub trait OutlineService: Send + Sync {
    async fn generate_outline(&self, request: &OutlineRequest) -> PortResult<GeneratedOutline>;
}

#[async_trait]
pub trait LicenseService: Send + Sync {
    /// Returns the remote verdict; `Ok(false)` means the key is invalid or expired.
    async fn validate_license(&self, key: &LicenseKey) -> PortResult<bool>;
}

#[async_trait]
pub trait OrderService: Send + Sync {
    async fn submit_order(&self, order: &OrderSubmission) -> PortResult<OrderReceipt>;
}

//=========================================================================================
// Rendering Port
//=========================================================================================

pub trait DocumentRenderer: Send + Sync {
    fn render_outline(&self, document: &OutlineDocument) -> PortResult<RenderedDocument>;
}
