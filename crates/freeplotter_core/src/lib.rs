pub mod domain;
pub mod license;
pub mod order;
pub mod outline;
pub mod ports;
pub mod sequence;
pub mod session;
pub mod testing;

pub use domain::{
    story_index, GeneratedOutline, LicenseKey, LicenseType, OrderReceipt, OrderSubmission,
    OutlineDocument, OutlineRequest, OutlineSection, PlotId, PlotItem, QuestionRequest,
    ReceiptImage, RenderedDocument, SessionPhase, ShowingRequest, Story, StoryId, StoryListEntry,
    SuggestionState, WritingState,
};
pub use license::{LicenseCheck, LicenseGate, LicenseStatus, LicenseVerdict};
pub use outline::{OutlineDraft, PlotList};
pub use ports::{
    DocumentRenderer, LicenseService, OrderService, OutlineService, PortError, PortResult,
    PreferenceStore, PromptService, ShowingService, StoryStore,
};
pub use sequence::{RequestSequencer, RequestSlot, Ticket};
pub use session::{persist_snapshot, PromptRequest, SuggestionRequest, WritingSession};
