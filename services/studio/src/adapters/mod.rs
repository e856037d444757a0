pub mod db;
pub mod document;
pub mod openai_prompt;
pub mod preferences;
pub mod remote;

pub use db::SqliteStoryStore;
pub use document::HtmlOutlineRenderer;
pub use openai_prompt::OpenAiPromptAdapter;
pub use preferences::FilePreferences;
pub use remote::RemoteApiAdapter;
