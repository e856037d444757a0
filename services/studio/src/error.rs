//! services/studio/src/error.rs
//!
//! Startup and shutdown failures of the studio binaries. Request-level
//! failures never reach this type; handlers map `PortError` to a status code.

use crate::config::ConfigError;
use freeplotter_core::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Raised while restoring the previous session or building an adapter.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// The story database could not be opened.
    #[error("Story database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Story database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The OpenAPI document could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Binding the listener or writing a generated file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_failures_convert() {
        let missing: AppError = ConfigError::MissingVar("API_URL".to_string()).into();
        assert!(matches!(missing, AppError::Config(_)));

        let cancelled: AppError = PortError::Cancelled.into();
        assert_eq!(cancelled.to_string(), "Service Port Error: Request cancelled");

        let bad_json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(AppError::from(bad_json), AppError::Serialization(_)));
    }
}
