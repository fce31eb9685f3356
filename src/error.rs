//! Typed errors for the argument graph pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Dropped candidates (bad shape, dangling references) are not errors:
//! they are logged and counted in [`crate::pipeline::RunDiagnostics`].
//! A failed chunk is likewise a diagnostics record, never a run abort.

use thiserror::Error;

/// Errors that can occur during pipeline operations.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Reasoning engine transport failure (retryable)
    #[error("engine error: {0}")]
    Engine(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Engine call exceeded the configured per-call timeout (retryable)
    #[error("engine call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Engine reply could not be interpreted as a candidate list (retryable)
    #[error("malformed engine response: {0}")]
    MalformedResponse(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Input page sequence is invalid; the only fail-fast condition
    #[error("invalid page sequence: {reason}")]
    InvalidPages { reason: String },

    /// Run was cancelled between chunks
    #[error("run cancelled")]
    Cancelled,

    /// Configuration error
    #[error("config error: {reason}")]
    Config { reason: String },
}

impl ExtractionError {
    /// Whether the retry loop should attempt this call again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Engine(_) | Self::Timeout { .. } | Self::MalformedResponse(_) | Self::JsonParse(_)
        )
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
