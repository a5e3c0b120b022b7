//! Error types for the overlay layer.

use thiserror::Error;

/// Result type alias using OverlayError.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Primary error type for overlay operations.
///
/// Cloneable because one fetch outcome is shared by every caller attached
/// to the same in-flight request.
#[derive(Debug, Clone, Error)]
pub enum OverlayError {
    // === Input Errors ===
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Upstream Errors ===
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Upstream returned status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("Malformed upstream response: {0}")]
    Decode(String),

    #[error("Request timeout")]
    Timeout,

    // === Lifecycle Errors ===
    #[error("Fetch task aborted: {0}")]
    Aborted(String),

    #[error("Controller has been shut down")]
    ShutDown,
}

impl OverlayError {
    /// Whether surfacing a retry affordance makes sense for this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            OverlayError::Upstream(_)
            | OverlayError::Timeout
            | OverlayError::Aborted(_)
            | OverlayError::Decode(_) => true,
            OverlayError::UpstreamStatus { status, .. } => *status >= 500 || *status == 429,
            OverlayError::InvalidBounds(_)
            | OverlayError::InvalidTime(_)
            | OverlayError::InvalidConfig(_)
            | OverlayError::ShutDown => false,
        }
    }
}

impl From<serde_json::Error> for OverlayError {
    fn from(err: serde_json::Error) -> Self {
        OverlayError::Decode(format!("JSON error: {}", err))
    }
}
