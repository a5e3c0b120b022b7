//! Errors from the wind API client.

use overlay_common::OverlayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WindClientError {
    #[error("HTTP request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {message}")]
    Status {
        endpoint: &'static str,
        status: u16,
        message: String,
    },

    #[error("Invalid JSON from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl WindClientError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            WindClientError::Request { source, .. } => source.is_timeout() || source.is_connect(),
            WindClientError::Status { status, .. } => *status >= 500 || *status == 429,
            WindClientError::Decode { .. } | WindClientError::Config(_) => false,
        }
    }
}

impl From<WindClientError> for OverlayError {
    fn from(err: WindClientError) -> Self {
        match err {
            WindClientError::Request { ref source, .. } if source.is_timeout() => {
                OverlayError::Timeout
            }
            WindClientError::Request { .. } => OverlayError::Upstream(err.to_string()),
            WindClientError::Status {
                status, message, ..
            } => OverlayError::UpstreamStatus { status, message },
            WindClientError::Decode { .. } => OverlayError::Decode(err.to_string()),
            WindClientError::Config(msg) => OverlayError::InvalidConfig(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = WindClientError::Status {
            endpoint: "wind",
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert!(err.is_retryable());
        let overlay: OverlayError = err.into();
        assert!(matches!(
            overlay,
            OverlayError::UpstreamStatus { status: 502, .. }
        ));
    }

    #[test]
    fn test_client_errors_not_retryable() {
        let err = WindClientError::Status {
            endpoint: "wind",
            status: 400,
            message: "bad bounds".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_decode_mapping() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = WindClientError::Decode {
            endpoint: "wind",
            source,
        };
        assert!(!err.is_retryable());
        assert!(matches!(OverlayError::from(err), OverlayError::Decode(_)));
    }
}
