//! Error types for the HTTP cache
//!
//! Provides unified error handling using thiserror.

use reqwest::StatusCode;
use thiserror::Error;

// == Http Cache Error Enum ==
/// Unified error type for cache operations and the network executor.
#[derive(Error, Debug)]
pub enum HttpCacheError {
    /// The transport failed before a response was obtained
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The origin answered with a status the executor rejects
    #[error("Unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },

    /// The request path could not be resolved to an absolute URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The response body is not the JSON the caller asked for
    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Failure reported by a custom executor
    #[error("Executor error: {0}")]
    Executor(String),
}

impl HttpCacheError {
    /// Returns true for failures caused by the network round trip itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            HttpCacheError::Transport(_) | HttpCacheError::Executor(_)
        )
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP cache.
pub type Result<T> = std::result::Result<T, HttpCacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = HttpCacheError::Status {
            status: StatusCode::BAD_GATEWAY,
            url: "https://example.com/a".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unexpected status 502 Bad Gateway from https://example.com/a"
        );
        assert!(!err.is_transport());
    }

    #[test]
    fn test_invalid_url_from_parse_error() {
        let err: HttpCacheError = url::Url::parse("relative/path").unwrap_err().into();
        assert!(matches!(err, HttpCacheError::InvalidUrl(_)));
    }

    #[test]
    fn test_executor_error_is_transport() {
        let err = HttpCacheError::Executor("connection reset".to_string());
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "Executor error: connection reset");
    }
}
