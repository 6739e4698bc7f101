//! Error taxonomy for the fetch layer.
//!
//! Extraction never fails: tier and field misses are `None`, not errors.
//! Only talking to the network can go wrong, and the pipeline turns every
//! `FetchError` into an empty listing or a sentinel record.

use thiserror::Error;

/// Errors raised while building the HTTP client or fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The proxy URL could not be understood.
    #[error("invalid proxy '{proxy}': {source}")]
    InvalidProxy {
        proxy: String,
        #[source]
        source: wreq::Error,
    },

    /// The configured site root or listing path does not form a URL.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] wreq::Error),

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: wreq::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read.
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: wreq::Error,
    },
}

impl FetchError {
    /// HTTP status behind the error, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for failures where a retry could plausibly succeed.
    pub fn is_transient(&self, retryable_status: &[u16]) -> bool {
        match self {
            FetchError::Transport { .. } | FetchError::Body { .. } => true,
            FetchError::Status { status, .. } => retryable_status.contains(status),
            FetchError::InvalidProxy { .. }
            | FetchError::InvalidUrl { .. }
            | FetchError::Client(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = FetchError::Status { url: "https://www.imdb.com/chart/top/".into(), status: 503 };
        assert_eq!(err.to_string(), "https://www.imdb.com/chart/top/ returned HTTP 503");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_is_transient_by_status() {
        let retryable = [429, 500, 502, 503, 504];
        let busy = FetchError::Status { url: "u".into(), status: 429 };
        let missing = FetchError::Status { url: "u".into(), status: 404 };
        assert!(busy.is_transient(&retryable));
        assert!(!missing.is_transient(&retryable));
        assert!(!busy.is_transient(&[]));
    }

    #[test]
    fn test_invalid_url_is_not_transient() {
        let source = url::Url::parse("imdb.com").unwrap_err();
        let err = FetchError::InvalidUrl { url: "imdb.com".into(), source };
        assert!(err.to_string().starts_with("invalid URL 'imdb.com'"));
        assert!(!err.is_transient(&[429, 500, 502, 503, 504]));
        assert_eq!(err.status(), None);
    }
}
