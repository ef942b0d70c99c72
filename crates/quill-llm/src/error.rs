use thiserror::Error;

/// Errors that can occur during completion calls
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider id is not part of the registry
    #[error("provider not found: {provider}")]
    ProviderNotFound { provider: String },

    /// Request never produced a response (connect, TLS, body read, decode)
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Provider answered with a non-success status
    #[error("provider returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body as returned by the provider
        body: String,
    },

    /// Error during streaming response
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// Request could not be translated for the provider
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LlmError {
    /// Whether retrying the same call may succeed
    ///
    /// Transport failures, rate limiting and server-side statuses are
    /// transient; cancellation and malformed requests are not.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream(_) | Self::Streaming(_) => true,
            Self::Status { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            Self::ProviderNotFound { .. } | Self::Cancelled | Self::InvalidRequest(_) | Self::Internal(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_retryability() {
        let status = |status| LlmError::Status {
            status,
            body: String::new(),
        };

        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!LlmError::Cancelled.is_retryable());
        assert!(LlmError::Upstream("connection reset".to_owned()).is_retryable());
    }

    #[test]
    fn status_message_carries_body() {
        let err = LlmError::Status {
            status: 401,
            body: "invalid x-api-key".to_owned(),
        };
        assert_eq!(err.to_string(), "provider returned 401: invalid x-api-key");
    }
}
