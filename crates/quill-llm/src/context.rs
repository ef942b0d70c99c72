use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

/// Per-call context handed to every provider
///
/// Carries the caller's credential for the target provider and the abort
/// signal for the call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// API key, or an OAuth access token for Vertex
    pub api_key: SecretString,
    /// Cancelling this token aborts the in-flight request or stream
    pub cancellation: CancellationToken,
}

impl RequestContext {
    /// Create a context with a fresh, never-cancelled token
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Use the given cancellation token for this call
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}
