use thiserror::Error;

/// Errors surfaced by embedding clients.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Configuration is missing or inconsistent (e.g. no project id or access token).
    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),
    /// The image reference could not be read or holds no bytes.
    #[error("unreadable image: {0}")]
    InvalidImage(String),
    /// The upstream service failed or rejected the request.
    #[error("embedding service error: {message}")]
    Service { message: String, retryable: bool },
    /// The circuit breaker is open; the upstream was not contacted.
    #[error("embedding service temporarily unavailable: circuit open for '{0}'")]
    Unavailable(String),
}

impl EmbeddingError {
    /// A failure worth retrying: timeouts, connection drops, 408/429/5xx.
    pub fn transient(message: impl Into<String>) -> Self {
        EmbeddingError::Service {
            message: message.into(),
            retryable: true,
        }
    }

    /// A failure that will not go away on retry (4xx, malformed response).
    pub fn permanent(message: impl Into<String>) -> Self {
        EmbeddingError::Service {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, EmbeddingError::Service { retryable: true, .. })
    }

    /// Whether this error originates from the upstream service rather than
    /// from caller input or local configuration.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            EmbeddingError::Service { .. } | EmbeddingError::Unavailable(_)
        )
    }
}

/// Classify an HTTP status from the upstream.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429) || (500..=599).contains(&status)
}
