use thiserror::Error;

/// Errors surfaced by vector-store clients.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Missing endpoint/token or an unknown backend.
    #[error("invalid catalog config: {0}")]
    InvalidConfig(String),
    /// The vector store was unreachable or reported a failure.
    #[error("vector store error: {0}")]
    Service(String),
    /// The response did not have the expected shape.
    #[error("failed to decode vector store response: {0}")]
    Decode(String),
    /// Local backend failure (seed file, poisoned lock).
    #[error("catalog backend error: {0}")]
    Backend(String),
}

impl CatalogError {
    pub fn backend<T: Into<String>>(msg: T) -> Self {
        CatalogError::Backend(msg.into())
    }

    /// Whether the failure came from the remote store rather than local setup.
    pub fn is_service_failure(&self) -> bool {
        matches!(self, CatalogError::Service(_) | CatalogError::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert!(CatalogError::InvalidConfig("token".into())
            .to_string()
            .contains("invalid catalog config"));
        assert!(CatalogError::Service("HTTP 503".into())
            .to_string()
            .contains("HTTP 503"));
        assert!(CatalogError::backend("poisoned lock")
            .to_string()
            .contains("poisoned lock"));
    }

    #[test]
    fn service_failure_classification() {
        assert!(CatalogError::Service("x".into()).is_service_failure());
        assert!(CatalogError::Decode("x".into()).is_service_failure());
        assert!(!CatalogError::InvalidConfig("x".into()).is_service_failure());
        assert!(!CatalogError::backend("x").is_service_failure());
    }
}
