use serde::{Deserialize, Serialize};

use crate::resilience::{CircuitBreakerConfig, RetryConfig};
use crate::EmbeddingError;

/// Output dimensions accepted by `multimodalembedding@001`.
pub const SUPPORTED_DIMENSIONS: [usize; 4] = [128, 256, 512, 1408];

/// Runtime configuration for the embedding client.
///
/// # Example
/// ```no_run
/// use embedding::{build_client, EmbeddingConfig};
///
/// let cfg = EmbeddingConfig {
///     mode: "vertex".into(),
///     project_id: Some("my-gcp-project".into()),
///     access_token: Some("ya29.xxx".into()),
///     ..Default::default()
/// };
///
/// let client = build_client(&cfg).unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Client selector: `"vertex"` (hosted model) or `"stub"` (deterministic, offline).
    pub mode: String,
    /// Publisher model id, surfaced on every [`Embedding`](crate::Embedding).
    pub model_name: String,
    /// GCP project that owns the Vertex AI quota.
    pub project_id: Option<String>,
    /// Vertex AI region.
    pub location: String,
    /// Override for the API base URL; defaults to `https://{location}-aiplatform.googleapis.com`.
    pub api_base_url: Option<String>,
    /// OAuth2 access token, supplied out-of-band. Never serialized.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Requested embedding dimension.
    pub dimension: usize,
    /// Per-call HTTP timeout in seconds.
    pub api_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<RetryConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breaker_config: Option<CircuitBreakerConfig>,
    /// Retry transient failures and guard the upstream with a circuit breaker.
    /// When false every call is a single attempt.
    pub enable_resilience: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: "vertex".into(),
            model_name: "multimodalembedding@001".into(),
            project_id: None,
            location: "us-central1".into(),
            api_base_url: None,
            access_token: None,
            dimension: 1408,
            api_timeout_secs: 30,
            retry_config: None,           // Uses defaults when None
            circuit_breaker_config: None, // Uses defaults when None
            enable_resilience: true,
        }
    }
}

impl EmbeddingConfig {
    /// Shape checks that do not depend on credentials.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if !matches!(self.mode.as_str(), "vertex" | "stub") {
            return Err(EmbeddingError::InvalidConfig(format!(
                "mode must be 'vertex' or 'stub', got '{}'",
                self.mode
            )));
        }
        if !SUPPORTED_DIMENSIONS.contains(&self.dimension) {
            return Err(EmbeddingError::InvalidConfig(format!(
                "dimension must be one of {SUPPORTED_DIMENSIONS:?}, got {}",
                self.dimension
            )));
        }
        if self.model_name.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig("model_name is empty".into()));
        }
        if self.mode == "vertex" && self.location.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig("location is empty".into()));
        }
        Ok(())
    }

    /// Base URL the Vertex client talks to.
    pub fn effective_base_url(&self) -> String {
        match self.api_base_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("https://{}-aiplatform.googleapis.com", self.location),
        }
    }
}
