//! Fashion Buddy embedding clients
//!
//! Turns an (image, contextual text) pair into a dense vector. The text
//! steers the embedding, e.g. "ignore the person, focus on the shoes", so the
//! same photo yields a different vector per prompt.
//!
//! Two clients ship with the crate:
//!
//! - **Vertex** - calls Vertex AI `multimodalembedding@001` over HTTPS, with
//!   retry/backoff and a circuit breaker unless resilience is disabled.
//! - **Stub** - deterministic hash-derived vectors. No network, no credentials.
//!
//! Callers depend on the [`EmbeddingClient`] trait and receive a concrete
//! client from [`build_client`], which keeps the query engine testable with
//! fakes.
//!
//! ```no_run
//! use embedding::{build_client, EmbeddingConfig, EmbeddingRequest, ImageReference};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cfg = EmbeddingConfig { mode: "stub".into(), dimension: 128, ..Default::default() };
//!     let client = build_client(&cfg).unwrap();
//!     let request = EmbeddingRequest::new(
//!         ImageReference::from_path("./Assets/outfit.jpeg"),
//!         "Pretend as if there is no model in the image, only clothing.",
//!     );
//!     let embedding = client.embed(&request).await.unwrap();
//!     println!("{} dims", embedding.embedding_dim);
//! }
//! ```
//!
//! ## Env vars to know
//!
//! Credentials never live in this crate's config files; the pipeline config
//! loader fills them from `GCP_PROJECT_ID` and `GCP_ACCESS_TOKEN`.

pub mod config;
pub mod error;
pub mod resilience;
pub mod types;

mod serde_millis;
mod stub;
mod vertex;

use std::sync::Arc;

use async_trait::async_trait;

pub use crate::config::EmbeddingConfig;
pub use crate::error::EmbeddingError;
pub use crate::stub::StubEmbeddingClient;
pub use crate::types::{Embedding, EmbeddingRequest, ImageReference};
pub use crate::vertex::VertexEmbeddingClient;

/// Anything that can embed an image steered by text.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, request: &EmbeddingRequest) -> Result<Embedding, EmbeddingError>;

    /// Model identifier, for logs and metrics.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<T: EmbeddingClient + ?Sized> EmbeddingClient for Arc<T> {
    async fn embed(&self, request: &EmbeddingRequest) -> Result<Embedding, EmbeddingError> {
        (**self).embed(request).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Build the client selected by `cfg.mode`.
pub fn build_client(cfg: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingClient>, EmbeddingError> {
    cfg.validate()?;
    match cfg.mode.as_str() {
        "stub" => Ok(Arc::new(StubEmbeddingClient::new(
            cfg.model_name.clone(),
            cfg.dimension,
        ))),
        _ => Ok(Arc::new(VertexEmbeddingClient::new(cfg)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_stub_needs_no_credentials() {
        let cfg = EmbeddingConfig {
            mode: "stub".into(),
            ..Default::default()
        };
        let client = build_client(&cfg).unwrap();
        assert_eq!(client.model_name(), "multimodalembedding@001");
    }

    #[test]
    fn build_client_vertex_without_credentials_is_config_error() {
        let result = build_client(&EmbeddingConfig::default());
        assert!(matches!(result, Err(EmbeddingError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn arc_dyn_client_delegates() {
        let client: Arc<dyn EmbeddingClient> = Arc::new(StubEmbeddingClient::new("stub", 8));
        let request = EmbeddingRequest::new(ImageReference::from_bytes(vec![1, 2, 3]), "TOPS");
        let embedding = client.embed(&request).await.unwrap();
        assert_eq!(embedding.embedding_dim, 8);
    }
}
