use async_trait::async_trait;
use fxhash::hash64;

use crate::{Embedding, EmbeddingClient, EmbeddingError, EmbeddingRequest};

/// Deterministic stand-in for the hosted model.
///
/// Generates sinusoid values derived from a hash of the image bytes and the
/// steering text, so the same (image, prompt) pair always maps to the same
/// vector and a different prompt yields a different one. Used for offline
/// demos and tests; carries no visual meaning.
#[derive(Debug, Clone)]
pub struct StubEmbeddingClient {
    model_name: String,
    dimension: usize,
}

impl StubEmbeddingClient {
    pub fn new(model_name: impl Into<String>, dimension: usize) -> Self {
        Self {
            model_name: model_name.into(),
            dimension: dimension.max(1),
        }
    }

    /// Vector for raw image bytes + text.
    pub fn vector_for(&self, image: &[u8], text: &str) -> Vec<f32> {
        let h = hash64(&(image, text));
        (0..self.dimension)
            .map(|idx| {
                let shifted = h.rotate_right((idx % 64) as u32);
                ((shifted % 10_007) as f32 * 0.001 + idx as f32 * 0.1).sin()
            })
            .collect()
    }
}

impl Default for StubEmbeddingClient {
    fn default() -> Self {
        Self::new("stub-multimodal", 128)
    }
}

#[async_trait]
impl EmbeddingClient for StubEmbeddingClient {
    async fn embed(&self, request: &EmbeddingRequest) -> Result<Embedding, EmbeddingError> {
        let image = request.image.load().await?;
        let vector = self.vector_for(&image, &request.contextual_text);
        Ok(Embedding::new(vector, self.model_name.clone()))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageReference;

    fn req(image: &[u8], text: &str) -> EmbeddingRequest {
        EmbeddingRequest::new(ImageReference::from_bytes(image.to_vec()), text)
    }

    #[tokio::test]
    async fn stub_is_deterministic() {
        let client = StubEmbeddingClient::default();
        let a = client.embed(&req(b"outfit", "TOPS")).await.unwrap();
        let b = client.embed(&req(b"outfit", "TOPS")).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.embedding_dim, 128);
    }

    #[tokio::test]
    async fn prompt_changes_the_vector() {
        let client = StubEmbeddingClient::default();
        let tops = client.embed(&req(b"outfit", "TOPS")).await.unwrap();
        let shoes = client.embed(&req(b"outfit", "SHOES")).await.unwrap();
        assert_ne!(tops.vector, shoes.vector);
    }

    #[tokio::test]
    async fn stub_rejects_empty_image() {
        let client = StubEmbeddingClient::default();
        let err = client.embed(&req(b"", "TOPS")).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidImage(_)));
    }

    #[test]
    fn values_stay_in_unit_range() {
        let client = StubEmbeddingClient::new("stub", 1408);
        let v = client.vector_for(b"img", "text");
        assert_eq!(v.len(), 1408);
        assert!(v.iter().all(|x| (-1.0..=1.0).contains(x)));
        assert!(!v.iter().all(|&x| x == 0.0));
    }
}
