use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::EmbeddingError;

/// A resolvable reference to image bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageReference {
    /// Image stored on the local filesystem (e.g. an upload saved to the assets dir).
    Path(PathBuf),
    /// Image already held in memory.
    Bytes(Bytes),
}

impl ImageReference {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        ImageReference::Path(path.as_ref().to_path_buf())
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        ImageReference::Bytes(bytes.into())
    }

    /// Resolve the reference into image bytes.
    pub async fn load(&self) -> Result<Bytes, EmbeddingError> {
        let bytes = match self {
            ImageReference::Path(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| EmbeddingError::InvalidImage(format!("{}: {e}", path.display())))?,
            ImageReference::Bytes(bytes) => bytes.clone(),
        };
        if bytes.is_empty() {
            return Err(EmbeddingError::InvalidImage(format!("{self} is empty")));
        }
        Ok(bytes)
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageReference::Path(path) => write!(f, "{}", path.display()),
            ImageReference::Bytes(bytes) => write!(f, "<{} in-memory bytes>", bytes.len()),
        }
    }
}

/// One embedding call: the image plus the text used to steer the vector.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRequest {
    pub image: ImageReference,
    /// Free text paired with the image, e.g. "ignore the model, focus on the shoes".
    pub contextual_text: String,
}

impl EmbeddingRequest {
    pub fn new(image: ImageReference, contextual_text: impl Into<String>) -> Self {
        Self {
            image,
            contextual_text: contextual_text.into(),
        }
    }
}

/// Embedding output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    /// Name of the model that produced the vector.
    pub model_name: String,
    /// Dimension of `vector`.
    pub embedding_dim: usize,
}

impl Embedding {
    pub fn new(vector: Vec<f32>, model_name: impl Into<String>) -> Self {
        let embedding_dim = vector.len();
        Self {
            vector,
            model_name: model_name.into(),
            embedding_dim,
        }
    }
}
