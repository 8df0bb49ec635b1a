//! Workspace umbrella crate for Fashion Buddy.
//!
//! Loads the pipeline configuration and wires the configured embedding
//! client and product catalog into a [`Recommender`], so callers (the HTTP
//! server, scripts, tests) get a ready engine from one YAML file.

pub mod config;

use std::sync::Arc;

pub use catalog::{
    build_store, CatalogConfig, CatalogError, InMemoryCatalog, Price, ProductDocument,
    VectorStore,
};
pub use config::{BuddyConfig, ConfigLoadError};
pub use embedding::{
    build_client, EmbeddingClient, EmbeddingConfig, EmbeddingError, ImageReference,
};
pub use recommend::{
    to_backend_code, FilterCriteria, Gender, RecommendConfig, RecommendError,
    RecommendationGroup, Recommendations, Recommender, CATEGORY_MAPPING, TOP_K,
};

use thiserror::Error;

/// Engine over type-erased clients, as built from configuration.
pub type DynRecommender = Recommender<Arc<dyn EmbeddingClient>, Arc<dyn VectorStore>>;

/// Errors that can occur while assembling the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigLoadError),
    #[error("embedding client: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Build the engine described by `cfg`.
///
/// Hosted services must have their credentials set; run
/// [`BuddyConfig::apply_env_overrides`] first to pick them up from the environment.
pub fn build_recommender(cfg: &BuddyConfig) -> Result<DynRecommender, PipelineError> {
    cfg.validate()?;
    cfg.require_credentials()?;

    let embedder = build_client(&cfg.embedding)?;
    let store = build_store(&cfg.catalog)?;
    tracing::info!(
        embedding = %cfg.embedding.mode,
        model = embedder.model_name(),
        catalog = %cfg.catalog.backend,
        collection = store.name(),
        sweep = ?cfg.recommend.sweep,
        "recommender ready"
    );
    Ok(Recommender::with_config(
        embedder,
        store,
        cfg.recommend.clone(),
    ))
}

/// [`BuddyConfig::from_file`] plus environment credentials plus [`build_recommender`].
pub fn load_recommender<P: AsRef<std::path::Path>>(
    path: P,
) -> Result<DynRecommender, PipelineError> {
    let mut cfg = BuddyConfig::from_file(path)?;
    cfg.apply_env_overrides();
    build_recommender(&cfg)
}
