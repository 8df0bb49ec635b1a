//! # Fashion Buddy Recommend (`recommend`)
//!
//! ## Purpose
//!
//! `recommend` owns the decision procedure behind a "Recommend Products"
//! click: one uploaded image plus a gender and zero or more clothing
//! categories become one or more ranked groups of catalog products.
//!
//! It is generic over the two services it calls:
//! - an [`embedding::EmbeddingClient`] that turns (image, steering prompt) into a vector;
//! - a [`catalog::VectorStore`] that runs filtered nearest-neighbour queries.
//!
//! ## Core Types
//!
//! - [`Recommender`]: the engine; [`Recommender::find_similar`] is the entry point.
//! - [`Gender`], [`FilterCriteria`]: user filters. Category labels are mapped to
//!   backend codes via [`CATEGORY_MAPPING`] / [`to_backend_code`].
//! - [`Recommendations`]: ordered [`RecommendationGroup`]s, plus per-category
//!   failures when [`RecommendConfig::partial_results`] is on.
//! - [`RecommendConfig`]: sweep strategy, failure policy, per-category timeout.
//!
//! ## Example Usage
//!
//! ```no_run
//! use catalog::InMemoryCatalog;
//! use embedding::{ImageReference, StubEmbeddingClient};
//! use recommend::{Gender, Recommender};
//!
//! # async fn run() -> Result<(), recommend::RecommendError> {
//! let recommender = Recommender::new(
//!     StubEmbeddingClient::default(),
//!     InMemoryCatalog::new("shopping_buddy_demo"),
//! );
//! let image = ImageReference::from_path("Assets/outfit.jpeg");
//! let recs = recommender
//!     .find_similar(&image, Gender::Women, &["Tops", "Shoes"])
//!     .await?;
//! for group in &recs.groups {
//!     println!("{:?}: {} products", group.category, group.documents.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Observability
//!
//! Install a [`RecommendMetrics`] implementation via [`set_recommend_metrics`]
//! to record per-action latency and result counts.

pub mod engine;
pub mod metrics;
pub mod prompt;
pub mod types;

pub use crate::engine::{Recommender, TOP_K};
pub use crate::metrics::{set_recommend_metrics, RecommendMetrics};
pub use crate::prompt::{category_prompt, GENERIC_PROMPT};
pub use crate::types::{
    normalize_categories, to_backend_code, CategoryFailure, FilterCriteria, Gender,
    RecommendConfig, RecommendError, RecommendationGroup, Recommendations, SweepMode,
    CATEGORY_MAPPING,
};
