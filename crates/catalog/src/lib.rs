//! # Fashion Buddy Catalog
//!
//! Filtered nearest-neighbour search over the product collection.
//!
//! Callers hand a [`VectorQuery`] (query vector, equality filter on
//! `category`/`gender`, result limit, whether to report scores) to any
//! [`VectorStore`] and get back up to `limit` [`ProductDocument`]s ordered by
//! descending similarity. Two stores ship with the crate:
//!
//! - `AstraCollection`: the hosted Astra DB collection, via the Data API.
//! - [`InMemoryCatalog`]: a brute-force local store seeded from JSON.
//!
//! Use [`build_store`] to pick one from a [`CatalogConfig`].

mod astra;
mod config;
mod error;
mod memory;
mod types;

use std::sync::Arc;

use async_trait::async_trait;

pub use astra::AstraCollection;
pub use config::CatalogConfig;
pub use error::CatalogError;
pub use memory::{CatalogRecord, InMemoryCatalog};
pub use types::{Price, ProductDocument, QueryFilter, VectorQuery};

/// A collection that supports vector-sorted, filtered lookups.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Top `query.limit` documents matching `query.filter`, most similar first.
    /// `similarity` is populated only when `query.include_similarity` is set.
    async fn vector_find(&self, query: &VectorQuery) -> Result<Vec<ProductDocument>, CatalogError>;

    /// Collection name, for logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: VectorStore + ?Sized> VectorStore for Arc<T> {
    async fn vector_find(&self, query: &VectorQuery) -> Result<Vec<ProductDocument>, CatalogError> {
        (**self).vector_find(query).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Build the configured store.
pub fn build_store(cfg: &CatalogConfig) -> Result<Arc<dyn VectorStore>, CatalogError> {
    cfg.validate()?;
    match cfg.backend.as_str() {
        "in_memory" => {
            let catalog = match &cfg.seed_path {
                Some(path) => InMemoryCatalog::from_json_file(cfg.collection.clone(), path)?,
                None => InMemoryCatalog::new(cfg.collection.clone()),
            };
            tracing::info!(
                collection = %cfg.collection,
                products = catalog.len(),
                "using in-memory catalog"
            );
            Ok(Arc::new(catalog))
        }
        _ => {
            let store = AstraCollection::new(cfg)?;
            tracing::info!(url = %store.url(), "using astra collection");
            Ok(Arc::new(store))
        }
    }
}
