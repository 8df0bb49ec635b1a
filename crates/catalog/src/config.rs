use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// Runtime configuration for the product catalog.
///
/// `backend = "astra"` talks to an Astra DB collection over the Data API;
/// `backend = "in_memory"` serves a local seed file, mostly for tests and demos.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub backend: String,
    /// Database API endpoint, e.g. `https://<db-id>-<region>.apps.astra.datastax.com`.
    pub api_endpoint: Option<String>,
    /// Application token. Never serialized.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub keyspace: String,
    pub collection: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// JSON array of products with a `$vector` field, loaded by the in-memory backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_path: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: "astra".into(),
            api_endpoint: None,
            token: None,
            keyspace: "default_keyspace".into(),
            collection: "shopping_buddy_demo".into(),
            timeout_secs: 30,
            seed_path: None,
        }
    }
}

impl CatalogConfig {
    pub fn in_memory() -> Self {
        Self {
            backend: "in_memory".into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        match self.backend.as_str() {
            "astra" | "in_memory" => {}
            other => {
                return Err(CatalogError::InvalidConfig(format!(
                    "backend must be 'astra' or 'in_memory', got '{other}'"
                )))
            }
        }
        if self.collection.trim().is_empty() {
            return Err(CatalogError::InvalidConfig("collection is empty".into()));
        }
        if self.keyspace.trim().is_empty() {
            return Err(CatalogError::InvalidConfig("keyspace is empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(CatalogError::InvalidConfig(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
