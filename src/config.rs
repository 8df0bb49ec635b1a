//! YAML pipeline configuration for Fashion Buddy.
//!
//! One file describes the embedding client, the product catalog and the
//! recommendation engine. Credentials are normally left out of the file and
//! supplied through the environment (see [`BuddyConfig::apply_env_overrides`]).
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "fashion-buddy-demo"
//!
//! embedding:
//!   mode: "vertex"
//!   model_name: "multimodalembedding@001"
//!   location: "us-central1"
//!   dimension: 1408
//!   api_timeout_secs: 30
//!   enable_resilience: true
//!
//! catalog:
//!   backend: "astra"
//!   keyspace: "default_keyspace"
//!   collection: "shopping_buddy_demo"
//!
//! recommend:
//!   sweep: "concurrent"
//!   partial_results: false
//!   category_timeout_ms: 20000
//! ```

use std::fs;
use std::path::Path;

use catalog::CatalogConfig;
use embedding::EmbeddingConfig;
use recommend::RecommendConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// GCP project that owns the Vertex AI quota.
pub const ENV_GCP_PROJECT_ID: &str = "GCP_PROJECT_ID";
/// OAuth2 access token for Vertex AI (e.g. `gcloud auth print-access-token`).
pub const ENV_GCP_ACCESS_TOKEN: &str = "GCP_ACCESS_TOKEN";
/// Astra DB application token.
pub const ENV_ASTRA_DB_TOKEN: &str = "ASTRA_DB_TOKEN";
/// Astra DB API endpoint.
pub const ENV_ASTRA_API_ENDPOINT: &str = "ASTRA_API_ENDPOINT";

/// Errors that can occur when loading the pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct BuddyConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub recommend: RecommendConfig,
}

impl Default for BuddyConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            embedding: EmbeddingConfig::default(),
            catalog: CatalogConfig::default(),
            recommend: RecommendConfig::default(),
        }
    }
}

impl BuddyConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: BuddyConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Offline configuration: stub embeddings over an in-memory catalog.
    pub fn offline() -> Self {
        Self {
            embedding: EmbeddingConfig {
                mode: "stub".into(),
                dimension: 128,
                ..Default::default()
            },
            catalog: CatalogConfig::in_memory(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.embedding
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        self.catalog
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        self.recommend
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        Ok(())
    }

    /// Fill credentials from the process environment. Values already set in
    /// the file are replaced only when the variable is present and non-empty.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an explicit lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(project) = get(ENV_GCP_PROJECT_ID) {
            self.embedding.project_id = Some(project);
        }
        if let Some(token) = get(ENV_GCP_ACCESS_TOKEN) {
            self.embedding.access_token = Some(token);
        }
        if let Some(token) = get(ENV_ASTRA_DB_TOKEN) {
            self.catalog.token = Some(token);
        }
        if let Some(endpoint) = get(ENV_ASTRA_API_ENDPOINT) {
            self.catalog.api_endpoint = Some(endpoint);
        }
    }

    /// Check that every hosted service the config selects has its credentials.
    pub fn require_credentials(&self) -> Result<(), ConfigLoadError> {
        if self.embedding.mode == "vertex" {
            if is_blank(&self.embedding.project_id) {
                return Err(ConfigLoadError::MissingCredential(ENV_GCP_PROJECT_ID.into()));
            }
            if is_blank(&self.embedding.access_token) {
                return Err(ConfigLoadError::MissingCredential(
                    ENV_GCP_ACCESS_TOKEN.into(),
                ));
            }
        }
        if self.catalog.backend == "astra" {
            if is_blank(&self.catalog.api_endpoint) {
                return Err(ConfigLoadError::MissingCredential(
                    ENV_ASTRA_API_ENDPOINT.into(),
                ));
            }
            if is_blank(&self.catalog.token) {
                return Err(ConfigLoadError::MissingCredential(ENV_ASTRA_DB_TOKEN.into()));
            }
        }
        Ok(())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}
