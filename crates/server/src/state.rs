use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::web::WebInterface;
use fashion_buddy::{build_recommender, BuddyConfig, DynRecommender};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Recommendation engine (shared across requests)
    pub recommender: Arc<DynRecommender>,

    /// Page templates
    pub web: Arc<WebInterface>,

    /// Prometheus handle, present when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Build state from the pipeline configuration the server config points at.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let mut pipeline = match &config.pipeline_config {
            Some(path) => BuddyConfig::from_file(path)
                .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?,
            None => BuddyConfig::default(),
        };
        pipeline.apply_env_overrides();

        let recommender =
            build_recommender(&pipeline).map_err(|e| ServerError::Config(e.to_string()))?;
        Self::with_recommender(config, recommender)
    }

    /// Build state around an already constructed engine.
    pub fn with_recommender(config: ServerConfig, recommender: DynRecommender) -> ServerResult<Self> {
        let web = WebInterface::new()?;
        Ok(Self {
            config: Arc::new(config),
            recommender: Arc::new(recommender),
            web: Arc::new(web),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }
}
