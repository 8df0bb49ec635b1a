//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration for the page and the JSON API
//! - Middleware stack (request ids, logging, compression, etc.)
//! - Graceful shutdown handling

use ::recommend::set_recommend_metrics;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use catalog::VectorStore;
use embedding::EmbeddingClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::metrics::{install_recorder, PrometheusRecommendMetrics};
use crate::middleware::{log_requests, request_id};
use crate::routes::{categories, health, not_found, recommend, ui};
use crate::state::ServerState;

/// Build the Axum router with all routes and middleware
///
/// - Page routes: `/`, `/recommend`, `/sample-image`
/// - Health: `/health`, `/ready`, `/metrics`
/// - JSON API: `/api/v1/*`
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let page_routes = Router::new()
        .route("/", get(ui::index_page))
        .route("/recommend", post(ui::recommend_page))
        .route("/sample-image", get(ui::sample_image));

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics));

    let api_routes = Router::new()
        .route("/api/v1/recommend", post(recommend::recommend_products))
        .route("/api/v1/categories", get(categories::list_categories));

    let body_limit = state.config.max_body_size();
    let timeout = state.config.timeout();

    Router::new()
        .merge(page_routes)
        .merge(health_routes)
        .merge(api_routes)
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            timeout,
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
}

fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = if config.log_format == "pretty" {
        builder.pretty().try_init()
    } else {
        builder.json().try_init()
    };
    if let Err(err) = result {
        eprintln!("tracing subscriber already installed: {err}");
    }
}

/// Build the shared state for `config`.
///
/// With metrics enabled the Prometheus recorder is installed and the engine
/// observer registered before the engine is built, so `/metrics` sees the
/// first request.
pub fn prepare_state(config: ServerConfig) -> anyhow::Result<Arc<ServerState>> {
    let handle = if config.metrics_enabled {
        let handle = install_recorder();
        set_recommend_metrics(Some(Arc::new(PrometheusRecommendMetrics)));
        handle
    } else {
        None
    };

    let state = ServerState::new(config)?.with_metrics(handle);
    tracing::info!(
        model = state.recommender.embedder().model_name(),
        store = state.recommender.store().name(),
        sweep = ?state.recommender.config().sweep,
        metrics = state.metrics.is_some(),
        "recommendation engine ready"
    );
    Ok(Arc::new(state))
}

/// Start the HTTP server
///
/// 1. Initializes tracing
/// 2. Builds the state (metrics recorder, engine) via [`prepare_state`]
/// 3. Serves until SIGTERM or Ctrl+C
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    init_tracing(&config);
    let state = prepare_state(config.clone())?;

    let app = build_router(state);
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!("Starting Fashion Buddy on {}", addr);
    tracing::info!(
        "Timeout: {}s, Max body: {}MB",
        config.timeout_secs,
        config.max_body_size_mb
    );
    tracing::info!(
        "CORS: {}, Metrics: {}",
        config.enable_cors,
        config.metrics_enabled
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
