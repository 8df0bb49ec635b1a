//! Fashion Buddy Server - web front end for outfit-based product recommendations
//!
//! Serves the upload page and a JSON API on top of the [`recommend`] engine:
//! a shopper uploads a photo of an outfit, picks a gender and any number of
//! clothing categories, and gets back the closest catalog products per
//! category.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Endpoints
//!
//! - `GET /` - upload page
//! - `POST /recommend` - form submit, answers with the rendered page
//! - `GET /sample-image` - example outfit download
//! - `POST /api/v1/recommend` - same as the form, answers with JSON
//! - `GET /api/v1/categories` - category labels, backend codes and genders
//! - `GET /health`, `GET /ready` - liveness and readiness checks
//! - `GET /metrics` - Prometheus metrics (when enabled)

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod upload;
pub mod web;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, prepare_state, start_server};
pub use state::ServerState;
