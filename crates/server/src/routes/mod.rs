//! API route handlers
//!
//! - `ui`: the upload page, its form submit and the sample image download
//! - `recommend`: JSON equivalent of the form submit
//! - `categories`: filter vocabulary for API clients
//! - `health`: health checks, readiness, and metrics

pub mod categories;
pub mod health;
pub mod recommend;
pub mod ui;

use crate::error::ServerError;

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
