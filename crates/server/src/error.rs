use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalog::CatalogError;
use embedding::EmbeddingError;
use recommend::RecommendError;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Payload too large: max {0}MB allowed")]
    PayloadTooLarge(usize),

    #[error("Recommendation failed: {0}")]
    Recommend(#[from] RecommendError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Recommend(err) => recommend_status(err),
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ServerError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ServerError::Recommend(RecommendError::Embedding(_)) => "EMBEDDING_ERROR",
            ServerError::Recommend(RecommendError::Catalog(_)) => "CATALOG_ERROR",
            ServerError::Recommend(RecommendError::Timeout { .. }) => "UPSTREAM_TIMEOUT",
            ServerError::Recommend(RecommendError::InvalidFilter(_)) => "INVALID_FILTER",
            ServerError::Recommend(RecommendError::InvalidConfig(_)) => "CONFIG_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

fn recommend_status(err: &RecommendError) -> StatusCode {
    match err {
        RecommendError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
        RecommendError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        RecommendError::Embedding(EmbeddingError::InvalidImage(_)) => StatusCode::BAD_REQUEST,
        RecommendError::InvalidConfig(_)
        | RecommendError::Embedding(EmbeddingError::InvalidConfig(_))
        | RecommendError::Catalog(CatalogError::InvalidConfig(_))
        | RecommendError::Catalog(CatalogError::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        RecommendError::Embedding(_) | RecommendError::Catalog(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code().to_string();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code = %error_code, %message, "request failed");
        } else {
            tracing::debug!(code = %error_code, %message, "request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<MultipartError> for ServerError {
    fn from(err: MultipartError) -> Self {
        ServerError::BadRequest(format!("invalid multipart body: {}", err.body_text()))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<tera::Error> for ServerError {
    fn from(err: tera::Error) -> Self {
        ServerError::Internal(format!("template error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
