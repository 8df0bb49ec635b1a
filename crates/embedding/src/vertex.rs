//! Vertex AI `multimodalembedding` client.
//!
//! One call = one `:predict` request carrying the base64 image and the
//! steering text; the image vector comes back in `predictions[0].imageEmbedding`.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};

use crate::error::is_retryable_status;
use crate::resilience::{execute_with_retry_async, CircuitBreaker, RetryConfig};
use crate::{Embedding, EmbeddingClient, EmbeddingConfig, EmbeddingError, EmbeddingRequest};

const PROVIDER: &str = "vertex";

pub struct VertexEmbeddingClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: String,
    model_name: String,
    dimension: usize,
    retry: Option<RetryConfig>,
    breaker: Option<CircuitBreaker>,
}

impl VertexEmbeddingClient {
    /// Build a client from config. Fails when the project id or access token is missing.
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        cfg.validate()?;
        let project_id = non_empty(cfg.project_id.as_deref()).ok_or_else(|| {
            EmbeddingError::InvalidConfig("project_id is required for vertex mode".into())
        })?;
        let access_token = non_empty(cfg.access_token.as_deref()).ok_or_else(|| {
            EmbeddingError::InvalidConfig("access_token is required for vertex mode".into())
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.api_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig(format!("http client: {e}")))?;

        let endpoint = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            cfg.effective_base_url(),
            project_id,
            cfg.location,
            cfg.model_name
        );

        let (retry, breaker) = if cfg.enable_resilience {
            (
                Some(cfg.retry_config.unwrap_or_default()),
                Some(CircuitBreaker::new(
                    cfg.circuit_breaker_config.unwrap_or_default(),
                )),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            http,
            endpoint,
            access_token: access_token.to_string(),
            model_name: cfg.model_name.clone(),
            dimension: cfg.dimension,
            retry,
            breaker,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn circuit_breaker(&self) -> Option<&CircuitBreaker> {
        self.breaker.as_ref()
    }

    async fn send(&self, payload: &Value) -> Result<Value, EmbeddingError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| EmbeddingError::transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("HTTP {status}: {}", upstream_message(&body));
            return Err(if is_retryable_status(status.as_u16()) {
                EmbeddingError::transient(message)
            } else {
                EmbeddingError::permanent(message)
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| EmbeddingError::permanent(format!("invalid JSON response: {e}")))
    }
}

#[async_trait]
impl EmbeddingClient for VertexEmbeddingClient {
    async fn embed(&self, request: &EmbeddingRequest) -> Result<Embedding, EmbeddingError> {
        let image = request.image.load().await?;
        let payload = build_predict_payload(
            &BASE64.encode(&image),
            &request.contextual_text,
            self.dimension,
        );

        if let Some(cb) = &self.breaker {
            if !cb.allow_request() {
                return Err(EmbeddingError::Unavailable(PROVIDER.into()));
            }
        }

        let outcome = match &self.retry {
            Some(retry_cfg) => {
                let result = execute_with_retry_async(
                    retry_cfg,
                    |attempt| {
                        if attempt > 0 {
                            tracing::info!(attempt, provider = PROVIDER, "retrying embedding request");
                        }
                        self.send(&payload)
                    },
                    EmbeddingError::is_retryable,
                )
                .await;
                tracing::debug!(
                    attempts = result.attempts,
                    duration_ms = result.total_duration.as_millis() as u64,
                    "embedding request finished"
                );
                result.into_result()
            }
            None => self.send(&payload).await,
        };

        match outcome {
            Ok(response) => {
                if let Some(cb) = &self.breaker {
                    cb.record_success();
                }
                let vector = parse_image_embedding(response)?;
                Ok(Embedding::new(vector, self.model_name.clone()))
            }
            Err(err) => {
                if let Some(cb) = &self.breaker {
                    // Only outages count; a 4xx means the service answered.
                    if err.is_retryable() {
                        cb.record_failure();
                    } else {
                        cb.release();
                    }
                }
                tracing::warn!(error = %err, provider = PROVIDER, "embedding request failed");
                Err(err)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn build_predict_payload(image_b64: &str, contextual_text: &str, dimension: usize) -> Value {
    let mut instance = json!({ "image": { "bytesBase64Encoded": image_b64 } });
    if !contextual_text.trim().is_empty() {
        instance["text"] = Value::String(contextual_text.to_string());
    }
    json!({
        "instances": [instance],
        "parameters": { "dimension": dimension },
    })
}

/// Pull `error.message` out of a Google API error body, falling back to the raw body.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn parse_image_embedding(response: Value) -> Result<Vec<f32>, EmbeddingError> {
    let prediction = response
        .get("predictions")
        .and_then(Value::as_array)
        .and_then(|p| p.first())
        .ok_or_else(|| EmbeddingError::permanent("response did not contain predictions"))?;

    let values = prediction
        .get("imageEmbedding")
        .and_then(Value::as_array)
        .ok_or_else(|| EmbeddingError::permanent("prediction is missing `imageEmbedding`"))?;

    if values.is_empty() {
        return Err(EmbeddingError::permanent("`imageEmbedding` is empty"));
    }

    values
        .iter()
        .map(|entry| {
            entry.as_f64().map(|f| f as f32).ok_or_else(|| {
                EmbeddingError::permanent(format!(
                    "embedding entries must be numbers, got {entry}"
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::{CircuitBreakerConfig, CircuitState};
    use crate::ImageReference;

    fn test_config(base_url: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            project_id: Some("demo-project".into()),
            access_token: Some("test-token".into()),
            api_base_url: Some(base_url.into()),
            retry_config: Some(
                RetryConfig::default()
                    .with_max_retries(2)
                    .with_base_delay(Duration::from_millis(1))
                    .with_jitter(false),
            ),
            ..Default::default()
        }
    }

    const PREDICT_PATH: &str = "/v1/projects/demo-project/locations/us-central1/publishers/google/models/multimodalembedding@001:predict";

    fn request() -> EmbeddingRequest {
        EmbeddingRequest::new(
            ImageReference::from_bytes(b"fake-jpeg".to_vec()),
            "focus on the shoes",
        )
    }

    #[test]
    fn new_requires_project_and_token() {
        let cfg = EmbeddingConfig {
            access_token: Some("t".into()),
            ..Default::default()
        };
        assert!(matches!(
            VertexEmbeddingClient::new(&cfg),
            Err(EmbeddingError::InvalidConfig(msg)) if msg.contains("project_id")
        ));

        let cfg = EmbeddingConfig {
            project_id: Some("p".into()),
            access_token: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(
            VertexEmbeddingClient::new(&cfg),
            Err(EmbeddingError::InvalidConfig(msg)) if msg.contains("access_token")
        ));
    }

    #[test]
    fn endpoint_layout() {
        let client = VertexEmbeddingClient::new(&test_config("https://example.test")).unwrap();
        assert_eq!(
            client.endpoint(),
            format!("https://example.test{PREDICT_PATH}")
        );
    }

    #[test]
    fn payload_includes_text_only_when_present() {
        let with_text = build_predict_payload("AAAA", "ignore the model", 1408);
        assert_eq!(with_text["instances"][0]["image"]["bytesBase64Encoded"], "AAAA");
        assert_eq!(with_text["instances"][0]["text"], "ignore the model");
        assert_eq!(with_text["parameters"]["dimension"], 1408);

        let without_text = build_predict_payload("AAAA", "  ", 512);
        assert!(without_text["instances"][0].get("text").is_none());
    }

    #[test]
    fn parse_image_embedding_shapes() {
        let ok = json!({ "predictions": [{ "imageEmbedding": [0.5, -0.25], "textEmbedding": [1.0] }] });
        assert_eq!(parse_image_embedding(ok).unwrap(), vec![0.5, -0.25]);

        assert!(parse_image_embedding(json!({ "predictions": [] })).is_err());
        assert!(parse_image_embedding(json!({ "predictions": [{ "textEmbedding": [1.0] }] })).is_err());
        assert!(parse_image_embedding(json!({ "predictions": [{ "imageEmbedding": ["x"] }] })).is_err());
    }

    #[test]
    fn upstream_message_extracts_google_error() {
        let body = r#"{"error":{"code":400,"message":"Image is corrupt","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(upstream_message(body), "Image is corrupt");
        assert_eq!(upstream_message("plain text"), "plain text");
    }

    #[tokio::test]
    async fn embed_posts_image_and_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PREDICT_PATH)
            .match_header("authorization", "Bearer test-token")
            .match_body(mockito::Matcher::PartialJson(json!({
                "instances": [{
                    "image": { "bytesBase64Encoded": BASE64.encode(b"fake-jpeg") },
                    "text": "focus on the shoes"
                }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"predictions":[{"imageEmbedding":[0.1,0.2,0.3]}]}"#)
            .create_async()
            .await;

        let client = VertexEmbeddingClient::new(&test_config(&server.url())).unwrap();
        let embedding = client.embed(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(embedding.vector, vec![0.1, 0.2, 0.3]);
        assert_eq!(embedding.embedding_dim, 3);
        assert_eq!(embedding.model_name, "multimodalembedding@001");
    }

    #[tokio::test]
    async fn embed_retries_transient_failures() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", PREDICT_PATH)
            .with_status(503)
            .with_body("overloaded")
            .expect(3)
            .create_async()
            .await;

        let client = VertexEmbeddingClient::new(&test_config(&server.url())).unwrap();
        let err = client.embed(&request()).await.unwrap_err();

        failing.assert_async().await;
        assert!(err.is_retryable());
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn embed_does_not_retry_rejected_input() {
        let mut server = mockito::Server::new_async().await;
        let rejected = server
            .mock("POST", PREDICT_PATH)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"Unsupported image format"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = VertexEmbeddingClient::new(&test_config(&server.url())).unwrap();
        let err = client.embed(&request()).await.unwrap_err();

        rejected.assert_async().await;
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("Unsupported image format"));
    }

    #[tokio::test]
    async fn open_circuit_short_circuits_calls() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", PREDICT_PATH)
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let cfg = EmbeddingConfig {
            circuit_breaker_config: Some(
                CircuitBreakerConfig::default().with_failure_threshold(1),
            ),
            ..test_config(&server.url())
        };
        let client = VertexEmbeddingClient::new(&cfg).unwrap();

        assert!(client.embed(&request()).await.is_err());
        let err = client.embed(&request()).await.unwrap_err();

        failing.assert_async().await;
        assert!(matches!(err, EmbeddingError::Unavailable(_)));
    }

    #[tokio::test]
    async fn rejected_images_do_not_open_circuit() {
        let mut server = mockito::Server::new_async().await;
        let rejected = server
            .mock("POST", PREDICT_PATH)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"Unable to decode image"}}"#)
            .expect(6)
            .create_async()
            .await;

        let client = VertexEmbeddingClient::new(&test_config(&server.url())).unwrap();
        for _ in 0..6 {
            let err = client.embed(&request()).await.unwrap_err();
            assert!(err.to_string().contains("Unable to decode image"));
        }

        rejected.assert_async().await;
        let cb = client.circuit_breaker().unwrap();
        assert_eq!(cb.current_state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    #[tokio::test]
    async fn unreadable_image_leaves_breaker_untouched() {
        let cfg = EmbeddingConfig {
            circuit_breaker_config: Some(
                CircuitBreakerConfig::default()
                    .with_failure_threshold(1)
                    .with_reset_timeout(Duration::ZERO),
            ),
            ..test_config("http://127.0.0.1:9")
        };
        let client = VertexEmbeddingClient::new(&cfg).unwrap();
        let cb = client.circuit_breaker().unwrap();
        cb.record_failure();

        let missing = EmbeddingRequest::new(
            ImageReference::from_path("/nonexistent/fashion-buddy/look.jpg"),
            "tops",
        );
        assert!(matches!(
            client.embed(&missing).await,
            Err(EmbeddingError::InvalidImage(_))
        ));
        assert_eq!(cb.current_state(), CircuitState::Open);
        assert!(cb.allow_request());
        assert_eq!(cb.current_state(), CircuitState::HalfOpen);
    }

    #[tokio::test]
    async fn resilience_disabled_means_single_attempt() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", PREDICT_PATH)
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let cfg = EmbeddingConfig {
            enable_resilience: false,
            ..test_config(&server.url())
        };
        let client = VertexEmbeddingClient::new(&cfg).unwrap();
        assert!(client.circuit_breaker().is_none());
        assert!(client.embed(&request()).await.is_err());
        failing.assert_async().await;
    }
}
