//! Astra DB Data API client.
//!
//! Every query is a single `find` command posted to
//! `{endpoint}/api/json/v1/{keyspace}/{collection}`. The Data API reports
//! command failures in a top-level `errors` array, sometimes with HTTP 200.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{CatalogConfig, CatalogError, ProductDocument, VectorQuery, VectorStore};

pub struct AstraCollection {
    http: reqwest::Client,
    url: String,
    token: String,
    name: String,
}

impl AstraCollection {
    pub fn new(cfg: &CatalogConfig) -> Result<Self, CatalogError> {
        cfg.validate()?;
        let endpoint = non_empty(cfg.api_endpoint.as_deref()).ok_or_else(|| {
            CatalogError::InvalidConfig("api_endpoint is required for the astra backend".into())
        })?;
        let token = non_empty(cfg.token.as_deref()).ok_or_else(|| {
            CatalogError::InvalidConfig("token is required for the astra backend".into())
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CatalogError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self {
            http,
            url: format!(
                "{}/api/json/v1/{}/{}",
                endpoint.trim_end_matches('/'),
                cfg.keyspace,
                cfg.collection
            ),
            token: token.to_string(),
            name: cfg.collection.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl VectorStore for AstraCollection {
    async fn vector_find(&self, query: &VectorQuery) -> Result<Vec<ProductDocument>, CatalogError> {
        let command = find_command(query);
        let response = self
            .http
            .post(&self.url)
            .header("Token", &self.token)
            .json(&command)
            .send()
            .await
            .map_err(|e| CatalogError::Service(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, collection = %self.name, "vector find rejected");
            return Err(CatalogError::Service(format!("HTTP {status}: {body}")));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| CatalogError::Decode(format!("invalid JSON response: {e}")))?;

        let mut documents = parse_documents(body)?;
        if !query.include_similarity {
            for doc in &mut documents {
                doc.similarity = None;
            }
        }
        tracing::debug!(
            collection = %self.name,
            filter = %query.filter.to_json(),
            returned = documents.len(),
            "vector find"
        );
        Ok(documents)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn find_command(query: &VectorQuery) -> Value {
    json!({
        "find": {
            "sort": { "$vector": query.vector },
            "filter": query.filter.to_json(),
            "projection": { "$vector": 0 },
            "options": {
                "limit": query.limit,
                "includeSimilarity": query.include_similarity,
            }
        }
    })
}

fn parse_documents(mut body: Value) -> Result<Vec<ProductDocument>, CatalogError> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string())
                })
                .collect();
            return Err(CatalogError::Service(messages.join("; ")));
        }
    }

    let documents = body
        .pointer_mut("/data/documents")
        .map(Value::take)
        .ok_or_else(|| CatalogError::Decode("response is missing data.documents".into()))?;

    serde_json::from_value(documents).map_err(|e| CatalogError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryFilter;
    use mockito::Matcher;

    const PATH: &str = "/api/json/v1/default_keyspace/shopping_buddy_demo";

    fn config(endpoint: &str) -> CatalogConfig {
        CatalogConfig {
            api_endpoint: Some(endpoint.into()),
            token: Some("AstraCS:test".into()),
            ..Default::default()
        }
    }

    fn query() -> VectorQuery {
        VectorQuery::new(vec![0.25, -0.5], 3)
            .with_filter(QueryFilter::new().with_category("SHOES").with_gender("women"))
            .with_similarity(true)
    }

    #[test]
    fn new_requires_endpoint_and_token() {
        let cfg = CatalogConfig {
            token: Some("t".into()),
            ..Default::default()
        };
        assert!(matches!(
            AstraCollection::new(&cfg),
            Err(CatalogError::InvalidConfig(msg)) if msg.contains("api_endpoint")
        ));
        let cfg = CatalogConfig {
            api_endpoint: Some("https://db.example".into()),
            ..Default::default()
        };
        assert!(matches!(
            AstraCollection::new(&cfg),
            Err(CatalogError::InvalidConfig(msg)) if msg.contains("token")
        ));
    }

    #[test]
    fn url_layout() {
        let store = AstraCollection::new(&config("https://db.example/")).unwrap();
        assert_eq!(store.url(), format!("https://db.example{PATH}"));
        assert_eq!(store.name(), "shopping_buddy_demo");
    }

    #[test]
    fn find_command_shape() {
        let cmd = find_command(&query());
        assert_eq!(cmd["find"]["sort"]["$vector"], json!([0.25, -0.5]));
        assert_eq!(
            cmd["find"]["filter"],
            json!({"category": "SHOES", "gender": "women"})
        );
        assert_eq!(cmd["find"]["projection"], json!({"$vector": 0}));
        assert_eq!(cmd["find"]["options"]["limit"], 3);
        assert_eq!(cmd["find"]["options"]["includeSimilarity"], true);

        let bare = find_command(&VectorQuery::new(vec![1.0], 3));
        assert_eq!(bare["find"]["filter"], json!({}));
        assert_eq!(bare["find"]["options"]["includeSimilarity"], false);
    }

    #[test]
    fn parse_documents_reports_command_errors() {
        let body = json!({"errors": [{"message": "Collection does not exist"}]});
        assert!(matches!(
            parse_documents(body),
            Err(CatalogError::Service(msg)) if msg.contains("does not exist")
        ));
        assert!(matches!(
            parse_documents(json!({"status": {}})),
            Err(CatalogError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn vector_find_posts_find_command() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header("token", "AstraCS:test")
            .match_body(Matcher::PartialJson(json!({
                "find": {
                    "filter": {"category": "SHOES", "gender": "women"},
                    "options": {"limit": 3, "includeSimilarity": true}
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": {
                        "documents": [
                            {
                                "_id": "p1",
                                "product_name": "Trail Sneaker",
                                "price": 89.0,
                                "gender": "women",
                                "category": "SHOES",
                                "details": "Lightweight",
                                "link": "https://shop.example/p1",
                                "product_images": "https://img.example/p1.jpg",
                                "$similarity": 0.87
                            }
                        ],
                        "nextPageState": null
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let store = AstraCollection::new(&config(&server.url())).unwrap();
        let docs = store.vector_find(&query()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].product_name, "Trail Sneaker");
        assert!(docs[0].similarity.is_some());
    }

    #[tokio::test]
    async fn vector_find_strips_unrequested_scores() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"data":{"documents":[{"product_name":"Tee","$similarity":0.5}]}}"#)
            .create_async()
            .await;

        let store = AstraCollection::new(&config(&server.url())).unwrap();
        let docs = store
            .vector_find(&VectorQuery::new(vec![1.0], 3))
            .await
            .unwrap();
        assert!(docs[0].similarity.is_none());
    }

    #[tokio::test]
    async fn vector_find_surfaces_http_and_command_errors() {
        let mut server = mockito::Server::new_async().await;
        let _unauthorized = server
            .mock("POST", PATH)
            .with_status(401)
            .with_body("UNAUTHENTICATED")
            .create_async()
            .await;
        let store = AstraCollection::new(&config(&server.url())).unwrap();
        let err = store.vector_find(&query()).await.unwrap_err();
        assert!(err.is_service_failure());
        assert!(err.to_string().contains("401"));

        let mut server = mockito::Server::new_async().await;
        let _errors = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"errors":[{"message":"Invalid filter expression","errorCode":"INVALID_FILTER_EXPRESSION"}]}"#)
            .create_async()
            .await;
        let store = AstraCollection::new(&config(&server.url())).unwrap();
        let err = store.vector_find(&query()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid filter expression"));
    }
}
