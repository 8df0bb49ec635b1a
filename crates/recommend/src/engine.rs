use std::future::Future;
use std::time::Instant;

use catalog::{ProductDocument, QueryFilter, VectorQuery, VectorStore};
use embedding::{EmbeddingClient, EmbeddingRequest, ImageReference};
use futures::future::{join_all, try_join_all};

use crate::metrics::metrics_recorder;
use crate::prompt::{category_prompt, GENERIC_PROMPT};
use crate::types::{
    CategoryFailure, FilterCriteria, Gender, RecommendConfig, RecommendError, RecommendationGroup,
    Recommendations, SweepMode,
};


/// Results per query, for both the per-category and the ungrouped branch.
pub const TOP_K: usize = 3;

/// Turns one image plus filters into ranked product groups.
///
/// With categories selected, each category gets its own steering prompt,
/// embedding and filtered query (scores included); groups come back in
/// selection order and are never merged. Without categories a single
/// generic embedding is queried by gender alone, without scores.
pub struct Recommender<E, V> {
    embedder: E,
    store: V,
    config: RecommendConfig,
}

impl<E, V> Recommender<E, V>
where
    E: EmbeddingClient,
    V: VectorStore,
{
    pub fn new(embedder: E, store: V) -> Self {
        Self::with_config(embedder, store, RecommendConfig::default())
    }

    pub fn with_config(embedder: E, store: V, config: RecommendConfig) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn store(&self) -> &V {
        &self.store
    }

    /// Normalize `categories` (UI labels or codes) and run the recommendation.
    pub async fn find_similar<S: AsRef<str>>(
        &self,
        image: &ImageReference,
        gender: Gender,
        categories: &[S],
    ) -> Result<Recommendations, RecommendError> {
        self.recommend(image, &FilterCriteria::new(gender, categories))
            .await
    }

    pub async fn recommend(
        &self,
        image: &ImageReference,
        criteria: &FilterCriteria,
    ) -> Result<Recommendations, RecommendError> {
        let start = Instant::now();
        let category_count = criteria.categories.len();

        let outcome = if criteria.categories.is_empty() {
            self.ungrouped(image, criteria.gender)
                .await
                .map(|group| Recommendations {
                    groups: vec![group],
                    failures: Vec::new(),
                })
        } else {
            self.sweep(image, criteria).await
        };

        let latency = start.elapsed();
        let recorder = metrics_recorder();
        match &outcome {
            Ok(recs) => {
                tracing::info!(
                    gender = %criteria.gender,
                    categories = category_count,
                    groups = recs.groups.len(),
                    documents = recs.document_count(),
                    failures = recs.failures.len(),
                    latency_ms = latency.as_millis() as u64,
                    "recommendation complete"
                );
                if let Some(recorder) = recorder {
                    recorder.record_recommendation(
                        category_count,
                        latency,
                        recs.groups.len(),
                        recs.document_count(),
                        recs.failures.len(),
                    );
                }
            }
            Err(err) => {
                tracing::warn!(
                    gender = %criteria.gender,
                    categories = category_count,
                    error = %err,
                    latency_ms = latency.as_millis() as u64,
                    "recommendation failed"
                );
                if let Some(recorder) = recorder {
                    recorder.record_failure(category_count, latency, err.kind());
                }
            }
        }
        outcome
    }

    async fn sweep(
        &self,
        image: &ImageReference,
        criteria: &FilterCriteria,
    ) -> Result<Recommendations, RecommendError> {
        let gender = criteria.gender;
        let categories = &criteria.categories;

        if !self.config.partial_results {
            let groups = match self.config.sweep {
                SweepMode::Concurrent => {
                    try_join_all(
                        categories
                            .iter()
                            .map(|code| self.category_round_trip(image, gender, code)),
                    )
                    .await?
                }
                SweepMode::Sequential => {
                    let mut groups = Vec::with_capacity(categories.len());
                    for code in categories {
                        groups.push(self.category_round_trip(image, gender, code).await?);
                    }
                    groups
                }
            };
            return Ok(Recommendations {
                groups,
                failures: Vec::new(),
            });
        }

        let results = match self.config.sweep {
            SweepMode::Concurrent => {
                join_all(
                    categories
                        .iter()
                        .map(|code| self.category_round_trip(image, gender, code)),
                )
                .await
            }
            SweepMode::Sequential => {
                let mut results = Vec::with_capacity(categories.len());
                for code in categories {
                    results.push(self.category_round_trip(image, gender, code).await);
                }
                results
            }
        };

        let mut recs = Recommendations::default();
        let mut first_error = None;
        for (code, result) in categories.iter().zip(results) {
            match result {
                Ok(group) => recs.groups.push(group),
                Err(err) => {
                    tracing::warn!(category = %code, error = %err, "dropping failed category");
                    recs.failures.push(CategoryFailure {
                        category: code.clone(),
                        error: err.to_string(),
                    });
                    first_error.get_or_insert(err);
                }
            }
        }

        // Nothing to show: surface the first failure instead of an empty page.
        match first_error {
            Some(err) if recs.groups.is_empty() => Err(err),
            _ => Ok(recs),
        }
    }

    async fn category_round_trip(
        &self,
        image: &ImageReference,
        gender: Gender,
        code: &str,
    ) -> Result<RecommendationGroup, RecommendError> {
        let filter = QueryFilter::new()
            .with_category(code)
            .with_gender(gender.filter_value());
        let documents = self
            .bounded(
                Some(code),
                self.round_trip(image, category_prompt(code), filter, true),
            )
            .await?;
        Ok(RecommendationGroup {
            category: Some(code.to_string()),
            documents,
        })
    }

    async fn ungrouped(
        &self,
        image: &ImageReference,
        gender: Gender,
    ) -> Result<RecommendationGroup, RecommendError> {
        let filter = QueryFilter::new().with_gender(gender.filter_value());
        let documents = self
            .bounded(
                None,
                self.round_trip(image, GENERIC_PROMPT.to_string(), filter, false),
            )
            .await?;
        Ok(RecommendationGroup {
            category: None,
            documents,
        })
    }

    async fn round_trip(
        &self,
        image: &ImageReference,
        prompt: String,
        filter: QueryFilter,
        include_similarity: bool,
    ) -> Result<Vec<ProductDocument>, RecommendError> {
        let embedding = self
            .embedder
            .embed(&EmbeddingRequest::new(image.clone(), prompt))
            .await?;

        let query = VectorQuery::new(embedding.vector, TOP_K)
            .with_filter(filter)
            .with_similarity(include_similarity);
        let mut documents = self.store.vector_find(&query).await?;

        documents.truncate(TOP_K);
        if !include_similarity {
            for doc in &mut documents {
                doc.similarity = None;
            }
        }
        tracing::debug!(
            store = self.store.name(),
            model = self.embedder.model_name(),
            filter = %query.filter.to_json(),
            returned = documents.len(),
            "round trip finished"
        );
        Ok(documents)
    }

    async fn bounded<T, F>(&self, category: Option<&str>, fut: F) -> Result<T, RecommendError>
    where
        F: Future<Output = Result<T, RecommendError>>,
    {
        match self.config.category_timeout() {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                RecommendError::Timeout {
                    category: category.map(str::to_string),
                }
            })?,
            None => fut.await,
        }
    }
}
