//! Prometheus wiring for the recommendation engine.

use std::sync::OnceLock;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use recommend::RecommendMetrics;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the process-wide Prometheus recorder, once. Rendering happens on
/// the server's own `/metrics` route, so no extra listener is started.
pub fn install_recorder() -> Option<PrometheusHandle> {
    if let Some(existing) = PROMETHEUS_HANDLE.get() {
        return Some(existing.clone());
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = PROMETHEUS_HANDLE.set(handle);
            tracing::info!("installed prometheus recorder");
        }
        Err(err) => tracing::warn!(error = %err, "failed to install prometheus recorder"),
    }
    PROMETHEUS_HANDLE.get().cloned()
}

/// Forwards engine observations to the `metrics` facade.
pub struct PrometheusRecommendMetrics;

impl RecommendMetrics for PrometheusRecommendMetrics {
    fn record_recommendation(
        &self,
        category_count: usize,
        latency: Duration,
        group_count: usize,
        document_count: usize,
        failure_count: usize,
    ) {
        let branch = if category_count == 0 { "ungrouped" } else { "categories" };
        metrics::counter!("fashion_buddy_recommendations_total", "branch" => branch, "outcome" => "ok")
            .increment(1);
        metrics::histogram!("fashion_buddy_recommendation_seconds", "branch" => branch)
            .record(latency.as_secs_f64());
        metrics::histogram!("fashion_buddy_recommendation_groups").record(group_count as f64);
        metrics::histogram!("fashion_buddy_recommendation_documents").record(document_count as f64);
        if failure_count > 0 {
            metrics::counter!("fashion_buddy_category_failures_total").increment(failure_count as u64);
        }
    }

    fn record_failure(&self, category_count: usize, latency: Duration, kind: &str) {
        let branch = if category_count == 0 { "ungrouped" } else { "categories" };
        metrics::counter!(
            "fashion_buddy_recommendations_total",
            "branch" => branch,
            "outcome" => kind.to_string()
        )
        .increment(1);
        metrics::histogram!("fashion_buddy_recommendation_seconds", "branch" => branch)
            .record(latency.as_secs_f64());
    }
}
