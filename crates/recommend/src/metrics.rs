// Metrics hooks for the recommendation engine.
//
// Install a global `RecommendMetrics` implementation via [`set_recommend_metrics`];
// every `Recommender::find_similar` call then reports its latency and result
// shape, independent of the metrics backend.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

/// Metrics observer for recommendation actions.
pub trait RecommendMetrics: Send + Sync {
    /// Record a finished action.
    ///
    /// `category_count` is the number of categories requested (0 for the
    /// ungrouped query), `group_count`/`document_count` describe what was
    /// returned and `failure_count` the categories dropped under partial results.
    fn record_recommendation(
        &self,
        category_count: usize,
        latency: Duration,
        group_count: usize,
        document_count: usize,
        failure_count: usize,
    );

    /// Record an action that failed as a whole.
    fn record_failure(&self, category_count: usize, latency: Duration, kind: &str);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn RecommendMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn RecommendMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn RecommendMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global recommendation metrics recorder.
pub fn set_recommend_metrics(recorder: Option<Arc<dyn RecommendMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
