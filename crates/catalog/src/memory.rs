use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{CatalogError, ProductDocument, VectorQuery, VectorStore};

/// A stored product and the vector it is indexed under.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRecord {
    #[serde(rename = "$vector")]
    pub vector: Vec<f32>,
    #[serde(flatten)]
    pub document: ProductDocument,
}

/// Brute-force in-process catalog.
///
/// Scores follow the Data API's cosine convention, `(1 + cos) / 2`, so a
/// catalog seeded from an export ranks and reports the same way as the
/// hosted collection.
pub struct InMemoryCatalog {
    name: String,
    records: RwLock<Vec<CatalogRecord>>,
}

impl InMemoryCatalog {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(Vec::new()),
        }
    }

    /// Load a JSON array of product records, each carrying a `$vector`.
    pub fn from_json_file<T: Into<String>>(name: T, path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::backend(format!("failed to read seed {}: {e}", path.display()))
        })?;
        Self::from_json_str(name, &raw)
    }

    pub fn from_json_str<T: Into<String>>(name: T, raw: &str) -> Result<Self, CatalogError> {
        let records: Vec<CatalogRecord> = serde_json::from_str(raw)
            .map_err(|e| CatalogError::backend(format!("invalid seed data: {e}")))?;
        let catalog = Self::new(name);
        for record in records {
            catalog.insert(record)?;
        }
        Ok(catalog)
    }

    pub fn insert(&self, mut record: CatalogRecord) -> Result<(), CatalogError> {
        if record.vector.is_empty() {
            return Err(CatalogError::backend(format!(
                "product '{}' has an empty vector",
                record.document.product_name
            )));
        }
        record.document.similarity = None;
        let mut records = self
            .records
            .write()
            .map_err(|_| CatalogError::backend("catalog lock poisoned"))?;
        records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VectorStore for InMemoryCatalog {
    async fn vector_find(&self, query: &VectorQuery) -> Result<Vec<ProductDocument>, CatalogError> {
        let records = self
            .records
            .read()
            .map_err(|_| CatalogError::backend("catalog lock poisoned"))?;

        let mut scored: Vec<(f32, &CatalogRecord)> = records
            .iter()
            .filter(|r| query.filter.matches(&r.document))
            .map(|r| (similarity_score(&query.vector, &r.vector), r))
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(query.limit)
            .map(|(score, record)| {
                let mut doc = record.document.clone();
                doc.similarity = query.include_similarity.then_some(score);
                doc
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Cosine similarity mapped onto `[0, 1]`.
fn similarity_score(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let cosine = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    (1.0 + cosine) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryFilter;
    use serde_json::json;

    fn seed() -> InMemoryCatalog {
        let raw = json!([
            {"product_name": "White Tee", "price": 20, "gender": "women", "category": "TOPS", "$vector": [1.0, 0.0]},
            {"product_name": "Grey Tee", "price": 22, "gender": "men", "category": "TOPS", "$vector": [0.9, 0.1]},
            {"product_name": "Runner", "price": 90, "gender": "women", "category": "SHOES", "$vector": [0.0, 1.0]},
            {"product_name": "Boot", "price": 140, "gender": "women", "category": "SHOES", "$vector": [-1.0, 0.0]},
            {"product_name": "Loafer", "price": 110, "gender": "women", "category": "SHOES", "$vector": [0.7, 0.7]},
            {"product_name": "Slide", "price": 30, "gender": "women", "category": "SHOES", "$vector": [0.1, 0.9]}
        ]);
        InMemoryCatalog::from_json_str("test", &raw.to_string()).unwrap()
    }

    #[test]
    fn similarity_score_range() {
        assert!((similarity_score(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(similarity_score(&[1.0, 0.0], &[-1.0, 0.0]).abs() < 1e-6);
        assert!((similarity_score(&[1.0, 0.0], &[0.0, 1.0]) - 0.5).abs() < 1e-6);
        assert_eq!(similarity_score(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(similarity_score(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn seed_rejects_empty_vectors() {
        let raw = r#"[{"product_name": "Ghost", "$vector": []}]"#;
        assert!(InMemoryCatalog::from_json_str("test", raw).is_err());
    }

    #[test]
    fn seed_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, r#"[{"product_name": "Cap", "$vector": [0.2, 0.4]}]"#).unwrap();
        let catalog = InMemoryCatalog::from_json_file("file", &path).unwrap();
        assert_eq!(catalog.len(), 1);

        let missing = InMemoryCatalog::from_json_file("file", &dir.path().join("nope.json"));
        assert!(matches!(missing, Err(CatalogError::Backend(_))));
    }

    #[tokio::test]
    async fn filters_ranks_and_limits() {
        let catalog = seed();
        let query = VectorQuery::new(vec![0.0, 1.0], 3)
            .with_filter(QueryFilter::new().with_category("SHOES").with_gender("women"))
            .with_similarity(true);
        let docs = catalog.vector_find(&query).await.unwrap();

        let names: Vec<_> = docs.iter().map(|d| d.product_name.as_str()).collect();
        assert_eq!(names, vec!["Runner", "Slide", "Loafer"]);
        assert!(docs.iter().all(|d| d.category.as_deref() == Some("SHOES")));
        let scores: Vec<f32> = docs.iter().map(|d| d.similarity.unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn scores_only_when_requested() {
        let catalog = seed();
        let docs = catalog
            .vector_find(&VectorQuery::new(vec![1.0, 0.0], 3))
            .await
            .unwrap();
        assert_eq!(docs.len(), 3);
        assert!(docs.iter().all(|d| d.similarity.is_none()));
    }

    #[tokio::test]
    async fn unmatched_filter_returns_empty() {
        let catalog = seed();
        let query = VectorQuery::new(vec![1.0, 0.0], 3)
            .with_filter(QueryFilter::new().with_category("OUTERWEAR"));
        assert!(catalog.vector_find(&query).await.unwrap().is_empty());
    }
}
