use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use catalog::{CatalogError, ProductDocument};
use embedding::EmbeddingError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// UI category label to backend category code.
pub const CATEGORY_MAPPING: [(&str, &str); 7] = [
    ("Tops", "TOPS"),
    ("Dresses/Jumpsuits", "DRESSES_JUMPSUITS"),
    ("Outerwear", "OUTERWEAR"),
    ("Bottoms", "BOTTOMS"),
    ("Accessories", "ACCESSORIES"),
    ("Activewear", "ACTIVEWEAR"),
    ("Shoes", "SHOES"),
];

/// Backend code for a UI label. Labels outside the table pass through verbatim,
/// so backend codes map to themselves.
pub fn to_backend_code(label: &str) -> String {
    CATEGORY_MAPPING
        .iter()
        .find(|(ui, _)| *ui == label)
        .map(|(_, code)| (*code).to_string())
        .unwrap_or_else(|| label.to_string())
}

/// Map labels to codes, keeping the first occurrence of each code.
pub fn normalize_categories<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    let mut codes: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let code = to_backend_code(label.as_ref());
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    codes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(alias = "men", alias = "MEN")]
    Men,
    #[serde(alias = "women", alias = "WOMEN")]
    Women,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Men, Gender::Women];

    /// Label shown in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Men => "Men",
            Gender::Women => "Women",
        }
    }

    /// Value stored on catalog documents; always lowercase.
    pub fn filter_value(&self) -> String {
        self.label().to_lowercase()
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Gender {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "men" => Ok(Gender::Men),
            "women" => Ok(Gender::Women),
            other => Err(RecommendError::InvalidFilter(format!(
                "gender must be 'Men' or 'Women', got '{other}'"
            ))),
        }
    }
}

/// Gender plus the ordered, de-duplicated category codes of one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub gender: Gender,
    pub categories: Vec<String>,
}

impl FilterCriteria {
    pub fn new<S: AsRef<str>>(gender: Gender, labels: &[S]) -> Self {
        Self {
            gender,
            categories: normalize_categories(labels),
        }
    }
}

/// Results for one category, or for the ungrouped query when `category` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationGroup {
    pub category: Option<String>,
    pub documents: Vec<ProductDocument>,
}

/// A category dropped under partial results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFailure {
    pub category: String,
    pub error: String,
}

/// Ordered result groups of one action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub groups: Vec<RecommendationGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<CategoryFailure>,
}

impl Recommendations {
    pub fn document_count(&self) -> usize {
        self.groups.iter().map(|g| g.documents.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.document_count() == 0
    }
}

/// How per-category round trips are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepMode {
    /// One category after another.
    Sequential,
    /// All categories in flight at once, reassembled in selection order.
    #[default]
    Concurrent,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub sweep: SweepMode,
    /// Keep successful categories when others fail.
    pub partial_results: bool,
    /// Upper bound on one embedding + query round trip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_timeout_ms: Option<u64>,
}

impl RecommendConfig {
    pub fn category_timeout(&self) -> Option<Duration> {
        self.category_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), RecommendError> {
        if self.category_timeout_ms == Some(0) {
            return Err(RecommendError::InvalidConfig(
                "category_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum RecommendError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("catalog query failed: {0}")]
    Catalog(#[from] CatalogError),
    #[error("timed out waiting for {}", .category.as_deref().unwrap_or("ungrouped query"))]
    Timeout { category: Option<String> },
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("invalid recommend config: {0}")]
    InvalidConfig(String),
}

impl RecommendError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RecommendError::Embedding(_) => "embedding",
            RecommendError::Catalog(_) => "catalog",
            RecommendError::Timeout { .. } => "timeout",
            RecommendError::InvalidFilter(_) => "invalid_filter",
            RecommendError::InvalidConfig(_) => "invalid_config",
        }
    }
}
