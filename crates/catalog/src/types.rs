use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Equality filter applied alongside the vector sort.
///
/// Unset fields are omitted from the command entirely, so an empty filter
/// matches every document in the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category<T: Into<String>>(mut self, category: T) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_gender<T: Into<String>>(mut self, gender: T) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.gender.is_none()
    }

    /// Render as a Data API filter object.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        if let Some(category) = &self.category {
            map.insert("category".into(), Value::String(category.clone()));
        }
        if let Some(gender) = &self.gender {
            map.insert("gender".into(), Value::String(gender.clone()));
        }
        Value::Object(map)
    }

    /// Exact, case-sensitive match against a document's attributes.
    pub fn matches(&self, doc: &ProductDocument) -> bool {
        if let Some(category) = &self.category {
            if doc.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(gender) = &self.gender {
            if doc.gender != *gender {
                return false;
            }
        }
        true
    }
}

/// One nearest-neighbour request against a product collection.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorQuery {
    pub vector: Vec<f32>,
    pub filter: QueryFilter,
    pub limit: usize,
    pub include_similarity: bool,
}

impl VectorQuery {
    pub fn new(vector: Vec<f32>, limit: usize) -> Self {
        Self {
            vector,
            filter: QueryFilter::default(),
            limit,
            include_similarity: false,
        }
    }

    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_similarity(mut self, include: bool) -> Self {
        self.include_similarity = include;
        self
    }
}

/// A product record as returned by the store, minus its vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub product_name: String,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Price,
    #[serde(default)]
    pub gender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, deserialize_with = "deserialize_images")]
    pub product_images: Vec<String>,
    #[serde(
        rename(serialize = "similarity", deserialize = "$similarity"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub similarity: Option<f32>,
}

impl ProductDocument {
    /// First product image, if the record carries any.
    pub fn primary_image(&self) -> Option<&str> {
        self.product_images.first().map(String::as_str)
    }
}

/// Listed price. Numeric strings are read as amounts; anything else
/// (`"$1,299.00"`, `"49.99 USD"`) is kept verbatim for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Text(String),
}

impl Price {
    pub fn amount(&self) -> Option<f64> {
        match self {
            Price::Amount(n) => Some(*n),
            Price::Text(_) => None,
        }
    }
}

impl Default for Price {
    fn default() -> Self {
        Price::Amount(0.0)
    }
}

impl From<f64> for Price {
    fn from(amount: f64) -> Self {
        Price::Amount(amount)
    }
}

impl PartialEq<f64> for Price {
    fn eq(&self, other: &f64) -> bool {
        self.amount() == Some(*other)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Price::Amount(n) => write!(f, "${n:.2}"),
            Price::Text(s) if s.starts_with('$') => f.write_str(s),
            Price::Text(s) => write!(f, "${s}"),
        }
    }
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<Price, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Price>::deserialize(deserializer)? {
        Some(Price::Text(s)) => match s.trim().trim_start_matches('$').parse::<f64>() {
            Ok(n) => Price::Amount(n),
            Err(_) => Price::Text(s.trim().to_string()),
        },
        Some(price) => price,
        None => Price::default(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImagesRepr {
    One(String),
    Many(Vec<String>),
}

fn deserialize_images<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ImagesRepr>::deserialize(deserializer)? {
        Some(ImagesRepr::One(s)) if s.is_empty() => Vec::new(),
        Some(ImagesRepr::One(s)) => vec![s],
        Some(ImagesRepr::Many(v)) => v,
        None => Vec::new(),
    })
}
