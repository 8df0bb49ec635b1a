use axum::response::IntoResponse;
use axum::Json;
use recommend::{Gender, CATEGORY_MAPPING, TOP_K};
use serde_json::json;

/// Category labels with their backend codes, plus the accepted genders.
pub async fn list_categories() -> impl IntoResponse {
    let categories: Vec<_> = CATEGORY_MAPPING
        .iter()
        .map(|(label, code)| json!({ "label": label, "code": code }))
        .collect();
    let genders: Vec<_> = Gender::ALL.iter().map(Gender::label).collect();

    Json(json!({
        "categories": categories,
        "genders": genders,
        "top_k": TOP_K,
    }))
}
