use crate::error::ServerResult;
use crate::state::ServerState;
use crate::upload::{read_form, save_upload, RecommendForm, SavedUpload};
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use embedding::ImageReference;
use recommend::Recommendations;
use serde::Serialize;
use std::sync::Arc;

/// JSON body of a successful recommendation.
#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub image: String,
    pub gender: String,
    pub categories: Vec<String>,
    #[serde(flatten)]
    pub recommendations: Recommendations,
}

/// Save the upload and run the engine on the saved file.
pub(crate) async fn run_recommendation(
    state: &ServerState,
    form: &RecommendForm,
) -> ServerResult<(SavedUpload, Recommendations)> {
    let saved = save_upload(&state.config.assets_dir, &form.file_name, form.image.clone()).await?;
    let image = ImageReference::from_path(&saved.path);
    let recs = state
        .recommender
        .find_similar(&image, form.gender, &form.categories)
        .await?;
    Ok((saved, recs))
}

/// Recommend products for an uploaded image
///
/// `POST /api/v1/recommend`, multipart with `image`, `gender` and repeated
/// `category` fields.
///
/// # Response
///
/// ```json
/// {
///   "image": "look.png",
///   "gender": "Women",
///   "categories": ["TOPS"],
///   "groups": [{ "category": "TOPS", "documents": [{ "product_name": "...", "similarity": 0.83 }] }]
/// }
/// ```
pub async fn recommend_products(
    State(state): State<Arc<ServerState>>,
    multipart: Multipart,
) -> ServerResult<impl IntoResponse> {
    let form = read_form(multipart, state.config.max_body_size_mb).await?;
    let (saved, recs) = run_recommendation(&state, &form).await?;

    Ok(Json(RecommendResponse {
        image: saved.file_name,
        gender: form.gender.to_string(),
        categories: recommend::normalize_categories(&form.categories),
        recommendations: recs,
    }))
}
