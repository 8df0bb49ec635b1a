use crate::error::{ServerError, ServerResult};
use crate::routes::recommend::run_recommendation;
use crate::state::ServerState;
use crate::upload::read_form;
use crate::web::PageView;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use std::sync::Arc;

pub const SAMPLE_IMAGE_NAME: &str = "example-outfit.jpeg";

/// The upload page (`GET /`).
pub async fn index_page(State(state): State<Arc<ServerState>>) -> ServerResult<Html<String>> {
    Ok(Html(state.web.render_page(&PageView::default())?))
}

/// "Recommend Products" form submit (`POST /recommend`).
///
/// Always answers with the page; failures show up as an error banner with
/// the matching status code.
pub async fn recommend_page(
    State(state): State<Arc<ServerState>>,
    multipart: Multipart,
) -> Response {
    let form = match read_form(multipart, state.config.max_body_size_mb).await {
        Ok(form) => form,
        Err(err) => return render_error(&state, PageView::default(), err),
    };

    let view = PageView::new(form.gender, &form.categories);
    match run_recommendation(&state, &form).await {
        Ok((saved, recs)) => {
            let view = view.with_upload(&saved).with_results(&recs);
            match state.web.render_page(&view) {
                Ok(html) => Html(html).into_response(),
                Err(err) => err.into_response(),
            }
        }
        Err(err) => render_error(&state, view, err),
    }
}

fn render_error(state: &ServerState, view: PageView, err: ServerError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!(error = %err, "recommendation page failed");
    } else {
        tracing::debug!(error = %err, "recommendation page rejected input");
    }
    match state.web.render_page(&view.with_error(err.to_string())) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(render_err) => render_err.into_response(),
    }
}

/// Download the example outfit (`GET /sample-image`).
pub async fn sample_image(State(state): State<Arc<ServerState>>) -> ServerResult<Response> {
    let data = match tokio::fs::read(&state.config.sample_image_path).await {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %state.config.sample_image_path.display(), "sample image missing");
            return Err(ServerError::NotFound);
        }
        Err(err) => return Err(err.into()),
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/jpeg".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SAMPLE_IMAGE_NAME}\""),
            ),
        ],
        data,
    )
        .into_response())
}
