//! Uploaded image handling.
//!
//! An upload is accepted when its extension is jpg/jpeg/png and its bytes
//! decode as an image. It is re-encoded as JPEG and written to the assets
//! directory under its own file name (path components stripped, last write
//! wins); that file is what gets embedded.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use axum::extract::multipart::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use image::ImageFormat;
use recommend::Gender;

use crate::error::{ServerError, ServerResult};

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Fields of the "Recommend Products" form.
#[derive(Debug, Clone)]
pub struct RecommendForm {
    pub file_name: String,
    pub image: Bytes,
    pub gender: Gender,
    pub categories: Vec<String>,
}

/// A validated upload after it has been written to disk.
#[derive(Debug, Clone)]
pub struct SavedUpload {
    pub path: PathBuf,
    pub file_name: String,
    pub jpeg: Bytes,
}

/// Read the multipart form: one `image` file, an optional `gender`
/// (defaults to Men) and any number of `category` fields.
pub async fn read_form(mut multipart: Multipart, max_body_mb: usize) -> ServerResult<RecommendForm> {
    let mut image: Option<(String, Bytes)> = None;
    let mut gender = Gender::Men;
    let mut categories = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_body_mb))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" | "file" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ServerError::BadRequest("image field has no file name".into()))?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_body_mb))?;
                image = Some((file_name, data));
            }
            "gender" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_body_mb))?;
                gender = value.parse()?;
            }
            "category" | "categories" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_body_mb))?;
                if !value.trim().is_empty() {
                    categories.push(value);
                }
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    let (file_name, image) =
        image.ok_or_else(|| ServerError::BadRequest("no image uploaded".into()))?;
    Ok(RecommendForm {
        file_name,
        image,
        gender,
        categories,
    })
}

fn multipart_error(err: axum::extract::multipart::MultipartError, max_body_mb: usize) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(max_body_mb)
    } else {
        ServerError::from(err)
    }
}

/// Final path component of a client-supplied file name.
pub fn sanitize_file_name(raw: &str) -> ServerResult<String> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(ServerError::BadRequest(format!("invalid file name '{raw}'")));
    }
    Ok(name.to_string())
}

/// Reject anything but jpg/jpeg/png (case-insensitive).
pub fn check_extension(file_name: &str) -> ServerResult<()> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(ServerError::UnsupportedMediaType(format!(
            "'{file_name}' is not one of {}",
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

/// Decode any supported image and re-encode it as JPEG.
pub fn reencode_jpeg(data: &[u8]) -> ServerResult<Bytes> {
    let decoded = image::load_from_memory(data)
        .map_err(|e| ServerError::BadRequest(format!("upload is not a readable image: {e}")))?;
    let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| ServerError::Internal(format!("jpeg encoding failed: {e}")))?;
    Ok(Bytes::from(out.into_inner()))
}

/// Validate, re-encode and persist an upload under `assets_dir`.
pub async fn save_upload(assets_dir: &Path, raw_name: &str, data: Bytes) -> ServerResult<SavedUpload> {
    let file_name = sanitize_file_name(raw_name)?;
    check_extension(&file_name)?;

    let jpeg = tokio::task::spawn_blocking(move || reencode_jpeg(&data))
        .await
        .map_err(|e| ServerError::Internal(format!("image task failed: {e}")))??;

    tokio::fs::create_dir_all(assets_dir).await?;
    let path = assets_dir.join(&file_name);
    tokio::fs::write(&path, &jpeg).await?;
    tracing::info!(path = %path.display(), bytes = jpeg.len(), "saved upload");

    Ok(SavedUpload {
        path,
        file_name,
        jpeg,
    })
}
