use std::io;
use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use engine::Category;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::filename::validate_image_filename;

/// Serve a generated avatar image by filename.
///
/// Generated files are immutable, so they get a long-lived cache header.
#[instrument(skip(state))]
pub async fn serve_generated(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let name = validate_image_filename(&filename)
        .map_err(|e| AppError::Validation(e.message().into()))?;

    let path = state.config.assets.generated_dir.join(name);
    serve_png(&path, "public, max-age=31536000, immutable").await
}

/// Serve a raw trait layer image, e.g. `/assets/hair/mohawk_rare.png`.
#[instrument(skip(state))]
pub async fn serve_trait_asset(
    State(state): State<AppState>,
    Path((category, filename)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let category = Category::from_dir_name(&category)
        .ok_or_else(|| AppError::NotFound(format!("Unknown trait category '{category}'")))?;
    let name = validate_image_filename(&filename)
        .map_err(|e| AppError::Validation(e.message().into()))?;

    let path = state.catalog.asset_path(category, name);
    serve_png(&path, "public, max-age=3600").await
}

async fn serve_png(path: &FsPath, cache_control: &str) -> Result<Response, AppError> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("Image not found".into()));
        }
        Err(e) => return Err(AppError::Internal(format!("IO error: {e}"))),
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, cache_control)
        .body(Body::from(content))
        .map_err(|e| AppError::Internal(e.to_string()))
}
