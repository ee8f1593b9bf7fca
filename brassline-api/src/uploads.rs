use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    middleware,
    routing::post,
    Json, Router,
};
use brassline_core::UploadedImage;

use crate::{error::AppError, middleware::require_admin, state::AppState};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 16 * 1024;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(upload_image))
        .layer(DefaultBodyLimit::max(
            state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Validation(err.body_text())
    }
}

/// POST /api/uploads
/// Expects an image in the `file` part
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedImage>), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(AppError::Validation(format!(
                "Unsupported content type '{}', expected an image",
                content_type
            )));
        }

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.len() > state.max_upload_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Image exceeds the {} byte limit",
                state.max_upload_bytes
            )));
        }
        if bytes.is_empty() {
            return Err(AppError::Validation("Empty file".into()));
        }

        let uploaded = state
            .images
            .upload(&file_name, &content_type, bytes.to_vec())
            .await?;
        tracing::info!("Stored image {} ({} bytes)", uploaded.url, uploaded.size_bytes);

        return Ok((StatusCode::CREATED, Json(uploaded)));
    }

    Err(AppError::Validation("Missing 'file' part".into()))
}
