use axum::Json;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::header;
use axum::response::Response;
use common::storage::StorageError;
use tokio_util::io::ReaderStream;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::form::{IMAGE_FIELD, read_file_field};
use crate::extractors::origin::RequestOrigin;
use crate::models::image::ImageUploadResponse;
use crate::state::AppState;
use crate::utils::url::absolutize;

pub fn image_upload_body_limit(limit: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(limit)
}

#[utoipa::path(
    post,
    path = "/uploadImage",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload an image",
    description = "Stores the `image` multipart file under a generated unique name and returns its \
        absolute URL. Other fields are ignored.",
    request_body(content_type = "multipart/form-data", description = "Image file in the `image` field"),
    responses(
        (status = 200, description = "Image stored", body = ImageUploadResponse),
        (status = 400, description = "No image uploaded (VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "Image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, origin, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    origin: RequestOrigin,
    mut multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, AppError> {
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            image = Some(read_file_field(field, state.config.storage.max_image_size).await?);
        }
    }

    let image = image.ok_or(StorageError::NoFileProvided)?;
    let stored = state.images.store(&image.data, &image.filename).await?;
    info!(name = %stored.name, size = stored.size, "Image uploaded");

    Ok(Json(ImageUploadResponse {
        image_url: absolutize(&stored.relative_path(), origin.as_str()),
    }))
}

/// Serve a stored image from the public uploads prefix.
#[instrument(skip(state))]
pub async fn serve_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let reader = state.images.open(&filename).await?;
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
