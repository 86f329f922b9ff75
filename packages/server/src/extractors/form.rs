use axum::extract::multipart::Field;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header;

use crate::error::AppError;
use crate::extractors::json::AppJson;
use crate::models::template::UpdateTemplateRequest;
use crate::state::AppState;

/// Multipart field carrying an image file.
pub const IMAGE_FIELD: &str = "image";

/// An image file read from a multipart request.
pub struct UploadedImage {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Read a file field into memory, aborting once it exceeds `max_size` bytes.
pub async fn read_file_field(
    mut field: Field<'_>,
    max_size: u64,
) -> Result<UploadedImage, AppError> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let mut data = Vec::new();

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (data.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::PayloadTooLarge(format!(
                "Image exceeds maximum size of {max_size} bytes"
            )));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(UploadedImage { filename, data })
}

/// Update payload sent either as JSON or as `multipart/form-data`.
///
/// In multipart form, `title`, `content` and `footer` are text fields,
/// `imageUrls` (or `imageUrls[]`) may repeat or hold a JSON array, and an
/// optional `image` file is uploaded alongside. An empty file counts as none.
pub struct TemplateForm {
    pub request: UpdateTemplateRequest,
    pub image: Option<UploadedImage>,
}

impl FromRequest<AppState> for TemplateForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let AppJson(request) = AppJson::<UpdateTemplateRequest>::from_request(req, state).await?;
            return Ok(Self {
                request,
                image: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let mut request = UpdateTemplateRequest::default();
        let mut image = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                IMAGE_FIELD => {
                    let file = read_file_field(field, state.config.storage.max_image_size).await?;
                    image = (!file.data.is_empty()).then_some(file);
                }
                "title" => request.title = Some(read_text(field).await?),
                "content" => request.content = Some(read_text(field).await?),
                "footer" => request.footer = Some(read_text(field).await?),
                "imageUrls" | "imageUrls[]" => {
                    let text = read_text(field).await?;
                    let urls = request.image_urls.get_or_insert_with(Vec::new);
                    urls.extend(parse_url_field(&text)?);
                }
                _ => {} // Ignore unknown fields.
            }
        }

        Ok(Self { request, image })
    }
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read '{name}': {e}")))
}

/// One `imageUrls` form value: a JSON array of strings, a single URL, or blank.
fn parse_url_field(text: &str) -> Result<Vec<String>, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|e| AppError::Validation(format!("Invalid imageUrls: {e}")));
    }
    Ok(vec![trimmed.to_string()])
}
