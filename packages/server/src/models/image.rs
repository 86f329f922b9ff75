use serde::Serialize;

/// Response DTO for an uploaded image.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    /// Absolute URL under which the image is served.
    #[schema(example = "http://localhost:5000/uploads/1712345678901.png")]
    pub image_url: String,
}
