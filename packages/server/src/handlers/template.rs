use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::form::TemplateForm;
use crate::extractors::json::AppJson;
use crate::extractors::origin::RequestOrigin;
use crate::models::shared::MessageResponse;
use crate::models::template::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/getEmailLayouts",
    tag = "Templates",
    operation_id = "listTemplates",
    summary = "List all email templates",
    description = "Returns every stored template in insertion order. Relative image paths are \
        resolved against the requesting host.",
    responses(
        (status = 200, description = "All templates", body = Vec<TemplateResponse>),
        (status = 500, description = "Store failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, origin))]
pub async fn list_templates(
    State(state): State<AppState>,
    origin: RequestOrigin,
) -> Result<Json<Vec<TemplateResponse>>, AppError> {
    let templates = state.templates.list_all().await?;

    Ok(Json(
        templates
            .into_iter()
            .map(|m| TemplateResponse::normalized(m, origin.as_str()))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/getEmailLayout/{id}",
    tag = "Templates",
    operation_id = "getTemplate",
    summary = "Get an email template by ID",
    params(("id" = String, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template details", body = TemplateResponse),
        (status = 404, description = "Template not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Store failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, origin))]
pub async fn get_template(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Path(id): Path<String>,
) -> Result<Json<TemplateResponse>, AppError> {
    let model = state.templates.get_by_id(&id).await?;
    Ok(Json(TemplateResponse::normalized(model, origin.as_str())))
}

#[utoipa::path(
    post,
    path = "/uploadEmailConfig",
    tag = "Templates",
    operation_id = "createTemplate",
    summary = "Create a new email template",
    description = "Creates a template. `title` and `content` are required and must be non-blank; \
        `footer` defaults to an empty string and `imageUrls` to an empty list.",
    request_body = CreateTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = TemplateResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Store failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, origin, payload))]
pub async fn create_template(
    State(state): State<AppState>,
    origin: RequestOrigin,
    AppJson(payload): AppJson<CreateTemplateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let draft = validate_create_template(payload)?;
    let model = state.templates.create(draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(TemplateResponse::normalized(model, origin.as_str())),
    ))
}

#[utoipa::path(
    put,
    path = "/updateEmailConfig/{id}",
    tag = "Templates",
    operation_id = "updateTemplate",
    summary = "Update an email template",
    description = "Replaces the supplied fields; absent fields keep their stored value. Accepts JSON, \
        or `multipart/form-data` with the same fields plus an optional `image` file. A new image is \
        appended to the `imageUrls` sent in the same request (or to the stored list when \
        `imageUrls` is omitted). Stored URLs not included in a supplied `imageUrls` are dropped.",
    params(("id" = String, Path, description = "Template ID")),
    request_body = UpdateTemplateRequest,
    responses(
        (status = 200, description = "Template updated", body = TemplateResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Template not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "Image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 500, description = "Store failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, origin, form))]
pub async fn update_template(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Path(id): Path<String>,
    form: TemplateForm,
) -> Result<Json<TemplateResponse>, AppError> {
    let appended_image = match form.image {
        Some(image) => {
            // No image is written for an unknown id.
            state.templates.get_by_id(&id).await?;
            let stored = state.images.store(&image.data, &image.filename).await?;
            Some(stored.relative_path())
        }
        None => None,
    };

    let model = state
        .templates
        .update(&id, form.request.into_changes(appended_image))
        .await?;

    Ok(Json(TemplateResponse::normalized(model, origin.as_str())))
}

#[utoipa::path(
    delete,
    path = "/deleteEmailConfig/{id}",
    tag = "Templates",
    operation_id = "deleteTemplate",
    summary = "Delete an email template",
    description = "Permanently deletes a template. Image files it references are left in place.",
    params(("id" = String, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template deleted", body = MessageResponse),
        (status = 404, description = "Template not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Store failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.templates.delete(&id).await?;

    Ok(Json(MessageResponse {
        message: "Template deleted".into(),
    }))
}
