use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::email_template;
use crate::error::AppError;
use crate::repository::{NewTemplate, TemplateChanges};
use crate::utils::url::normalize_image_urls;

use super::shared::string_list;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    #[schema(example = "Sale")]
    pub title: Option<String>,
    /// Rich text / HTML body.
    #[schema(example = "<p>Hi</p>")]
    pub content: Option<String>,
    #[schema(example = "Bye")]
    pub footer: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub image_urls: Option<Vec<String>>,
}

/// Field replacements; absent fields keep their stored value.
#[derive(Deserialize, Default, PartialEq, Debug, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub footer: Option<String>,
    /// Replaces the stored list when present.
    #[serde(default, deserialize_with = "string_list")]
    pub image_urls: Option<Vec<String>>,
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub footer: String,
    /// Absolute image URLs in display order.
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TemplateResponse {
    /// Build the outbound record, resolving relative image paths against `origin`.
    pub fn normalized(m: email_template::Model, origin: &str) -> Self {
        Self {
            id: m.id.to_string(),
            title: m.title,
            content: m.content,
            footer: m.footer,
            image_urls: normalize_image_urls(&m.image_urls.0, origin),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_create_template(req: CreateTemplateRequest) -> Result<NewTemplate, AppError> {
    let title = req.title.filter(|t| !t.trim().is_empty());
    let content = req.content.filter(|c| !c.trim().is_empty());
    let (Some(title), Some(content)) = (title, content) else {
        return Err(AppError::Validation(
            "Title and content are required".into(),
        ));
    };

    Ok(NewTemplate {
        title,
        content,
        footer: req.footer.unwrap_or_default(),
        image_urls: req.image_urls.unwrap_or_default(),
    })
}

impl UpdateTemplateRequest {
    pub fn into_changes(self, appended_image: Option<String>) -> TemplateChanges {
        TemplateChanges {
            title: self.title,
            content: self.content,
            footer: self.footer,
            image_urls: self.image_urls,
            appended_image,
        }
    }
}
