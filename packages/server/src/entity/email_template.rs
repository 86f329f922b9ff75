use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "email_template")]
pub struct Model {
    /// UUIDv7 primary key; time-ordered, so sorting by id is insertion order.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String, // rich text / HTML
    #[sea_orm(column_type = "Text")]
    pub footer: String,

    /// Absolute URLs or store-relative paths, in display order.
    #[sea_orm(column_type = "Json")]
    pub image_urls: ImageUrls,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

/// Ordered image references stored inline with the template as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ImageUrls(pub Vec<String>);

impl From<Vec<String>> for ImageUrls {
    fn from(urls: Vec<String>) -> Self {
        Self(urls)
    }
}
