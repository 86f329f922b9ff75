use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, UpdateMany,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::entity::email_template::{self, ImageUrls};

/// Rounds of read-and-compare before an append to the stored list gives up.
const MAX_APPEND_ATTEMPTS: u32 = 16;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("{0}")]
    Validation(String),
    #[error("template not found: {0}")]
    NotFound(String),
    #[error("template store failure: {0}")]
    Store(#[from] DbErr),
}

/// Fields for a new template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTemplate {
    pub title: String,
    pub content: String,
    pub footer: String,
    pub image_urls: Vec<String>,
}

/// Field replacements for an existing template. `None` leaves a field as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub footer: Option<String>,
    pub image_urls: Option<Vec<String>>,
    /// URL of an image uploaded with this update.
    ///
    /// Appended to `image_urls` when those are supplied, otherwise to the
    /// stored list. Stored URLs missing from a supplied list are dropped.
    pub appended_image: Option<String>,
}

/// Persistence for email templates.
#[derive(Clone)]
pub struct TemplateRepository {
    db: DatabaseConnection,
}

impl TemplateRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<email_template::Model>, TemplateError> {
        Ok(email_template::Entity::find()
            .order_by_asc(email_template::Column::Id)
            .all(&self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<email_template::Model, TemplateError> {
        find_template(&self.db, id).await
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create(&self, draft: NewTemplate) -> Result<email_template::Model, TemplateError> {
        if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
            return Err(TemplateError::Validation(
                "Title and content are required".into(),
            ));
        }

        let now = Utc::now();
        let model = email_template::ActiveModel {
            id: Set(Uuid::now_v7()),
            title: Set(draft.title),
            content: Set(draft.content),
            footer: Set(draft.footer),
            image_urls: Set(ImageUrls(draft.image_urls)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(id = %model.id, "Template created");
        Ok(model)
    }

    /// Apply `changes` to one template.
    ///
    /// Every path is a single conditional `UPDATE`, so no lock is held between
    /// reading and writing. Extending the stored image list compares
    /// `updated_at` with the value that was read and retries when another
    /// update landed in between.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: &str,
        changes: TemplateChanges,
    ) -> Result<email_template::Model, TemplateError> {
        let uuid = parse_id(id)?;

        let replacement = changes.image_urls.clone().map(|mut urls| {
            urls.extend(changes.appended_image.clone());
            urls
        });
        let Some(appended) = changes
            .appended_image
            .clone()
            .filter(|_| replacement.is_none())
        else {
            let result = changed_columns(uuid, &changes, replacement)
                .exec(&self.db)
                .await?;
            if result.rows_affected == 0 {
                return Err(TemplateError::NotFound(id.to_string()));
            }
            return find_template(&self.db, id).await;
        };

        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            let existing = find_template(&self.db, id).await?;
            let mut urls = existing.image_urls.0;
            urls.push(appended.clone());

            let result = changed_columns(uuid, &changes, Some(urls))
                .filter(email_template::Column::UpdatedAt.eq(existing.updated_at))
                .exec(&self.db)
                .await?;
            if result.rows_affected > 0 {
                return find_template(&self.db, id).await;
            }
            debug!(attempt, "Template changed while appending image, retrying");
        }

        Err(TemplateError::Store(DbErr::Custom(format!(
            "template {id} kept changing; image not appended after {MAX_APPEND_ATTEMPTS} attempts"
        ))))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), TemplateError> {
        let uuid = parse_id(id)?;
        let result = email_template::Entity::delete_by_id(uuid)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(TemplateError::NotFound(id.to_string()));
        }

        info!("Template deleted");
        Ok(())
    }
}

/// `UPDATE` of the supplied columns plus `updated_at` for one id.
fn changed_columns(
    id: Uuid,
    changes: &TemplateChanges,
    image_urls: Option<Vec<String>>,
) -> UpdateMany<email_template::Entity> {
    let mut update = email_template::Entity::update_many()
        .col_expr(email_template::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(email_template::Column::Id.eq(id));

    if let Some(title) = &changes.title {
        update = update.col_expr(email_template::Column::Title, Expr::value(title.clone()));
    }
    if let Some(content) = &changes.content {
        update = update.col_expr(email_template::Column::Content, Expr::value(content.clone()));
    }
    if let Some(footer) = &changes.footer {
        update = update.col_expr(email_template::Column::Footer, Expr::value(footer.clone()));
    }
    if let Some(urls) = image_urls {
        update = update.col_expr(email_template::Column::ImageUrls, Expr::value(ImageUrls(urls)));
    }
    update
}

/// Ids are opaque to clients; anything that is not one of ours is simply absent.
fn parse_id(id: &str) -> Result<Uuid, TemplateError> {
    Uuid::parse_str(id).map_err(|_| TemplateError::NotFound(id.to_string()))
}

async fn find_template<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<email_template::Model, TemplateError> {
    email_template::Entity::find_by_id(parse_id(id)?)
        .one(db)
        .await?
        .ok_or_else(|| TemplateError::NotFound(id.to_string()))
}
