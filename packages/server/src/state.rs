use std::sync::Arc;

use common::storage::ImageStore;

use crate::config::AppConfig;
use crate::repository::TemplateRepository;

#[derive(Clone)]
pub struct AppState {
    pub templates: TemplateRepository,
    pub images: Arc<dyn ImageStore>,
    pub config: AppConfig,
}
