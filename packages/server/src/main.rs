use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemImageStore;
use tracing::{Level, info};

use email_builder_server::config::AppConfig;
use email_builder_server::database::init_db;
use email_builder_server::repository::TemplateRepository;
use email_builder_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    let images = FilesystemImageStore::new(
        config.storage.uploads_dir.clone(),
        config.storage.max_image_size,
    )
    .await
    .context("Failed to initialize image storage")?;
    info!(dir = %config.storage.uploads_dir.display(), "Image storage ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;

    let state = AppState {
        templates: TemplateRepository::new(db),
        images: Arc::new(images),
        config,
    };
    let app = email_builder_server::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
