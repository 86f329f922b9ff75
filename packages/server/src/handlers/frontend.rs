use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Uri, header};
use axum::response::Response;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Fallback for routes no handler matched.
///
/// Serves the built frontend when `frontend.dist_dir` is configured: the
/// requested file if it exists, otherwise `index.html` so client-side routes
/// resolve. API and upload paths never fall back.
#[instrument(skip(state))]
pub async fn serve_frontend(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, AppError> {
    let path = uri.path();
    let Some(dist_dir) = state.config.frontend.dist_dir.as_deref() else {
        return Err(AppError::NotFound("Route not found".into()));
    };
    if method != Method::GET || is_backend_path(path) {
        return Err(AppError::NotFound("Route not found".into()));
    }

    let file = match resolve_asset(dist_dir, path) {
        Some(candidate) if tokio::fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) => {
            candidate
        }
        _ => dist_dir.join("index.html"),
    };

    let content = match tokio::fs::read(&file).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("Route not found".into()));
        }
        Err(e) => return Err(AppError::Internal(format!("IO error: {e}"))),
    };
    let mime = mime_guess::from_path(&file).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .body(Body::from(content))
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn is_backend_path(path: &str) -> bool {
    ["/api", "/uploads"]
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{prefix}/")))
}

/// Map a request path onto the dist directory, refusing anything that would
/// step outside it.
fn resolve_asset(dist_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative.as_os_str().is_empty() {
        return None;
    }
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(dist_dir.join(relative))
}
