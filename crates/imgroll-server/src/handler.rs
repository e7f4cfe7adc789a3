use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::response::{Json, Response};
use imgroll_catalog::{CancelToken, CatalogEntry, CatalogResult, ImageRepository};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::{ServerError, ServerResult};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn ImageRepository>,
    pub image_dir: PathBuf,
    /// Cancelled when the server starts shutting down.
    pub cancel: CancelToken,
}

/// Body of `GET /list`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageList {
    pub total: usize,
    pub images: Vec<CatalogEntry>,
}

impl From<Vec<CatalogEntry>> for ImageList {
    fn from(images: Vec<CatalogEntry>) -> Self {
        Self {
            total: images.len(),
            images,
        }
    }
}

/// Health check handler.
pub async fn health_handler() -> &'static str {
    "OK"
}

/// Catalog listing handler.
pub async fn list_handler(State(state): State<AppState>) -> ServerResult<Json<ImageList>> {
    let images = with_repository(&state, |repo, cancel| repo.get_all(cancel)).await?;
    Ok(Json(ImageList::from(images)))
}

/// Serves one randomly chosen image with caching disabled.
pub async fn random_image_handler(
    State(state): State<AppState>,
    request: Request,
) -> ServerResult<Response> {
    let entry = with_repository(&state, |repo, cancel| repo.get_random(cancel)).await?;

    let full = state.image_dir.join(entry.to_path());
    if let Err(err) = tokio::fs::metadata(&full).await {
        if err.kind() == std::io::ErrorKind::NotFound {
            tracing::debug!(image = %entry, "picked image vanished from disk");
            return Err(ServerError::ImageMissing(entry.to_string()));
        }
    }

    let response = match ServeFile::new(&full).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let mut response = response.map(Body::new);
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    Ok(response)
}

/// Run a repository call on the blocking pool; a rescan walks the disk.
async fn with_repository<T, F>(state: &AppState, f: F) -> ServerResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn ImageRepository, &CancelToken) -> CatalogResult<T> + Send + 'static,
{
    let repo = Arc::clone(&state.repo);
    let cancel = state.cancel.clone();
    let result = tokio::task::spawn_blocking(move || f(repo.as_ref(), &cancel))
        .await
        .map_err(|e| ServerError::Internal(format!("catalog task failed: {e}")))?;
    Ok(result?)
}

