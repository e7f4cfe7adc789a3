use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all imgroll endpoints.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let images = ServeDir::new(&state.image_dir);
    Router::new()
        .route("/health", get(handler::health_handler))
        .route("/", get(handler::random_image_handler))
        .route("/list", get(handler::list_handler))
        .nest_service("/images", images)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
