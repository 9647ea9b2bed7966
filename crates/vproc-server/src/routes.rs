//! API routes.

use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, process_video, ready};
use crate::state::AppState;

/// Create the service router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/process-video", post(process_video))
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready))
        // Notifications are small; cap the body to keep the endpoint cheap
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
