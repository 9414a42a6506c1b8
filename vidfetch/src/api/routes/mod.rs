//! API route modules.
//!
//! Organizes routes by resource type.

pub mod analyze;
pub mod download;
pub mod files;
pub mod health;

use axum::Router;

use crate::api::server::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/analyze", analyze::router())
        .nest("/download", download::router())
        .nest("/file", files::router())
        .nest("/health", health::router())
        .with_state(state)
}
