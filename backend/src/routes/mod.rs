//! Route definitions for the WashTrack API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Dashboard snapshot
        .route("/dashboard", get(handlers::get_dashboard))
        // Chemical catalog
        .route("/chemicals", get(handlers::list_chemicals))
        // Ledger writes
        .route("/pickups", post(handlers::record_pickup))
        .route("/updates", post(handlers::record_update))
        // Restock request workflow
        .nest("/requests", request_routes())
        // Activity log detail
        .route("/activity/:log_id", get(handlers::get_activity_detail))
}

/// Restock request routes
fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_request))
        .route("/open", get(handlers::get_open_request))
        .route("/:batch_id", get(handlers::get_request_batch))
        .route("/:batch_id/fulfill", post(handlers::fulfill_request))
}
