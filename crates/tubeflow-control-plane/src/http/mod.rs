//! HTTP server for the control plane.
//!
//! Provides endpoints for:
//! - Starting runs (`/v1/runs`) and cancelling them (`/v1/tasks/:id/cancel`)
//! - Task status (`/v1/tasks`, `/v1/tasks/:id`, live: `/v1/tasks/stream`)
//! - Activity log (`/v1/logs`, live: `/v1/logs/stream`)
//! - Dashboard (`/ui`)
//! - Health check (`/health`)
//! - Prometheus metrics (`/metrics`)

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod error;
mod handlers;
pub mod responses;

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer for browser dashboards
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Run routes
        .route("/v1/runs", post(handlers::create_run))
        .route("/v1/tasks/:task_id/cancel", post(handlers::cancel_run))
        // Status routes
        .route("/v1/tasks", get(handlers::list_tasks))
        .route("/v1/tasks/stream", get(handlers::stream_status))
        .route("/v1/tasks/:task_id", get(handlers::get_task))
        .route("/v1/selection", get(handlers::get_selection))
        // Log routes
        .route("/v1/logs", get(handlers::list_logs))
        .route("/v1/logs/stream", get(handlers::stream_logs))
        // UI routes
        .route("/ui", get(handlers::dashboard))
        // Observability routes
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
