//! Task status handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::stream::{Stream, StreamExt};

use tubeflow_core::TaskId;

use crate::http::error::ApiError;
use crate::http::responses::TaskResponse;
use crate::state::AppState;

/// List all tasks with their status.
///
/// GET /v1/tasks
pub async fn list_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<TaskResponse>> {
    let tasks = state.registry.list().await;
    Json(tasks.iter().map(TaskResponse::from_domain).collect())
}

/// Get a single task.
///
/// GET /v1/tasks/:task_id
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state.registry.get(&TaskId::new(task_id)).await?;
    Ok(Json(TaskResponse::from_domain(&task)))
}

/// Live status changes as server-sent events.
///
/// GET /v1/tasks/stream
pub async fn stream_status(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = state
        .registry
        .subscribe()
        .map(|change| Event::default().event("status").json_data(change));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
