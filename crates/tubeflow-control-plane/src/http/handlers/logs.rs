//! Activity log handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::stream::{Stream, StreamExt};

use tubeflow_core::LogEntry;

use crate::http::responses::{LogQuery, SelectionResponse};
use crate::state::AppState;

/// Retained log entries, optionally only those after `since`.
///
/// GET /v1/logs
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogQuery>,
) -> Json<Vec<LogEntry>> {
    let entries = match query.since {
        Some(since) => state.log.since(since).await,
        None => state.log.snapshot().await,
    };
    Json(entries)
}

/// Live log entries as server-sent events.
///
/// GET /v1/logs/stream
pub async fn stream_logs(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = state.log.subscribe().map(|entry| {
        Event::default()
            .event("log")
            .id(entry.sequence.to_string())
            .json_data(entry)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// The last task a run was started for.
///
/// GET /v1/selection
pub async fn get_selection(State(state): State<Arc<AppState>>) -> Json<SelectionResponse> {
    let selected = state.runner.selected().await;
    Json(SelectionResponse {
        task_id: selected.map(|id| id.into_inner()),
    })
}
