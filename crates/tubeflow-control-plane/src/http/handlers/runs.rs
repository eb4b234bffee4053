//! Run and cancel handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use tubeflow_core::{RunRequest, TaskId, TaskStatus};

use crate::http::error::ApiError;
use crate::http::responses::RunAcceptedResponse;
use crate::state::AppState;

/// Start a task run. Responds once the run is initiated, not when it settles.
///
/// POST /v1/runs
pub async fn create_run(
    State(state): State<Arc<AppState>>,
    json_result: Result<Json<RunRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RunAcceptedResponse>), ApiError> {
    let Json(req) = json_result.map_err(|rejection| {
        warn!(error = %rejection, "Invalid JSON in run request");
        ApiError::InvalidJson {
            message: rejection.body_text(),
        }
    })?;

    info!(task_id = %req.task_id, "Received run request");

    // The handle is dropped: the run settles in the background.
    let handle = state
        .runner
        .run(&req.task_id, req.params)
        .await
        .map_err(|e| {
            warn!(task_id = %req.task_id, error = %e, "Run rejected");
            e
        })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(RunAcceptedResponse {
            task_id: handle.task_id.as_str().to_string(),
            run_id: handle.run_id.as_str().to_string(),
            status: TaskStatus::Running,
        }),
    ))
}

/// Cancel the in-flight run of a task.
///
/// POST /v1/tasks/:task_id/cancel
pub async fn cancel_run(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let task_id = TaskId::new(task_id);
    state.runner.cancel(&task_id).await?;
    Ok(StatusCode::ACCEPTED)
}
