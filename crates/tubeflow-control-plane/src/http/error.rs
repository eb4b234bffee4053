//! API error type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use tubeflow_core::CoreError;

use super::responses::{ErrorBody, ErrorResponse};

/// API errors with HTTP status codes and a uniform JSON body.
#[derive(Debug)]
pub enum ApiError {
    /// Request body is not valid JSON for the endpoint.
    InvalidJson { message: String },
    /// Domain error.
    Core(CoreError),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::InvalidJson { message } => {
                (StatusCode::BAD_REQUEST, "invalid_json", message)
            }
            ApiError::Core(err) => {
                let status = match &err {
                    CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    CoreError::AlreadyRunning(_)
                    | CoreError::NotRunning(_)
                    | CoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
                    CoreError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
                    CoreError::ExecutorFailure(_) => StatusCode::BAD_GATEWAY,
                    CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code(), err.to_string())
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;
    use tubeflow_core::TaskId;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let (status, body) = render(CoreError::ExecutorFailure("invalid source".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "executor_failure");
        assert_eq!(body["error"]["message"], "Executor failure: invalid source");

        let (status, body) = render(CoreError::NotRunning(TaskId::new("analytics")).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "not_running");

        let (status, _) = render(CoreError::Internal("boom".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
