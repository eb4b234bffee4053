//! HTTP client for REST endpoints.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use tubeflow_core::{LogEntry, RunParams, RunRequest, TaskId};

use crate::error::ClientError;
use crate::types::{ErrorEnvelope, RunAccepted, Selection, TaskView};

/// HTTP client for the control plane REST API.
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Check if the control plane is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url);
        debug!(url = %url, "Checking health");

        let response = self.inner.get(&url).send().await?;
        Ok(response.status().is_success())
    }

    /// List all tasks.
    pub async fn list_tasks(&self) -> Result<Vec<TaskView>, ClientError> {
        self.get_json("/v1/tasks").await
    }

    /// Get a single task.
    pub async fn get_task(&self, task_id: &str) -> Result<TaskView, ClientError> {
        self.get_json(&format!("/v1/tasks/{}", task_id)).await
    }

    /// Start a run. Returns once the run is accepted.
    pub async fn run_task(
        &self,
        task_id: &str,
        params: RunParams,
    ) -> Result<RunAccepted, ClientError> {
        let request = RunRequest {
            task_id: TaskId::new(task_id),
            params,
        };
        self.post_json("/v1/runs", &request).await
    }

    /// Cancel the in-flight run of a task.
    pub async fn cancel_task(&self, task_id: &str) -> Result<(), ClientError> {
        let url = format!("{}/v1/tasks/{}/cancel", self.base_url, task_id);
        debug!(url = %url, "POST request");

        let response = self.inner.post(&url).send().await?;
        check(response).await?;
        Ok(())
    }

    /// Retained log entries, optionally only those after `since`.
    pub async fn logs(&self, since: Option<u64>) -> Result<Vec<LogEntry>, ClientError> {
        match since {
            Some(since) => self.get_json(&format!("/v1/logs?since={}", since)).await,
            None => self.get_json("/v1/logs").await,
        }
    }

    /// The last task a run was started for.
    pub async fn selection(&self) -> Result<Option<String>, ClientError> {
        let selection: Selection = self.get_json("/v1/selection").await?;
        Ok(selection.task_id)
    }

    /// Get JSON from an endpoint.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET request");

        let response = self.inner.get(&url).send().await?;
        decode(check(response).await?).await
    }

    /// Post JSON to an endpoint and decode the JSON answer.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST request");

        let response = self.inner.post(&url).json(body).send().await?;
        decode(check(response).await?).await
    }
}

/// Turn a non-2xx response into `ClientError::Api`.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) => ("http_error".to_string(), text),
    };

    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    response
        .json()
        .await
        .map_err(|e| ClientError::Serialization(e.to_string()))
}
