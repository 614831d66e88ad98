//! reqwest clients for the HTTP side of the renderer: the task queue used by
//! the remote strategy and the synchronous endpoint used by the inline one.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use maptoposter_core::api::{
    GenerationRequest, InlineResponse, SubmitResponse, TaskApi, TaskApiError, TaskStatus,
};

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

fn build_client(timeout_ms: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()?)
}

fn request_error(e: reqwest::Error) -> TaskApiError {
    TaskApiError::Request(e.to_string())
}

/// Non-2xx becomes [`TaskApiError::Status`] carrying the body.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, TaskApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(TaskApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TaskApiError> {
    let response = ensure_success(response).await?;
    let body = response.text().await.map_err(request_error)?;
    serde_json::from_str(&body).map_err(|e| TaskApiError::Decode(format!("{e}: {body}")))
}

/// Client for a Celery-style render queue.
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: String,
    submit_path: String,
    tasks_path: String,
}

impl HttpTaskApi {
    pub fn new(
        base_url: impl Into<String>,
        submit_path: impl Into<String>,
        tasks_path: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout_ms)?,
            base_url: base_url.into(),
            submit_path: submit_path.into(),
            tasks_path: tasks_path.into(),
        })
    }

    fn task_url(&self, task_id: &str) -> String {
        format!(
            "{}/{}",
            join_url(&self.base_url, &self.tasks_path),
            task_id
        )
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn submit(&self, request: &GenerationRequest) -> Result<String, TaskApiError> {
        let response = self
            .client
            .post(join_url(&self.base_url, &self.submit_path))
            .json(&request.worker_payload())
            .send()
            .await
            .map_err(request_error)?;
        let submitted: SubmitResponse = parse_response(response).await?;
        if submitted.task_id.trim().is_empty() {
            return Err(TaskApiError::Decode("empty task_id in submit response".into()));
        }
        Ok(submitted.task_id)
    }

    async fn status(&self, task_id: &str) -> Result<TaskStatus, TaskApiError> {
        let response = self
            .client
            .get(self.task_url(task_id))
            .send()
            .await
            .map_err(request_error)?;
        parse_response(response).await
    }

    async fn cancel(&self, task_id: &str) -> Result<(), TaskApiError> {
        let response = self
            .client
            .delete(self.task_url(task_id))
            .send()
            .await
            .map_err(request_error)?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// Client for the one-shot render endpoint.
pub struct InlineRenderer {
    client: reqwest::Client,
    url: String,
}

impl InlineRenderer {
    pub fn new(base_url: &str, path: &str, timeout_ms: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout_ms)?,
            url: join_url(base_url, path),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn render(&self, request: &GenerationRequest) -> Result<InlineResponse, TaskApiError> {
        let response = self
            .client
            .post(&self.url)
            .json(&request.worker_payload())
            .send()
            .await
            .map_err(request_error)?;
        parse_response(response).await
    }
}
