use async_trait::async_trait;

use crate::error::TaskApiError;
use crate::request::GenerationRequest;

use super::types::TaskStatus;

/// Remote render queue.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Enqueue a job and return its handle.
    async fn submit(&self, request: &GenerationRequest) -> Result<String, TaskApiError>;

    async fn status(&self, task_id: &str) -> Result<TaskStatus, TaskApiError>;

    /// Ask the queue to drop a job. Queues without revocation may 404.
    async fn cancel(&self, task_id: &str) -> Result<(), TaskApiError>;
}
