use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

use crate::error::{JobError, TaskApiError};
use crate::request::GenerationRequest;

use super::api::TaskApi;
use super::types::TaskStatus;

/// Submits jobs to a [`TaskApi`] and hands out fixed-interval pollers.
#[derive(Clone)]
pub struct RemotePoller {
    api: Arc<dyn TaskApi>,
    interval: Duration,
    max_attempts: u32,
}

impl RemotePoller {
    pub fn new(api: Arc<dyn TaskApi>, interval: Duration, max_attempts: u32) -> Self {
        Self {
            api,
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn submit(&self, request: &GenerationRequest) -> Result<RemoteTask, JobError> {
        let task_id = self
            .api
            .submit(request)
            .await
            .map_err(|e| submission_error(&e))?;

        tracing::info!(target: "maptoposter.poller", task_id = %task_id, "job submitted");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(RemoteTask {
            api: self.api.clone(),
            task_id,
            ticker,
            attempts: 0,
            max_attempts: self.max_attempts,
        })
    }
}

/// Fixed message per failure class; the queue's own text only goes to detail.
fn submission_error(e: &TaskApiError) -> JobError {
    tracing::warn!(target: "maptoposter.poller", error = %e, "submission failed");
    let message = match e {
        TaskApiError::Status { status, .. } => {
            format!("The render queue refused the job (HTTP {status})")
        }
        TaskApiError::Request(_) => "Could not reach the render queue".to_string(),
        TaskApiError::Decode(_) => "The render queue sent an unreadable reply".to_string(),
    };
    JobError::Submission {
        message,
        detail: Some(e.detail()).filter(|d| !d.trim().is_empty()),
    }
}

/// Handle on one submitted remote job.
pub struct RemoteTask {
    api: Arc<dyn TaskApi>,
    task_id: String,
    ticker: Interval,
    attempts: u32,
    max_attempts: u32,
}

impl RemoteTask {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Waits for the next tick and returns the first status document that
    /// could be fetched. Fetch failures are logged and retried on the
    /// following tick; every tick counts against the budget.
    pub async fn next_status(&mut self) -> Result<TaskStatus, JobError> {
        loop {
            if self.attempts >= self.max_attempts {
                tracing::warn!(
                    target: "maptoposter.poller",
                    task_id = %self.task_id,
                    attempts = self.attempts,
                    "poll budget exhausted"
                );
                return Err(JobError::PollTimeout {
                    attempts: self.attempts,
                });
            }

            self.ticker.tick().await;
            self.attempts += 1;

            match self.api.status(&self.task_id).await {
                Ok(doc) => {
                    tracing::debug!(
                        target: "maptoposter.poller",
                        task_id = %self.task_id,
                        attempt = self.attempts,
                        state = ?doc.status,
                        "status polled"
                    );
                    return Ok(doc);
                }
                Err(e) => {
                    tracing::warn!(
                        target: "maptoposter.poller",
                        task_id = %self.task_id,
                        attempt = self.attempts,
                        error = %e,
                        "status poll failed, retrying"
                    );
                }
            }
        }
    }

    /// Best-effort revoke on a detached task; never blocks the caller.
    pub fn cancel(&self) {
        let api = self.api.clone();
        let task_id = self.task_id.clone();
        tokio::spawn(async move {
            match api.cancel(&task_id).await {
                Ok(()) => {
                    tracing::info!(target: "maptoposter.poller", task_id = %task_id, "remote job revoked")
                }
                Err(e) => tracing::debug!(
                    target: "maptoposter.poller",
                    task_id = %task_id,
                    error = %e,
                    "remote revoke failed"
                ),
            }
        });
    }
}
