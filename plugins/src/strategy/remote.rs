use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use maptoposter_core::api::{
    ExecutionStrategy, GenerationRequest, JobError, RawSignal, RemotePoller, RemoteTask,
    StrategySession, TaskApi,
};

/// Submits to a render queue and polls the job's status document.
pub struct RemoteStrategy {
    poller: RemotePoller,
}

impl RemoteStrategy {
    pub fn new(api: Arc<dyn TaskApi>, poll_interval: Duration, max_poll_attempts: u32) -> Self {
        Self {
            poller: RemotePoller::new(api, poll_interval, max_poll_attempts),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for RemoteStrategy {
    fn name(&self) -> &str {
        "remote"
    }

    async fn submit(
        &self,
        request: &GenerationRequest,
    ) -> Result<Box<dyn StrategySession>, JobError> {
        let task = self.poller.submit(request).await?;
        Ok(Box::new(RemoteSession {
            task,
            finished: false,
        }))
    }
}

struct RemoteSession {
    task: RemoteTask,
    finished: bool,
}

#[async_trait]
impl StrategySession for RemoteSession {
    async fn next_signal(&mut self) -> Option<Result<RawSignal, JobError>> {
        if self.finished {
            return None;
        }
        match self.task.next_status().await {
            Ok(doc) => {
                self.finished = doc.status.is_terminal();
                Some(Ok(RawSignal::Status(doc)))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }

    fn cancel(&mut self) {
        self.finished = true;
        self.task.cancel();
    }
}
