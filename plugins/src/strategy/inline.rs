use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;

use maptoposter_core::api::{
    ExecutionStrategy, GenerationRequest, JobError, ProgressEvent, RawSignal, StrategySession,
    TaskApiError,
};

use crate::client::InlineRenderer;

const SENDING: (u8, &str) = (10, "Sending request to the renderer...");
const DONE: (u8, &str) = (100, "Generation complete!");

/// One blocking call to the renderer; the only progress is synthetic.
pub struct InlineStrategy {
    renderer: Arc<InlineRenderer>,
}

impl InlineStrategy {
    pub fn new(renderer: InlineRenderer) -> Self {
        Self {
            renderer: Arc::new(renderer),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for InlineStrategy {
    fn name(&self) -> &str {
        "inline"
    }

    async fn submit(
        &self,
        request: &GenerationRequest,
    ) -> Result<Box<dyn StrategySession>, JobError> {
        Ok(Box::new(InlineSession {
            renderer: self.renderer.clone(),
            request: request.clone(),
            queued: VecDeque::from([RawSignal::Checkpoint(ProgressEvent::new(
                SENDING.0, SENDING.1,
            ))]),
            called: false,
        }))
    }
}

struct InlineSession {
    renderer: Arc<InlineRenderer>,
    request: GenerationRequest,
    queued: VecDeque<RawSignal>,
    called: bool,
}

#[async_trait]
impl StrategySession for InlineSession {
    async fn next_signal(&mut self) -> Option<Result<RawSignal, JobError>> {
        if let Some(signal) = self.queued.pop_front() {
            return Some(Ok(signal));
        }
        if self.called {
            return None;
        }

        let reply = self.renderer.render(&self.request).await;
        self.called = true;
        match reply {
            Ok(resp) => {
                if resp.success {
                    self.queued.push_back(RawSignal::Inline(resp));
                    Some(Ok(RawSignal::Checkpoint(ProgressEvent::new(DONE.0, DONE.1))))
                } else {
                    Some(Ok(RawSignal::Inline(resp)))
                }
            }
            Err(e) => Some(Err(renderer_error(e))),
        }
    }

    fn cancel(&mut self) {
        // The in-flight request is aborted when the bridge drops our future.
        self.queued.clear();
        self.called = true;
    }
}

fn renderer_error(e: TaskApiError) -> JobError {
    match e {
        TaskApiError::Status { status, body } => JobError::worker(
            format!("The renderer answered with HTTP {status}"),
            Some(body),
        ),
        TaskApiError::Request(msg) => JobError::worker(
            "Could not reach the renderer",
            Some(msg),
        ),
        TaskApiError::Decode(msg) => JobError::worker(
            "The renderer sent an unreadable reply",
            Some(msg),
        ),
    }
}
