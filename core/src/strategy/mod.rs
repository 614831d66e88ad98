//! The seam between the bridge and a concrete way of running the worker.

mod signal;

pub use signal::{InlineResponse, RawSignal};

use async_trait::async_trait;

use crate::error::JobError;
use crate::request::GenerationRequest;

/// One way of getting a poster rendered.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Start the work. Failing here means nothing was started.
    async fn submit(
        &self,
        request: &GenerationRequest,
    ) -> Result<Box<dyn StrategySession>, JobError>;
}

/// A started job, pulled one raw signal at a time.
#[async_trait]
pub trait StrategySession: Send {
    /// `None` once the session has nothing more to say. Must be safe to drop
    /// mid-await: the bridge abandons it when the job is cancelled.
    async fn next_signal(&mut self) -> Option<Result<RawSignal, JobError>>;

    /// Stop the backend work. Fire-and-forget.
    fn cancel(&mut self);
}
