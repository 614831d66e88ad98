use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::JobError;
use crate::events::{JobEvent, ResultEvent};
use crate::progress::ProgressTracker;
use crate::request::GenerationRequest;
use crate::strategy::{ExecutionStrategy, StrategySession};

use super::normalize::{Normalizer, Step};
use super::state::{Job, JobOutcome, JobReport, JobState};

/// Room for a handful of progress frames ahead of a slow reader.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Clone)]
pub struct JobBridge {
    strategy: Arc<dyn ExecutionStrategy>,
    normalizer: Arc<Normalizer>,
}

enum Flow {
    Continue,
    Done,
}

impl JobBridge {
    pub fn new(strategy: Arc<dyn ExecutionStrategy>, normalizer: Normalizer) -> Self {
        Self {
            strategy,
            normalizer: Arc::new(normalizer),
        }
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Runs one job to completion.
    ///
    /// `events` receives zero or more progress events followed by exactly one
    /// result or error, unless the job is cancelled: then nothing more is
    /// sent. Dropping the receiving end counts as cancellation.
    pub async fn run(
        &self,
        job_id: impl Into<String>,
        request: GenerationRequest,
        events: mpsc::Sender<JobEvent>,
        cancel: CancellationToken,
    ) -> JobReport {
        let mut job = Job::new(job_id);
        tracing::info!(
            target: "maptoposter.bridge",
            job_id = %job.id(),
            strategy = self.strategy.name(),
            city = %request.city,
            country = %request.country,
            "job accepted"
        );

        if let Err(e) = request.validate() {
            self.terminate(&mut job, &events, &cancel, JobOutcome::Failed(e))
                .await;
            return self.finished(job);
        }

        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            _ = events.closed() => None,
            res = self.strategy.submit(&request) => Some(res),
        };
        let mut session = match submitted {
            None => {
                job.finish(JobOutcome::Cancelled);
                return self.finished(job);
            }
            Some(Err(e)) => {
                self.terminate(&mut job, &events, &cancel, JobOutcome::Failed(e))
                    .await;
                return self.finished(job);
            }
            Some(Ok(session)) => session,
        };
        job.transition(JobState::Running);

        let mut tracker = ProgressTracker::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                _ = events.closed() => None,
                signal = session.next_signal() => Some(signal),
            };

            let step = match next {
                None => {
                    session.cancel();
                    job.finish(JobOutcome::Cancelled);
                    break;
                }
                Some(None) => Step::Failed(JobError::worker(
                    "worker stopped without reporting a result",
                    None,
                )),
                Some(Some(Err(e))) => {
                    session.cancel();
                    Step::Failed(e)
                }
                Some(Some(Ok(signal))) => self.normalizer.step(signal),
            };

            match self
                .apply(&mut job, &mut tracker, session.as_mut(), step, &events, &cancel)
                .await
            {
                Flow::Continue => {}
                Flow::Done => break,
            }
        }

        self.finished(job)
    }

    async fn apply(
        &self,
        job: &mut Job,
        tracker: &mut ProgressTracker,
        session: &mut dyn StrategySession,
        step: Step,
        events: &mpsc::Sender<JobEvent>,
        cancel: &CancellationToken,
    ) -> Flow {
        match step {
            Step::Nothing => Flow::Continue,
            Step::Progress(p) => {
                let Some(p) = tracker.admit(p) else {
                    return Flow::Continue;
                };
                tracing::debug!(
                    target: "maptoposter.bridge",
                    job_id = %job.id(),
                    percent = p.percent,
                    label = %p.label,
                    "progress"
                );
                job.record_progress(p.clone());
                if deliver(events, cancel, JobEvent::Progress(p)).await {
                    Flow::Continue
                } else {
                    session.cancel();
                    job.finish(JobOutcome::Cancelled);
                    Flow::Done
                }
            }
            Step::Succeeded(files) if files.is_empty() => {
                self.terminate(job, events, cancel, JobOutcome::Failed(JobError::NoArtifacts))
                    .await;
                Flow::Done
            }
            Step::Succeeded(files) => {
                self.terminate(job, events, cancel, JobOutcome::Succeeded(files))
                    .await;
                Flow::Done
            }
            Step::Failed(e) => {
                self.terminate(job, events, cancel, JobOutcome::Failed(e))
                    .await;
                Flow::Done
            }
        }
    }

    /// Sends the terminal event, then records the outcome. A job whose
    /// caller cancelled or went away before the event got through ends as
    /// cancelled instead.
    async fn terminate(
        &self,
        job: &mut Job,
        events: &mpsc::Sender<JobEvent>,
        cancel: &CancellationToken,
        outcome: JobOutcome,
    ) {
        let event = match &outcome {
            JobOutcome::Succeeded(files) => JobEvent::Result(ResultEvent {
                files: files.clone(),
            }),
            JobOutcome::Failed(e) => JobEvent::Error(e.to_event()),
            JobOutcome::Cancelled => {
                job.finish(outcome);
                return;
            }
        };

        if events.is_closed() || !deliver(events, cancel, event).await {
            tracing::debug!(
                target: "maptoposter.bridge",
                job_id = %job.id(),
                "caller left before the terminal event"
            );
            job.finish(JobOutcome::Cancelled);
            return;
        }
        job.finish(outcome);
    }

    fn finished(&self, job: Job) -> JobReport {
        let report = job.report();
        match report.error() {
            Some(e) => tracing::warn!(
                target: "maptoposter.bridge",
                job_id = %report.id,
                strategy = self.strategy.name(),
                state = ?report.state,
                error_kind = e.kind(),
                error = %e,
                duration_ms = ?report.duration_ms(),
                "job finished"
            ),
            None => tracing::info!(
                target: "maptoposter.bridge",
                job_id = %report.id,
                strategy = self.strategy.name(),
                state = ?report.state,
                files = report.files().len(),
                duration_ms = ?report.duration_ms(),
                "job finished"
            ),
        }
        report
    }
}

/// `false` when the caller cancelled or went away.
async fn deliver(
    events: &mpsc::Sender<JobEvent>,
    cancel: &CancellationToken,
    event: JobEvent,
) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = events.send(event) => sent.is_ok(),
    }
}
