use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::JobError;
use crate::events::ProgressEvent;

/// Server-issued job id.
pub fn new_job_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Submitting,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Cancelled
        )
    }

    fn can_move_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Submitting, Running)
                | (Submitting, Failed)
                | (Submitting, Cancelled)
                | (Running, Succeeded)
                | (Running, Failed)
                | (Running, Cancelled)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded(Vec<String>),
    Failed(JobError),
    Cancelled,
}

/// Bookkeeping for one job, owned by the task running it.
#[derive(Debug)]
pub struct Job {
    id: String,
    state: JobState,
    progress: Option<ProgressEvent>,
    outcome: Option<JobOutcome>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: JobState::Submitting,
            progress: None,
            outcome: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Rejects (and logs) anything the state machine does not allow;
    /// terminal states never change.
    pub fn transition(&mut self, next: JobState) -> bool {
        if !self.state.can_move_to(next) {
            tracing::warn!(
                target: "maptoposter.bridge",
                job_id = %self.id,
                from = ?self.state,
                to = ?next,
                "illegal job state transition ignored"
            );
            return false;
        }
        self.state = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        true
    }

    pub fn record_progress(&mut self, progress: ProgressEvent) {
        self.progress = Some(progress);
    }

    /// Moves to the terminal state matching `outcome`; ignored when the job
    /// already finished.
    pub fn finish(&mut self, outcome: JobOutcome) -> bool {
        let next = match &outcome {
            JobOutcome::Succeeded(_) => JobState::Succeeded,
            JobOutcome::Failed(_) => JobState::Failed,
            JobOutcome::Cancelled => JobState::Cancelled,
        };
        if !self.transition(next) {
            return false;
        }
        self.outcome = Some(outcome);
        true
    }

    pub fn report(&self) -> JobReport {
        JobReport {
            id: self.id.clone(),
            state: self.state,
            progress: self.progress.clone(),
            outcome: self.outcome.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Snapshot returned when a job's run ends.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub id: String,
    pub state: JobState,
    pub progress: Option<ProgressEvent>,
    pub outcome: Option<JobOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobReport {
    pub fn files(&self) -> &[String] {
        match &self.outcome {
            Some(JobOutcome::Succeeded(files)) => files,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&JobError> {
        match &self.outcome {
            Some(JobOutcome::Failed(e)) => Some(e),
            _ => None,
        }
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_absorbing() {
        let mut job = Job::new("j1");
        assert!(job.transition(JobState::Running));
        assert!(job.finish(JobOutcome::Cancelled));
        assert!(!job.finish(JobOutcome::Succeeded(vec!["late.png".into()])));
        assert!(!job.transition(JobState::Running));

        let report = job.report();
        assert_eq!(report.state, JobState::Cancelled);
        assert_eq!(report.outcome, Some(JobOutcome::Cancelled));
        assert!(report.files().is_empty());
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn cannot_succeed_before_running() {
        let mut job = Job::new("j2");
        assert!(!job.finish(JobOutcome::Succeeded(vec!["a.png".into()])));
        assert_eq!(job.state(), JobState::Submitting);
        assert!(job.finish(JobOutcome::Failed(JobError::NoArtifacts)));
        assert_eq!(job.report().error(), Some(&JobError::NoArtifacts));
    }
}
