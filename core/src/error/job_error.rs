// core/src/error/job_error.rs
use thiserror::Error;

use crate::events::ErrorEvent;

/// Terminal failure of one generation job.
///
/// Transient poll failures never appear here: the poller swallows and
/// retries them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// Bad input; the job never started.
    #[error("{0}")]
    Validation(String),

    /// The worker process could not be started.
    #[error("{message}")]
    Spawn {
        message: String,
        detail: Option<String>,
    },

    /// The remote queue or renderer refused the job.
    #[error("{message}")]
    Submission {
        message: String,
        detail: Option<String>,
    },

    /// Non-zero exit, remote FAILURE, or an inline renderer error.
    #[error("{message}")]
    WorkerExecution {
        message: String,
        detail: Option<String>,
    },

    /// A result was announced but could not be used.
    #[error("worker produced an unusable result: {reason}")]
    MalformedResult {
        reason: String,
        detail: Option<String>,
    },

    #[error("no artifacts produced")]
    NoArtifacts,

    #[error("gave up waiting for the renderer after {attempts} status checks")]
    PollTimeout { attempts: u32 },

    #[error("job cancelled")]
    Cancelled,
}

impl JobError {
    /// Stable machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Validation(_) => "validation",
            JobError::Spawn { .. } => "spawn",
            JobError::Submission { .. } => "submission",
            JobError::WorkerExecution { .. } => "worker_execution",
            JobError::MalformedResult { .. } => "malformed_result",
            JobError::NoArtifacts => "no_artifacts",
            JobError::PollTimeout { .. } => "poll_timeout",
            JobError::Cancelled => "cancelled",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            JobError::Spawn { detail, .. }
            | JobError::Submission { detail, .. }
            | JobError::WorkerExecution { detail, .. }
            | JobError::MalformedResult { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn worker(message: impl Into<String>, detail: Option<String>) -> Self {
        JobError::WorkerExecution {
            message: message.into(),
            detail: detail.filter(|d| !d.trim().is_empty()),
        }
    }

    pub fn to_event(&self) -> ErrorEvent {
        ErrorEvent {
            message: self.to_string(),
            detail: self.detail().map(str::to_string),
        }
    }
}
