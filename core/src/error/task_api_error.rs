// core/src/error/task_api_error.rs
use thiserror::Error;

/// Failures talking to the remote task queue.
#[derive(Debug, Clone, Error)]
pub enum TaskApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("request failed: {0}")]
    Request(String),

    /// The queue answered with a non-2xx status.
    #[error("task api error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The body could not be decoded into the expected document.
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl TaskApiError {
    /// Raw diagnostic text, used as error detail.
    pub fn detail(&self) -> String {
        match self {
            TaskApiError::Request(msg) | TaskApiError::Decode(msg) => msg.clone(),
            TaskApiError::Status { body, .. } => body.clone(),
        }
    }
}
