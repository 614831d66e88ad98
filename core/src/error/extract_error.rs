// core/src/error/extract_error.rs
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("result marker not found in worker output")]
    MarkerNotFound,

    #[error("result payload after marker is not valid: {reason}")]
    MalformedResult { reason: String, payload: String },
}
