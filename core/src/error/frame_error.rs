// core/src/error/frame_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame has no event line")]
    MissingEvent,

    #[error("frame has no data line")]
    MissingData,

    #[error("unknown event type: {0}")]
    UnknownEvent(String),

    #[error("invalid json payload for '{event}'")]
    InvalidJson {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}
