use serde::{Deserialize, Serialize};

/// Coarse progress checkpoint. `label` travels as `text` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub percent: u8,
    #[serde(rename = "text")]
    pub label: String,
}

impl ProgressEvent {
    pub fn new(percent: u8, label: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEvent {
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Caller-facing event. `Result` and `Error` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Progress(ProgressEvent),
    Result(ResultEvent),
    Error(ErrorEvent),
}

impl JobEvent {
    pub const PROGRESS: &'static str = "progress";
    pub const RESULT: &'static str = "result";
    pub const ERROR: &'static str = "error";

    pub fn name(&self) -> &'static str {
        match self {
            JobEvent::Progress(_) => Self::PROGRESS,
            JobEvent::Result(_) => Self::RESULT,
            JobEvent::Error(_) => Self::ERROR,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Progress(_))
    }
}
