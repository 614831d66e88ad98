use serde::Deserialize;

use crate::events::ProgressEvent;
use crate::remote::TaskStatus;
use crate::runner::{ExitOutcome, LineTap};

/// Unnormalized output of a strategy session.
#[derive(Debug, Clone)]
pub enum RawSignal {
    /// Progress the strategy itself knows about.
    Checkpoint(ProgressEvent),
    Line(LineTap),
    Exited(ExitOutcome),
    Status(TaskStatus),
    Inline(InlineResponse),
}

/// Reply of a synchronous render call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InlineResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl InlineResponse {
    /// Last path segment of `file_url`, e.g. `paris_noir.png` for
    /// `/posters/paris_noir.png`.
    pub fn file_name(&self) -> Option<String> {
        let url = self.file_url.as_deref()?.trim();
        let name = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        (!name.is_empty()).then(|| name.to_string())
    }
}
