//! Pulls the structured result out of free-form worker output.

use serde::Deserialize;

use crate::error::ExtractError;

pub const DEFAULT_MARKER: &str = "@@POSTER_RESULT@@";

#[derive(Debug, Clone)]
pub struct ResultExtractor {
    marker: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    List(Vec<String>),
    Object { files: Vec<String> },
}

impl Default for ResultExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl ResultExtractor {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Parses whatever follows the last marker occurrence.
    ///
    /// An empty list is returned as-is; deciding that zero artifacts is a
    /// failure belongs to the caller.
    pub fn extract(&self, text: &str) -> Result<Vec<String>, ExtractError> {
        let idx = text
            .rfind(self.marker.as_str())
            .ok_or(ExtractError::MarkerNotFound)?;
        let payload = text[idx + self.marker.len()..].trim();

        if payload.is_empty() {
            return Err(ExtractError::MalformedResult {
                reason: "nothing follows the result marker".into(),
                payload: String::new(),
            });
        }

        match serde_json::from_str::<Payload>(payload) {
            Ok(Payload::List(files)) | Ok(Payload::Object { files }) => Ok(files),
            Err(e) => Err(ExtractError::MalformedResult {
                reason: format!("expected a JSON list of file names: {e}"),
                payload: payload.to_string(),
            }),
        }
    }
}
