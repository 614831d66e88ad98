use serde::{Deserialize, Serialize};

/// Maps a known raw error substring to a message fit for the end user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRewrite {
    /// Case-insensitive substring of the raw message.
    pub contains: String,
    pub message: String,
}

impl ErrorRewrite {
    pub fn new(contains: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            contains: contains.into(),
            message: message.into(),
        }
    }
}

pub fn default_rewrites() -> Vec<ErrorRewrite> {
    vec![
        ErrorRewrite::new(
            "no data found for area",
            "No map data found for this area. Try a larger distance or a different city.",
        ),
        ErrorRewrite::new(
            "could not retrieve map data",
            "Could not retrieve map data. The map data service may be busy, please try again.",
        ),
        ErrorRewrite::new(
            "geocoding service unavailable",
            "The location service is unavailable right now. Please try again in a moment.",
        ),
        ErrorRewrite::new(
            "could not find coordinates",
            "Could not find this city. Check the city and country spelling.",
        ),
    ]
}

/// Ordered table; first match wins.
#[derive(Debug, Clone)]
pub struct ErrorRewriter {
    rules: Vec<(String, String)>,
}

impl Default for ErrorRewriter {
    fn default() -> Self {
        Self::new(default_rewrites())
    }
}

impl ErrorRewriter {
    pub fn new(rules: Vec<ErrorRewrite>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .filter(|r| !r.contains.is_empty())
                .map(|r| (r.contains.to_lowercase(), r.message))
                .collect(),
        }
    }

    pub fn lookup(&self, raw: &str) -> Option<&str> {
        let raw = raw.to_lowercase();
        self.rules
            .iter()
            .find(|(needle, _)| raw.contains(needle.as_str()))
            .map(|(_, msg)| msg.as_str())
    }

    /// The friendly message, or `raw` unchanged.
    pub fn rewrite(&self, raw: &str) -> String {
        self.lookup(raw)
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string())
    }
}
