use serde::{Deserialize, Serialize};

use crate::events::ProgressEvent;

/// One row of the trigger table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRule {
    /// Case-insensitive substring.
    pub trigger: String,
    pub percent: u8,
    pub label: String,
}

impl ProgressRule {
    pub fn new(trigger: impl Into<String>, percent: u8, label: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            percent,
            label: label.into(),
        }
    }
}

/// Phases the poster worker prints, in the order it prints them.
pub fn default_rules() -> Vec<ProgressRule> {
    vec![
        ProgressRule::new("looking up coordinates", 10, "Resolving location..."),
        ProgressRule::new("geocod", 10, "Resolving location..."),
        ProgressRule::new("coordinates", 10, "Resolving location..."),
        ProgressRule::new("fetching", 30, "Fetching map data..."),
        ProgressRule::new("downloading", 30, "Fetching map data..."),
        ProgressRule::new("rendering", 60, "Rendering map..."),
        ProgressRule::new("applying theme", 60, "Rendering map..."),
        ProgressRule::new("saving", 90, "Saving file..."),
    ]
}

/// Ordered, first-match-wins keyword table.
#[derive(Debug, Clone)]
pub struct ProgressClassifier {
    rules: Vec<(String, ProgressRule)>,
}

impl Default for ProgressClassifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl ProgressClassifier {
    pub fn new(rules: Vec<ProgressRule>) -> Self {
        let rules = rules
            .into_iter()
            .filter(|r| !r.trigger.is_empty())
            .map(|r| (r.trigger.to_lowercase(), r))
            .collect();
        Self { rules }
    }

    pub fn classify(&self, line: &str) -> Option<ProgressEvent> {
        let line = line.to_lowercase();
        self.rules
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, rule)| ProgressEvent::new(rule.percent, rule.label.clone()))
    }
}
