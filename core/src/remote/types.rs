use serde::{Deserialize, Serialize};

use crate::events::ProgressEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Progress,
    Success,
    Failure,
    /// `STARTED`, `RETRY` and anything else the queue invents.
    #[serde(other)]
    Unknown,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmitResponse {
    #[serde(alias = "taskId")]
    pub task_id: String,
}

/// Status document returned by `GET {tasks_path}/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskStatus {
    pub status: TaskState,
    #[serde(default)]
    pub progress: Option<TaskProgress>,
    #[serde(default)]
    pub result: Option<TaskResult>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskProgress {
    #[serde(default)]
    pub current: f64,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TaskProgress {
    pub fn percent(&self) -> u8 {
        let pct = match self.total {
            Some(total) if total > 0.0 && total != 100.0 => self.current * 100.0 / total,
            _ => self.current,
        };
        if pct.is_finite() {
            pct.clamp(0.0, 100.0).round() as u8
        } else {
            0
        }
    }

    pub fn to_event(&self) -> ProgressEvent {
        ProgressEvent::new(self.percent(), self.status.clone().unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskResult {
    /// `files` when the worker lists several, `file_url` otherwise.
    pub fn artifacts(&self) -> Vec<String> {
        if !self.files.is_empty() {
            return self.files.clone();
        }
        self.file_url
            .iter()
            .filter(|u| !u.trim().is_empty())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unknown_states_deserialize() {
        let doc: TaskStatus = serde_json::from_value(json!({"status": "STARTED"})).unwrap();
        assert_eq!(doc.status, TaskState::Unknown);
        assert!(!doc.status.is_terminal());
    }

    #[test]
    fn percent_scales_by_total() {
        let p = |current: f64, total: Option<f64>| TaskProgress {
            current,
            total,
            status: None,
        };
        assert_eq!(p(50.0, None).percent(), 50);
        assert_eq!(p(50.0, Some(100.0)).percent(), 50);
        assert_eq!(p(3.0, Some(4.0)).percent(), 75);
        assert_eq!(p(250.0, None).percent(), 100);
        assert_eq!(p(-5.0, Some(10.0)).percent(), 0);
    }

    #[test]
    fn success_document_artifacts() {
        let doc: TaskStatus = serde_json::from_value(json!({
            "task_id": "t1",
            "status": "SUCCESS",
            "result": {"success": true, "file_url": "/posters/paris.png", "cached": false},
            "error": null,
            "progress": {"current": 100, "total": 100, "status": "Completed"}
        }))
        .unwrap();
        assert_eq!(
            doc.result.unwrap().artifacts(),
            vec!["/posters/paris.png".to_string()]
        );
    }
}
