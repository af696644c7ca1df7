//! Executions of agents and workflows.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Execution lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    #[serde(alias = "canceled")]
    Cancelled,
    /// A status this client does not know, such as `queued`. Never finished.
    #[serde(untagged)]
    #[strum(default)]
    Other(String),
}

impl ExecutionStatus {
    /// Whether the execution has stopped for good.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Execution {
    pub id: String,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Execution {
    /// Wall-clock duration, when both timestamps are known and ordered.
    pub fn duration(&self) -> Option<Duration> {
        let (start, end) = (self.started_at?, self.finished_at?);
        (end - start).to_std().ok()
    }
}

/// Body of a non-streaming workflow run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecuteWorkflow {
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duration_from_timestamps() {
        let execution: Execution = serde_json::from_value(json!({
            "id": "e-1",
            "status": "completed",
            "started_at": "2026-01-01T00:00:00Z",
            "finished_at": "2026-01-01T00:00:02.500Z",
        }))
        .unwrap();
        assert_eq!(execution.duration(), Some(Duration::from_millis(2500)));
        assert!(execution.status.is_finished());
    }

    #[test]
    fn running_execution_has_no_duration() {
        let execution: Execution = serde_json::from_value(json!({
            "id": "e-2",
            "status": "running",
            "started_at": "2026-01-01T00:00:00Z",
        }))
        .unwrap();
        assert_eq!(execution.duration(), None);
        assert!(!execution.status.is_finished());
    }

    #[test]
    fn status_accepts_american_spelling() {
        let status: ExecutionStatus = serde_json::from_value(json!("canceled")).unwrap();
        assert_eq!(status, ExecutionStatus::Cancelled);
        assert_eq!(status.to_string(), "cancelled");
    }

    #[test]
    fn unknown_status_is_kept() {
        let execution: Execution = serde_json::from_value(json!({
            "id": "e-3",
            "status": "queued",
        }))
        .unwrap();
        assert_eq!(execution.status, ExecutionStatus::Other("queued".into()));
        assert!(!execution.status.is_finished());
        assert_eq!(execution.status.to_string(), "queued");
        assert_eq!(serde_json::to_value(&execution).unwrap()["status"], json!("queued"));
    }
}
