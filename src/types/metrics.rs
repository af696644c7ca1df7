//! Backend-reported dashboard metrics.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Totals reported by `GET /metrics`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Metrics {
    pub total_agents: u64,
    pub total_teams: u64,
    pub total_workflows: u64,
    pub total_executions: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_duration_ms: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
