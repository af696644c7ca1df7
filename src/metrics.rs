//! Execution statistics derived client-side from an execution list.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::types::{Execution, ExecutionStatus};

/// Aggregates over a set of executions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    /// Completed over finished (completed, failed, cancelled). `None` when
    /// nothing has finished yet.
    pub success_rate: Option<f64>,
    /// Mean duration of finished executions with both timestamps.
    pub mean_duration: Option<Duration>,
    pub by_agent: BTreeMap<String, usize>,
    pub by_workflow: BTreeMap<String, usize>,
}

impl ExecutionStats {
    pub fn from_executions(executions: &[Execution]) -> Self {
        let mut stats = Self {
            total: executions.len(),
            ..Self::default()
        };

        let mut finished = 0usize;
        let mut completed = 0usize;
        let mut durations = Vec::new();

        for execution in executions {
            *stats
                .by_status
                .entry(execution.status.to_string())
                .or_default() += 1;

            if let Some(ref agent_id) = execution.agent_id {
                *stats.by_agent.entry(agent_id.clone()).or_default() += 1;
            }
            if let Some(ref workflow_id) = execution.workflow_id {
                *stats.by_workflow.entry(workflow_id.clone()).or_default() += 1;
            }

            if execution.status.is_finished() {
                finished += 1;
                if execution.status == ExecutionStatus::Completed {
                    completed += 1;
                }
                if let Some(duration) = execution.duration() {
                    durations.push(duration);
                }
            }
        }

        if finished > 0 {
            stats.success_rate = Some(completed as f64 / finished as f64);
        }
        if !durations.is_empty() {
            let sum: Duration = durations.iter().sum();
            stats.mean_duration = Some(sum / durations.len() as u32);
        }
        stats
    }

    pub fn count(&self, status: ExecutionStatus) -> usize {
        self.by_status
            .get(&status.to_string())
            .copied()
            .unwrap_or(0)
    }
}
