//! Workflows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DeckError;
use crate::workflow::{ensure_valid, WorkflowGraph};

use super::validation::{require_non_blank, Validate};

/// A saved workflow. The graph is inlined as `nodes` and `connections`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub graph: WorkflowGraph,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Backend fields this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewWorkflow {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub graph: WorkflowGraph,
}

impl Validate for NewWorkflow {
    fn validate(&self) -> Result<(), DeckError> {
        require_non_blank("name", &self.name)?;
        ensure_valid(&self.graph)
    }
}

/// Workflows are saved whole: an update replaces name, description and graph.
pub type WorkflowUpdate = NewWorkflow;
