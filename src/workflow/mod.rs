//! Visual workflow editing model.

pub mod graph;

pub use graph::{
    Connection, GraphError, GraphIssue, Node, NodeId, NodeKind, Position, WorkflowGraph,
};

use crate::error::DeckError;

/// Turn validation issues into a single [`DeckError::Validation`].
pub fn ensure_valid(graph: &WorkflowGraph) -> Result<(), DeckError> {
    let issues = graph.validate();
    if issues.is_empty() {
        return Ok(());
    }
    let message = issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(DeckError::validation("graph", message))
}
