//! Workflow graph: an arena of nodes keyed by id plus an explicit edge list.
//!
//! Nodes never reference each other directly; connections name their
//! endpoints by [`NodeId`]. Removing a node removes its connections.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a node within a workflow.
///
/// Opaque to the client: ids loaded from the backend are kept as-is. Nodes
/// created locally get a fresh UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What a node does when the workflow runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    /// Entry point that starts a run.
    Trigger,
    Agent,
    Team,
    Tool,
    /// Branches on the previous node's output.
    Condition,
    Output,
    /// A node type this client does not know; the wire tag is kept.
    #[serde(untagged)]
    #[strum(default)]
    Other(String),
}

/// Canvas position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub position: Position,
    /// Kind-specific settings, e.g. the agent id of an agent node.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub config: serde_json::Value,
}

/// Directed edge from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
}

/// Structural error from a graph edit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("duplicate node {0}")]
    DuplicateNode(NodeId),
    #[error("node {0} cannot connect to itself")]
    SelfLoop(NodeId),
    #[error("connection {from} -> {to} already exists")]
    DuplicateConnection { from: NodeId, to: NodeId },
    #[error("graph contains a cycle")]
    Cycle,
}

/// Problem reported by [`WorkflowGraph::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphIssue {
    Empty,
    /// Nodes that lie on or downstream of a cycle, in insertion order.
    Cycle(Vec<NodeId>),
    /// A node with no connections in a graph of more than one node.
    Orphan(NodeId),
    /// A connection naming a node that does not exist.
    Dangling(Connection),
    SelfLoop(NodeId),
    DuplicateConnection(Connection),
}

impl fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("workflow has no nodes"),
            Self::Cycle(nodes) => write!(f, "workflow contains a cycle through {} node(s)", nodes.len()),
            Self::Orphan(id) => write!(f, "node {id} is not connected"),
            Self::Dangling(c) => write!(f, "connection {} -> {} names a missing node", c.source, c.target),
            Self::SelfLoop(id) => write!(f, "node {id} is connected to itself"),
            Self::DuplicateConnection(c) => {
                write!(f, "connection {} -> {} appears more than once", c.source, c.target)
            }
        }
    }
}

/// A workflow's nodes and connections.
///
/// Edits through [`WorkflowGraph::connect`] reject malformed edges, but a graph
/// loaded from the backend is taken as-is and its problems are reported by
/// [`WorkflowGraph::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "GraphWire", into = "GraphWire")]
pub struct WorkflowGraph {
    nodes: HashMap<NodeId, Node>,
    /// Insertion order, for stable iteration and serialization.
    order: Vec<NodeId>,
    edges: Vec<Connection>,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node with a fresh id.
    pub fn add_node(&mut self, kind: NodeKind, label: impl Into<String>, position: Position) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(
            id.clone(),
            Node {
                id: id.clone(),
                kind,
                label: label.into(),
                position,
                config: serde_json::Value::Null,
            },
        );
        self.order.push(id.clone());
        id
    }

    /// Insert a fully specified node, keeping its id.
    pub fn insert_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.order.push(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Remove a node and every connection touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        self.order.retain(|n| n != id);
        self.edges.retain(|c| &c.source != id && &c.target != id);
        Some(node)
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn connections(&self) -> &[Connection] {
        &self.edges
    }

    pub fn move_node(&mut self, id: &NodeId, position: Position) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))?;
        node.position = position;
        Ok(())
    }

    /// Connect two existing nodes. Cycles are allowed here and reported by
    /// [`WorkflowGraph::validate`], so an editor can pass through invalid states.
    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> Result<(), GraphError> {
        for id in [source, target] {
            if !self.nodes.contains_key(id) {
                return Err(GraphError::UnknownNode(id.clone()));
            }
        }
        if source == target {
            return Err(GraphError::SelfLoop(source.clone()));
        }
        let connection = Connection {
            source: source.clone(),
            target: target.clone(),
        };
        if self.edges.contains(&connection) {
            return Err(GraphError::DuplicateConnection {
                from: connection.source,
                to: connection.target,
            });
        }
        self.edges.push(connection);
        Ok(())
    }

    /// Remove a connection. Returns whether it existed.
    pub fn disconnect(&mut self, source: &NodeId, target: &NodeId) -> bool {
        let before = self.edges.len();
        self.edges
            .retain(|c| !(&c.source == source && &c.target == target));
        self.edges.len() != before
    }

    pub fn successors(&self, id: &NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|c| &c.source == id)
            .map(|c| c.target.clone())
            .collect()
    }

    pub fn predecessors(&self, id: &NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|c| &c.target == id)
            .map(|c| c.source.clone())
            .collect()
    }

    /// Topological order (Kahn's algorithm), ties broken by insertion order.
    /// Self-loops count as cycles; edges to missing nodes are skipped.
    pub fn topo_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let order = self.kahn();
        if order.len() == self.nodes.len() && !self.edges.iter().any(|c| c.source == c.target) {
            Ok(order)
        } else {
            Err(GraphError::Cycle)
        }
    }

    /// Every problem that should block saving the workflow.
    pub fn validate(&self) -> Vec<GraphIssue> {
        if self.nodes.is_empty() {
            return vec![GraphIssue::Empty];
        }

        let mut issues = Vec::new();

        let mut seen = HashSet::new();
        for c in &self.edges {
            if !self.nodes.contains_key(&c.source) || !self.nodes.contains_key(&c.target) {
                issues.push(GraphIssue::Dangling(c.clone()));
            } else if c.source == c.target {
                issues.push(GraphIssue::SelfLoop(c.source.clone()));
            } else if !seen.insert(c) {
                issues.push(GraphIssue::DuplicateConnection(c.clone()));
            }
        }

        let sorted: HashSet<NodeId> = self.kahn().into_iter().collect();
        if sorted.len() != self.nodes.len() {
            let stuck = self
                .order
                .iter()
                .filter(|id| !sorted.contains(*id))
                .cloned()
                .collect();
            issues.push(GraphIssue::Cycle(stuck));
        }

        if self.nodes.len() > 1 {
            let connected: HashSet<&NodeId> = self
                .edges
                .iter()
                .filter(|c| c.source != c.target)
                .filter(|c| self.nodes.contains_key(&c.source) && self.nodes.contains_key(&c.target))
                .flat_map(|c| [&c.source, &c.target])
                .collect();
            issues.extend(
                self.order
                    .iter()
                    .filter(|id| !connected.contains(id))
                    .map(|id| GraphIssue::Orphan(id.clone())),
            );
        }

        issues
    }

    /// Edges between two distinct existing nodes.
    fn sound_edges(&self) -> impl Iterator<Item = &Connection> {
        self.edges.iter().filter(|c| {
            c.source != c.target
                && self.nodes.contains_key(&c.source)
                && self.nodes.contains_key(&c.target)
        })
    }

    fn kahn(&self) -> Vec<NodeId> {
        let mut in_degree: HashMap<&NodeId, usize> = self.order.iter().map(|id| (id, 0)).collect();
        for c in self.sound_edges() {
            *in_degree.entry(&c.target).or_insert(0) += 1;
        }

        let mut queue: VecDeque<&NodeId> = self
            .order
            .iter()
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(u) = queue.pop_front() {
            order.push(u.clone());
            for c in self.sound_edges().filter(|c| &c.source == u) {
                if let Some(d) = in_degree.get_mut(&c.target) {
                    *d = d.saturating_sub(1);
                    if *d == 0 {
                        queue.push_back(&c.target);
                    }
                }
            }
        }
        order
    }
}

/// Wire shape used by the backend.
#[derive(Serialize, Deserialize)]
struct GraphWire {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    connections: Vec<Connection>,
}

impl From<GraphWire> for WorkflowGraph {
    fn from(wire: GraphWire) -> Self {
        let mut graph = WorkflowGraph::new();
        for node in wire.nodes {
            if let Err(e) = graph.insert_node(node) {
                tracing::warn!(error = %e, "Dropping repeated workflow node");
            }
        }
        graph.edges = wire.connections;
        graph
    }
}

impl From<WorkflowGraph> for GraphWire {
    fn from(mut graph: WorkflowGraph) -> Self {
        let nodes = graph
            .order
            .iter()
            .filter_map(|id| graph.nodes.remove(id))
            .collect();
        GraphWire {
            nodes,
            connections: graph.edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn chain() -> (WorkflowGraph, NodeId, NodeId, NodeId) {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_node(NodeKind::Trigger, "start", Position::new(0.0, 0.0));
        let b = graph.add_node(NodeKind::Agent, "writer", Position::new(200.0, 0.0));
        let c = graph.add_node(NodeKind::Output, "done", Position::new(400.0, 0.0));
        graph.connect(&a, &b).unwrap();
        graph.connect(&b, &c).unwrap();
        (graph, a, b, c)
    }

    #[test]
    fn chain_is_valid_and_ordered() {
        let (graph, a, b, c) = chain();
        assert!(graph.validate().is_empty());
        assert_eq!(graph.topo_order().unwrap(), vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(graph.successors(&a), vec![b.clone()]);
        assert_eq!(graph.predecessors(&c), vec![b]);
    }

    #[test]
    fn connect_rejects_bad_edges() {
        let (mut graph, a, b, _) = chain();
        assert_eq!(graph.connect(&a, &a), Err(GraphError::SelfLoop(a.clone())));
        assert_eq!(
            graph.connect(&a, &b),
            Err(GraphError::DuplicateConnection {
                from: a.clone(),
                to: b
            })
        );
        let ghost = NodeId::new();
        assert_eq!(graph.connect(&a, &ghost), Err(GraphError::UnknownNode(ghost)));
    }

    #[test]
    fn cycle_is_reported() {
        let (mut graph, a, b, c) = chain();
        graph.connect(&c, &b).unwrap();

        assert_eq!(graph.topo_order(), Err(GraphError::Cycle));
        assert_eq!(graph.validate(), vec![GraphIssue::Cycle(vec![b.clone(), c])]);
        assert_eq!(graph.successors(&a), vec![b]);
    }

    #[test]
    fn orphans_are_reported() {
        let (mut graph, _, _, _) = chain();
        let lonely = graph.add_node(NodeKind::Tool, "unused", Position::default());
        assert_eq!(graph.validate(), vec![GraphIssue::Orphan(lonely)]);
    }

    #[test]
    fn single_node_is_not_an_orphan_and_empty_graph_is_invalid() {
        let mut graph = WorkflowGraph::new();
        assert_eq!(graph.validate(), vec![GraphIssue::Empty]);
        graph.add_node(NodeKind::Agent, "solo", Position::default());
        assert!(graph.validate().is_empty());
    }

    #[test]
    fn removing_a_node_drops_its_connections() {
        let (mut graph, a, b, c) = chain();
        let removed = graph.remove_node(&b).unwrap();
        assert_eq!(removed.label, "writer");
        assert!(graph.connections().is_empty());
        assert_eq!(
            graph.validate(),
            vec![GraphIssue::Orphan(a), GraphIssue::Orphan(c)]
        );
        assert!(graph.remove_node(&b).is_none());
    }

    #[test]
    fn move_and_disconnect() {
        let (mut graph, a, b, _) = chain();
        graph.move_node(&a, Position::new(10.0, 20.0)).unwrap();
        assert_eq!(graph.node(&a).unwrap().position, Position::new(10.0, 20.0));
        assert!(graph.disconnect(&a, &b));
        assert!(!graph.disconnect(&a, &b));
        assert!(graph.move_node(&NodeId::new(), Position::default()).is_err());
    }

    #[test]
    fn wire_format_keeps_node_order() {
        let (graph, a, b, _) = chain();
        let value = serde_json::to_value(&graph).unwrap();
        assert_eq!(value["nodes"][0]["id"], json!(a.to_string()));
        assert_eq!(value["nodes"][0]["type"], json!("trigger"));
        assert_eq!(value["connections"][0], json!({"source": a.to_string(), "target": b.to_string()}));

        let back: WorkflowGraph = serde_json::from_value(value).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn backend_ids_and_unknown_node_types_load() {
        let value = json!({
            "nodes": [
                {"id": "node-1", "type": "webhook", "label": "hook"},
                {"id": "node-2", "type": "agent"},
            ],
            "connections": [{"source": "node-1", "target": "node-2"}],
        });
        let graph: WorkflowGraph = serde_json::from_value(value.clone()).unwrap();

        let hook = graph.node(&NodeId::from("node-1")).unwrap();
        assert_eq!(hook.kind, NodeKind::Other("webhook".into()));
        assert_eq!(hook.kind.to_string(), "webhook");
        assert!(graph.validate().is_empty());
        assert_eq!(
            graph.topo_order().unwrap(),
            vec![NodeId::from("node-1"), NodeId::from("node-2")]
        );

        let back = serde_json::to_value(&graph).unwrap();
        assert_eq!(back["nodes"][0]["id"], json!("node-1"));
        assert_eq!(back["nodes"][0]["type"], json!("webhook"));
        assert_eq!(back["connections"], value["connections"]);
    }

    #[test]
    fn malformed_edges_load_and_are_reported() {
        let value = json!({
            "nodes": [
                {"id": "a", "type": "trigger"},
                {"id": "b", "type": "agent"},
                {"id": "a", "type": "output"},
            ],
            "connections": [
                {"source": "a", "target": "b"},
                {"source": "a", "target": "b"},
                {"source": "b", "target": "b"},
                {"source": "b", "target": "ghost"},
            ],
        });
        let graph: WorkflowGraph = serde_json::from_value(value).unwrap();
        let (a, b) = (NodeId::from("a"), NodeId::from("b"));

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.node(&a).unwrap().kind, NodeKind::Trigger);
        assert_eq!(graph.connections().len(), 4);
        assert_eq!(
            graph.validate(),
            vec![
                GraphIssue::DuplicateConnection(Connection {
                    source: a.clone(),
                    target: b.clone()
                }),
                GraphIssue::SelfLoop(b.clone()),
                GraphIssue::Dangling(Connection {
                    source: b,
                    target: NodeId::from("ghost")
                }),
            ]
        );
        assert_eq!(graph.topo_order(), Err(GraphError::Cycle));
    }
}
