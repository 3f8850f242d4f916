//! Weighted knowledge graph over domain concepts.
//!
//! Nodes are domain concepts (topics, skills, people) carrying a base
//! weight and the trigger phrases that connect them to question text.
//! Directed edges carry a dependency weight. The graph is read-mostly:
//! queries take per-query [`activation::NodeActivation`] snapshots and
//! the only mutation after load is [`KnowledgeGraph::strengthen_connection`].

pub mod activation;

pub use activation::{ActivationParams, NodeActivation};

use std::sync::RwLock;

use dashmap::DashMap;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::text;

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Stable, human-readable node identifier (kebab-case in seed packs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of concept categories in the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    StrategyDomain,
    Foundation,
    Skill,
    Topic,
    Person,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::StrategyDomain => "strategy_domain",
            NodeKind::Foundation => "foundation",
            NodeKind::Skill => "skill",
            NodeKind::Topic => "topic",
            NodeKind::Person => "person",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A concept node: identity, category, base weight, trigger phrases.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Intrinsic importance in [0.0, 1.0].
    pub weight: f32,
    /// Normalized phrases whose presence in a question activates the node.
    pub patterns: Vec<String>,
}

impl Node {
    /// Create a node with no trigger phrases. Weight is clamped to [0, 1].
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, weight: f32) -> Self {
        Self {
            id: id.into(),
            kind,
            weight: weight.clamp(0.0, 1.0),
            patterns: Vec::new(),
        }
    }

    /// Attach trigger phrases. Phrases are normalized so they compare
    /// cleanly against normalized question text.
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.patterns = patterns
            .into_iter()
            .map(|p| text::normalize(p.as_ref()))
            .collect();
        self
    }
}

/// Directed edge snapshot used by exports and tests.
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f32,
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Dual-indexed concept graph: petgraph for structure and traversal,
/// DashMap for O(1) id lookups.
pub struct KnowledgeGraph {
    /// Directed graph: node payloads are [`Node`], edge payloads are weights.
    graph: RwLock<DiGraph<Node, f32>>,
    /// NodeId -> NodeIndex mapping.
    node_index: DashMap<NodeId, NodeIndex>,
}

impl KnowledgeGraph {
    /// Create a new empty knowledge graph.
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(DiGraph::new()),
            node_index: DashMap::new(),
        }
    }

    /// Insert a node. Ids must be unique.
    pub fn add_node(&self, node: Node) -> GraphResult<()> {
        if self.node_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode {
                id: node.id.to_string(),
            });
        }
        let mut graph = self.graph.write().expect("graph lock poisoned");
        // Double-check after acquiring the write lock.
        if self.node_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode {
                id: node.id.to_string(),
            });
        }
        let id = node.id.clone();
        let idx = graph.add_node(node);
        self.node_index.insert(id, idx);
        Ok(())
    }

    /// Insert a directed dependency edge. Both endpoints must exist;
    /// referencing an undeclared node is a load-time error, not a
    /// silently created stub.
    pub fn add_edge(&self, from: &NodeId, to: &NodeId, weight: f32) -> GraphResult<()> {
        let from_idx = self.index_of(from)?;
        let to_idx = self.index_of(to)?;
        let mut graph = self.graph.write().expect("graph lock poisoned");
        graph.add_edge(from_idx, to_idx, weight.clamp(0.0, 1.0));
        Ok(())
    }

    fn index_of(&self, id: &NodeId) -> GraphResult<NodeIndex> {
        self.node_index
            .get(id)
            .map(|e| *e.value())
            .ok_or_else(|| GraphError::UnknownNode { id: id.to_string() })
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    /// Current weight of the edge from -> to, if one exists.
    pub fn edge_weight(&self, from: &NodeId, to: &NodeId) -> Option<f32> {
        let from_idx = *self.node_index.get(from)?.value();
        let to_idx = *self.node_index.get(to)?.value();
        let graph = self.graph.read().expect("graph lock poisoned");
        graph
            .find_edge(from_idx, to_idx)
            .and_then(|e| graph.edge_weight(e))
            .copied()
    }

    /// Reinforce the edge from -> to by `delta`, saturating at 1.0.
    /// Returns whether an edge was updated; unknown endpoints or a
    /// missing edge leave the graph untouched.
    pub fn strengthen_connection(&self, from: &NodeId, to: &NodeId, delta: f32) -> bool {
        let (from_idx, to_idx) = match (self.node_index.get(from), self.node_index.get(to)) {
            (Some(f), Some(t)) => (*f.value(), *t.value()),
            _ => return false,
        };
        let mut graph = self.graph.write().expect("graph lock poisoned");
        match graph.find_edge(from_idx, to_idx) {
            Some(edge) => {
                if let Some(weight) = graph.edge_weight_mut(edge) {
                    *weight = (*weight + delta).min(1.0);
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.read().expect("graph lock poisoned").edge_count()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> Vec<Node> {
        let graph = self.graph.read().expect("graph lock poisoned");
        graph
            .node_indices()
            .map(|idx| graph[idx].clone())
            .collect()
    }

    /// All edges with resolved endpoint ids.
    pub fn edges(&self) -> Vec<Edge> {
        let graph = self.graph.read().expect("graph lock poisoned");
        graph
            .edge_references()
            .map(|e| Edge {
                from: graph[e.source()].id.clone(),
                to: graph[e.target()].id.clone(),
                weight: *e.weight(),
            })
            .collect()
    }

    /// Outgoing dependencies of a node: (neighbor id, neighbor weight,
    /// edge weight). Empty for unknown nodes.
    pub fn dependencies_of(&self, id: &NodeId) -> Vec<(NodeId, f32, f32)> {
        let idx = match self.node_index.get(id) {
            Some(e) => *e.value(),
            None => return Vec::new(),
        };
        let graph = self.graph.read().expect("graph lock poisoned");
        graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| {
                let dep = &graph[e.target()];
                (dep.id.clone(), dep.weight, *e.weight())
            })
            .collect()
    }
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KnowledgeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeGraph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}
