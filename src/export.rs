//! Export types for serializing engine state.
//!
//! These types provide stable, human-readable representations of the
//! knowledge graph suitable for JSON export. Edge weights reflect any
//! learning applied since load.

use serde::{Deserialize, Serialize};

/// Exported concept node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExport {
    /// Stable node id.
    pub id: String,
    /// Node kind label (topic, skill, foundation, strategy_domain, person).
    pub kind: String,
    /// Intrinsic weight in [0.0, 1.0].
    pub weight: f32,
    /// Normalized trigger phrases.
    pub patterns: Vec<String>,
}

/// Exported dependency edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeExport {
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
    /// Current edge weight, including learned reinforcement.
    pub weight: f32,
}

/// Full knowledge-graph snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    /// Id of the seed pack the graph was built from.
    pub pack: String,
    /// Seed pack version.
    pub pack_version: String,
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
}
