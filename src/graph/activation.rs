//! Per-query activation over the knowledge graph.
//!
//! Activation is transient: every query recomputes it from the static
//! node weights and edge weights, and the result is returned as owned
//! snapshots rather than written back to the shared graph. Two signals
//! feed a node's score:
//!
//! 1. **Pattern boost**: every trigger phrase of the node that occurs
//!    in any question pattern adds `weight * pattern_boost`, so nodes
//!    hit through several phrases score higher than single-phrase hits.
//! 2. **Dependency influence**: each outgoing edge contributes
//!    `neighbor_weight * edge_weight * neighbor_boost`, one level deep,
//!    whether or not the neighbor itself matched.
//!
//! Scores are clamped to 1.0; nodes at or below `threshold` are
//! dropped. The survivors come back sorted by activation, strongest
//! first, with insertion order breaking ties.

use petgraph::Direction;
use petgraph::visit::EdgeRef;
use serde::Serialize;

use super::{KnowledgeGraph, NodeId, NodeKind};

/// Tuning constants for one activation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ActivationParams {
    pub pattern_boost: f32,
    pub neighbor_boost: f32,
    /// Nodes scoring at or below this are discarded.
    pub threshold: f32,
}

impl Default for ActivationParams {
    fn default() -> Self {
        Self {
            pattern_boost: 0.3,
            neighbor_boost: 0.2,
            threshold: 0.1,
        }
    }
}

/// Snapshot of one activated node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeActivation {
    pub id: NodeId,
    pub kind: NodeKind,
    pub weight: f32,
    pub activation: f32,
}

impl KnowledgeGraph {
    /// Compute activations for a set of question patterns.
    ///
    /// No patterns means nothing to activate: the result is empty for
    /// every graph, including ones whose dependency edges would
    /// otherwise push quiet nodes over the threshold.
    pub fn activate_nodes(
        &self,
        question_patterns: &[String],
        params: &ActivationParams,
    ) -> Vec<NodeActivation> {
        if question_patterns.is_empty() {
            return Vec::new();
        }

        let graph = self.graph.read().expect("graph lock poisoned");
        let mut activations: Vec<NodeActivation> = Vec::new();

        for idx in graph.node_indices() {
            let node = &graph[idx];
            let hits = node
                .patterns
                .iter()
                .filter(|trigger| question_patterns.iter().any(|q| q.contains(trigger.as_str())))
                .count();

            let mut score = hits as f32 * node.weight * params.pattern_boost;
            for edge in graph.edges_directed(idx, Direction::Outgoing) {
                let dep = &graph[edge.target()];
                score += dep.weight * edge.weight() * params.neighbor_boost;
            }
            let score = score.min(1.0);

            if score > params.threshold {
                activations.push(NodeActivation {
                    id: node.id.clone(),
                    kind: node.kind,
                    weight: node.weight,
                    activation: score,
                });
            }
        }

        // Stable sort keeps insertion order among equal scores.
        activations.sort_by(|a, b| {
            b.activation
                .partial_cmp(&a.activation)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        activations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;

    fn params() -> ActivationParams {
        ActivationParams::default()
    }

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| crate::text::normalize(s)).collect()
    }

    /// ml -> ai (0.9), ml -> math (0.6), ai standalone receiver.
    fn test_graph() -> KnowledgeGraph {
        let kg = KnowledgeGraph::new();
        kg.add_node(
            Node::new("ai", NodeKind::Topic, 0.9).with_patterns(["هوش مصنوعی"]),
        )
        .unwrap();
        kg.add_node(
            Node::new("ml", NodeKind::Topic, 0.8).with_patterns(["یادگیری ماشین"]),
        )
        .unwrap();
        kg.add_node(
            Node::new("math", NodeKind::Foundation, 0.7).with_patterns(["ریاضی"]),
        )
        .unwrap();
        kg.add_edge(&"ml".into(), &"ai".into(), 0.9).unwrap();
        kg.add_edge(&"ml".into(), &"math".into(), 0.6).unwrap();
        kg
    }

    #[test]
    fn empty_patterns_activate_nothing() {
        let kg = test_graph();
        assert!(kg.activate_nodes(&[], &params()).is_empty());
    }

    #[test]
    fn unmatched_node_still_collects_dependency_influence() {
        let kg = test_graph();
        let active = kg.activate_nodes(&patterns(&["آب و هوا"]), &params());
        // ml: 0.9*0.9*0.2 + 0.7*0.6*0.2 = 0.246 > threshold.
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id.as_str(), "ml");
    }

    #[test]
    fn pattern_match_boosts_by_weight_fraction() {
        let kg = test_graph();
        let active = kg.activate_nodes(&patterns(&["هوش مصنوعی چیست"]), &params());
        let ai = active.iter().find(|a| a.id.as_str() == "ai").unwrap();
        // No outgoing edges, so the score is exactly weight * 0.3.
        assert!((ai.activation - 0.9 * 0.3).abs() < 1e-6);
    }

    #[test]
    fn dependency_influence_is_one_level() {
        let kg = test_graph();
        let active = kg.activate_nodes(&patterns(&["یادگیری ماشین چیست"]), &params());
        let ml = active.iter().find(|a| a.id.as_str() == "ml").unwrap();
        let expected = 0.8 * 0.3 + 0.9 * 0.9 * 0.2 + 0.7 * 0.6 * 0.2;
        assert!((ml.activation - expected).abs() < 1e-6);
        // ai did not match and has no outgoing edges: absent.
        assert!(!active.iter().any(|a| a.id.as_str() == "ai"));
    }

    #[test]
    fn each_matching_trigger_adds_its_own_boost() {
        let kg = KnowledgeGraph::new();
        kg.add_node(
            Node::new("ml", NodeKind::Topic, 0.8)
                .with_patterns(["یادگیری ماشین", "یادگیری عمیق"]),
        )
        .unwrap();
        let active = kg.activate_nodes(
            &patterns(&["تفاوت یادگیری ماشین و یادگیری عمیق"]),
            &params(),
        );
        // Both triggers hit: 2 * 0.8 * 0.3.
        assert!((active[0].activation - 0.48).abs() < 1e-6);
    }

    #[test]
    fn activation_is_clamped_at_one() {
        let kg = KnowledgeGraph::new();
        kg.add_node(Node::new("hub", NodeKind::Topic, 1.0).with_patterns(["hub"]))
            .unwrap();
        for i in 0..5 {
            let id = format!("dep{i}");
            kg.add_node(Node::new(id.clone(), NodeKind::Topic, 1.0))
                .unwrap();
            kg.add_edge(&"hub".into(), &id.into(), 1.0).unwrap();
        }
        let active = kg.activate_nodes(&patterns(&["hub"]), &params());
        let hub = active.iter().find(|a| a.id.as_str() == "hub").unwrap();
        // Raw score 0.3 + 5 * 0.2 = 1.3, clamped.
        assert!((hub.activation - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn weak_matches_fall_below_threshold() {
        let kg = KnowledgeGraph::new();
        kg.add_node(Node::new("faint", NodeKind::Topic, 0.3).with_patterns(["کم"]))
            .unwrap();
        // 0.3 * 0.3 = 0.09 <= 0.1: discarded.
        assert!(kg.activate_nodes(&patterns(&["کم"]), &params()).is_empty());
    }

    #[test]
    fn sorted_descending_with_insertion_order_ties() {
        let kg = KnowledgeGraph::new();
        kg.add_node(Node::new("first", NodeKind::Topic, 0.8).with_patterns(["x"]))
            .unwrap();
        kg.add_node(Node::new("second", NodeKind::Topic, 0.8).with_patterns(["x"]))
            .unwrap();
        kg.add_node(Node::new("strong", NodeKind::Topic, 1.0).with_patterns(["x"]))
            .unwrap();
        let active = kg.activate_nodes(&patterns(&["x"]), &params());
        let ids: Vec<&str> = active.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["strong", "first", "second"]);
    }
}
