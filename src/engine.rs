//! Engine facade: top-level API for the porsa pipeline.
//!
//! The `Engine` owns the intent classifier, entity extractor, knowledge
//! graph, reasoner, and template table, and exposes the one entry point
//! external callers need: [`Engine::process_question`]. All per-query
//! state lives in the [`Evidence`] built for that call; the engine
//! itself is shared and read-mostly.

use std::sync::Arc;

use crate::entity::EntityExtractor;
use crate::error::{PorsaResult, QueryError};
use crate::evidence::Evidence;
use crate::export::{EdgeExport, GraphExport, NodeExport};
use crate::graph::{ActivationParams, KnowledgeGraph, NodeId};
use crate::history::{InteractionLog, InteractionRecord};
use crate::intent::IntentClassifier;
use crate::reason::{EvidenceWeights, ReasonEngine};
use crate::respond::{Answer, TemplateTable, build_answer};
use crate::seeds::{self, KnowledgePack};
use crate::text;

/// Configuration for the porsa engine.
///
/// The numeric defaults are the tuned values the bundled knowledge pack
/// was calibrated against; they are exposed so tests and deployments
/// can vary them without rebuilding.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum accepted question length, in characters.
    pub max_question_len: usize,
    /// Minimum token length kept by the tokenizer, in characters.
    pub min_token_len: usize,
    /// Reasoning step budget per question. Valid range: 3 to 5.
    pub max_reasoning_steps: usize,
    /// Interaction log capacity.
    pub history_capacity: usize,
    /// Confidence reported when an intent pattern matches.
    pub matched_intent_confidence: f32,
    /// Confidence reported for the general-inquiry fallback.
    pub fallback_intent_confidence: f32,
    /// Edge weight increment applied by [`Engine::record_outcome`].
    pub learning_delta: f32,
    /// Graph activation parameters.
    pub activation: ActivationParams,
    /// Evidence confidence weights.
    pub evidence: EvidenceWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_question_len: 500,
            min_token_len: 2,
            max_reasoning_steps: 3,
            history_capacity: 50,
            matched_intent_confidence: 0.9,
            fallback_intent_confidence: 0.3,
            learning_delta: 0.05,
            activation: ActivationParams::default(),
            evidence: EvidenceWeights::default(),
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> PorsaResult<()> {
        use crate::error::EngineError;

        if self.max_question_len == 0 {
            return Err(EngineError::InvalidConfig {
                message: "max_question_len must be > 0".into(),
            }
            .into());
        }
        if !(3..=5).contains(&self.max_reasoning_steps) {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "max_reasoning_steps must be between 3 and 5, got {}",
                    self.max_reasoning_steps
                ),
            }
            .into());
        }
        for (name, value) in [
            ("matched_intent_confidence", self.matched_intent_confidence),
            (
                "fallback_intent_confidence",
                self.fallback_intent_confidence,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig {
                    message: format!("{name} must be within [0.0, 1.0], got {value}"),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// The porsa question-answering engine.
///
/// Owns all pipeline stages: normalization and tokenization settings,
/// intent classification, entity extraction, graph activation, rule
/// reasoning, and response synthesis.
pub struct Engine {
    config: EngineConfig,
    classifier: IntentClassifier,
    extractor: EntityExtractor,
    graph: Arc<KnowledgeGraph>,
    reasoner: ReasonEngine,
    templates: TemplateTable,
    history: InteractionLog,
    pack_id: String,
    pack_version: String,
}

impl Engine {
    /// Create an engine from the bundled knowledge pack.
    pub fn new(config: EngineConfig) -> PorsaResult<Self> {
        let pack = seeds::bundled()?;
        Self::with_pack(config, pack)
    }

    /// Create an engine from an already-loaded knowledge pack.
    pub fn with_pack(config: EngineConfig, pack: KnowledgePack) -> PorsaResult<Self> {
        config.validate()?;

        let graph = Arc::new(KnowledgeGraph::new());
        for node in pack.nodes {
            graph.add_node(node)?;
        }
        for edge in &pack.edges {
            graph.add_edge(&edge.from, &edge.to, edge.weight)?;
        }

        let classifier = IntentClassifier::persian(
            config.matched_intent_confidence,
            config.fallback_intent_confidence,
        )?;
        let extractor = EntityExtractor::persian()?;
        let templates = TemplateTable::new(pack.templates)?;
        let reasoner = ReasonEngine::new(
            pack.rules,
            config.evidence.clone(),
            config.activation.clone(),
            Arc::clone(&graph),
            config.max_reasoning_steps,
        );

        tracing::info!(
            pack = %pack.id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            rules = reasoner.rule_count(),
            templates = templates.len(),
            "initializing porsa engine"
        );

        Ok(Self {
            history: InteractionLog::new(config.history_capacity),
            config,
            classifier,
            extractor,
            graph,
            reasoner,
            templates,
            pack_id: pack.id,
            pack_version: pack.version,
        })
    }

    /// Answer one question.
    ///
    /// Rejects empty and oversized input with a [`QueryError`]; any
    /// other question is guaranteed an [`Answer`], falling back to the
    /// general template when nothing matches.
    pub fn process_question(&self, question: &str) -> PorsaResult<Answer> {
        if question.trim().is_empty() {
            return Err(QueryError::Empty.into());
        }
        let length = question.chars().count();
        if length > self.config.max_question_len {
            return Err(QueryError::TooLong {
                length,
                max: self.config.max_question_len,
            }
            .into());
        }

        let normalized = text::normalize(question);
        let tokens = text::tokenize(&normalized, self.config.min_token_len);
        let intent = self.classifier.detect(&normalized);
        let entities = self.extractor.extract(&normalized);
        tracing::debug!(
            intent = %intent.intent,
            confidence = intent.confidence,
            tokens = tokens.len(),
            entities = entities.len(),
            "question classified"
        );

        let mut evidence = Evidence::new(question.to_owned(), normalized, tokens, intent, entities);
        let outcome = self.reasoner.run(&mut evidence);
        let answer = build_answer(&evidence, &outcome, &self.templates);
        tracing::debug!(
            state = %outcome.state,
            confidence = answer.confidence,
            domain = %answer.domain,
            "question answered"
        );

        self.history.record(InteractionRecord::new(
            question,
            evidence.intent.intent,
            answer.confidence,
            answer.domain.clone(),
        ));
        Ok(answer)
    }

    /// Reinforce the dependency edge from -> to by the configured
    /// learning delta. Returns whether an edge was updated.
    pub fn record_outcome(&self, from: &NodeId, to: &NodeId) -> bool {
        let updated = self
            .graph
            .strengthen_connection(from, to, self.config.learning_delta);
        if updated {
            tracing::debug!(%from, %to, delta = self.config.learning_delta, "edge reinforced");
        } else {
            tracing::debug!(%from, %to, "no such edge, reinforcement skipped");
        }
        updated
    }

    /// Get the knowledge graph handle.
    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    /// Get the interaction log handle.
    pub fn history(&self) -> &InteractionLog {
        &self.history
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get engine summary info (pack identity, table sizes).
    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            pack: self.pack_id.clone(),
            pack_version: self.pack_version.clone(),
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            rules: self.reasoner.rule_count(),
            templates: self.templates.len(),
            intents: self.classifier.rule_count(),
            intent_patterns: self.classifier.pattern_count(),
            entity_rules: self.extractor.rule_count(),
            max_reasoning_steps: self.config.max_reasoning_steps,
            history_len: self.history.len(),
        }
    }

    /// Snapshot the knowledge graph, including learned edge weights.
    pub fn export_graph(&self) -> GraphExport {
        GraphExport {
            pack: self.pack_id.clone(),
            pack_version: self.pack_version.clone(),
            nodes: self
                .graph
                .nodes()
                .into_iter()
                .map(|n| NodeExport {
                    id: n.id.to_string(),
                    kind: n.kind.label().to_owned(),
                    weight: n.weight,
                    patterns: n.patterns,
                })
                .collect(),
            edges: self
                .graph
                .edges()
                .into_iter()
                .map(|e| EdgeExport {
                    from: e.from.to_string(),
                    to: e.to.to_string(),
                    weight: e.weight,
                })
                .collect(),
        }
    }
}

/// Summary information about the engine state.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub pack: String,
    pub pack_version: String,
    pub nodes: usize,
    pub edges: usize,
    pub rules: usize,
    pub templates: usize,
    pub intents: usize,
    pub intent_patterns: usize,
    pub entity_rules: usize,
    pub max_reasoning_steps: usize,
    pub history_len: usize,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "porsa engine info")?;
        writeln!(f, "  pack:             {} v{}", self.pack, self.pack_version)?;
        writeln!(f, "  nodes:            {}", self.nodes)?;
        writeln!(f, "  edges:            {}", self.edges)?;
        writeln!(f, "  rules:            {}", self.rules)?;
        writeln!(f, "  templates:        {}", self.templates)?;
        writeln!(f, "  intents:          {}", self.intents)?;
        writeln!(f, "  intent patterns:  {}", self.intent_patterns)?;
        writeln!(f, "  entity rules:     {}", self.entity_rules)?;
        writeln!(f, "  reasoning steps:  {}", self.max_reasoning_steps)?;
        writeln!(f, "  history entries:  {}", self.history_len)?;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("pack", &self.pack_id)
            .field("config", &self.config)
            .field("graph", &self.graph)
            .finish()
    }
}
