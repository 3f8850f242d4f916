//! Bounded multi-step reasoning loop.
//!
//! The engine itself is stateless across queries: rule table, weights,
//! and graph handle are shared, while the step counter, state machine,
//! and accumulated inferences live in locals and on the per-query
//! [`Evidence`]. Each fired rule extends the evidence, and the graph is
//! re-activated with the extended patterns before the next step, which
//! is what allows one inference to enable another.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::evidence::Evidence;
use crate::graph::{ActivationParams, KnowledgeGraph, NodeActivation};

use super::{EvidenceWeights, Inference, ReasoningState, Rule, evidence_confidence};

/// Outcome of one reasoning run.
///
/// By the time this value exists the state machine has passed through
/// `Terminal`; `state` records the decisive state it passed on the way,
/// [`ReasoningState::Inferred`] when at least the final step fired a
/// rule, [`ReasoningState::NoMatch`] when the last evaluation found
/// nothing.
#[derive(Debug, Clone)]
pub struct ReasoningOutcome {
    pub state: ReasoningState,
    /// Running confidence: the latest inference's confidence, 0.0 when
    /// no rule fired at all.
    pub confidence: f32,
    /// Evidence support score used for every firing this run.
    pub evidence_confidence: f32,
    /// Human-readable description of each step taken.
    pub steps: Vec<String>,
    /// Node activations as of the final step, for downstream domain
    /// attribution.
    pub activation: Vec<NodeActivation>,
}

/// Stateless reasoning engine; per-query state stays on the stack and
/// in the evidence passed to [`ReasonEngine::run`].
pub struct ReasonEngine {
    rules: Vec<Rule>,
    weights: EvidenceWeights,
    activation: ActivationParams,
    graph: Arc<KnowledgeGraph>,
    max_steps: usize,
}

fn advance(from: ReasoningState, to: ReasoningState) -> ReasoningState {
    debug_assert!(
        from.can_advance_to(to),
        "illegal reasoning transition {from:?} -> {to:?}"
    );
    to
}

impl ReasonEngine {
    pub fn new(
        rules: Vec<Rule>,
        weights: EvidenceWeights,
        activation: ActivationParams,
        graph: Arc<KnowledgeGraph>,
        max_steps: usize,
    ) -> Self {
        Self {
            rules,
            weights,
            activation,
            graph,
            max_steps,
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run up to `max_steps` reasoning steps over the evidence.
    ///
    /// Each step selects, among the rules whose conditions all hold and
    /// which have not fired during this run, the one with the highest
    /// evidence-scaled confidence; declaration order breaks ties. The winner's
    /// inference is appended to the evidence and the graph activation
    /// is recomputed, then the loop continues until no rule matches or
    /// the step budget runs out.
    pub fn run(&self, evidence: &mut Evidence) -> ReasoningOutcome {
        let evidence_conf = evidence_confidence(evidence, &self.weights);
        let mut active = self
            .graph
            .activate_nodes(&evidence.question_patterns(), &self.activation);
        trace!(
            evidence_confidence = evidence_conf,
            active = active.len(),
            "reasoning start"
        );

        let mut state = ReasoningState::Idle;
        let mut decisive = ReasoningState::NoMatch;
        let mut confidence = 0.0f32;
        let mut steps: Vec<String> = Vec::new();
        let mut steps_taken = 0usize;

        while steps_taken < self.max_steps {
            state = advance(state, ReasoningState::Evaluating);
            steps_taken += 1;

            match self.evaluate_step(evidence, &active, evidence_conf) {
                Some(inference) => {
                    state = advance(state, ReasoningState::Inferred);
                    decisive = ReasoningState::Inferred;
                    confidence = inference.confidence;
                    debug!(
                        rule = %inference.rule_id,
                        action = %inference.action,
                        confidence = inference.confidence,
                        step = steps_taken,
                        "rule fired"
                    );
                    steps.push(format!(
                        "step {steps_taken}: rule {} fired, action {} (confidence {:.3})",
                        inference.rule_id, inference.action, inference.confidence
                    ));
                    evidence.push_inference(inference);
                    active = self
                        .graph
                        .activate_nodes(&evidence.question_patterns(), &self.activation);
                }
                None => {
                    state = advance(state, ReasoningState::NoMatch);
                    decisive = if evidence.prior_inferences.is_empty() {
                        ReasoningState::NoMatch
                    } else {
                        // Earlier steps fired; the run as a whole inferred.
                        ReasoningState::Inferred
                    };
                    steps.push(format!("step {steps_taken}: no rule matched"));
                    break;
                }
            }
        }

        let _ = advance(state, ReasoningState::Terminal);
        ReasoningOutcome {
            state: decisive,
            confidence,
            evidence_confidence: evidence_conf,
            steps,
            activation: active,
        }
    }

    /// One evaluation pass: best non-fired matching rule, if any.
    fn evaluate_step(
        &self,
        evidence: &Evidence,
        active: &[NodeActivation],
        evidence_conf: f32,
    ) -> Option<Inference> {
        let mut best: Option<(&Rule, f32)> = None;
        for rule in &self.rules {
            if evidence.rule_fired(&rule.id) || !rule.matches(evidence, active) {
                continue;
            }
            let scaled = (rule.base_confidence * evidence_conf).clamp(0.0, 1.0);
            // Strict comparison keeps the earlier declaration on ties.
            if best.is_none_or(|(_, b)| scaled > b) {
                best = Some((rule, scaled));
            }
        }
        best.map(|(rule, scaled)| Inference {
            rule_id: rule.id.clone(),
            action: rule.action.clone(),
            confidence: scaled,
        })
    }
}

impl std::fmt::Debug for ReasonEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasonEngine")
            .field("rules", &self.rules.len())
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
