//! Response synthesis from a data-driven template table.
//!
//! Answer wording lives in the seed pack, not in code: each
//! [`ResponseTemplate`] is keyed by the action a rule produced or, for
//! fallbacks, by intent, and may require entities whose values fill
//! `{person}`-style slots. Adding a response is a data change. The only
//! template the table insists on is the general-inquiry fallback, which
//! keeps answer synthesis total.

use serde::Serialize;

use crate::entity::EntityKind;
use crate::error::{EngineError, PorsaResult};
use crate::evidence::Evidence;
use crate::intent::Intent;
use crate::reason::{ActionId, Inference, ReasoningOutcome};

/// How a template is selected: by rule action, or by intent when no
/// inference produced an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKey {
    Action(ActionId),
    Intent(Intent),
}

/// One answer form. `text` may reference a `{kind}` slot for each
/// entity kind listed in `requires`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseTemplate {
    pub key: TemplateKey,
    pub text: String,
    pub requires: Vec<EntityKind>,
}

impl ResponseTemplate {
    fn satisfied_by(&self, evidence: &Evidence) -> bool {
        self.requires.iter().all(|kind| evidence.has_entity(*kind))
    }
}

/// Ordered template table. Lookups scan in declaration order, so more
/// specific templates for the same key go first.
#[derive(Debug)]
pub struct TemplateTable {
    templates: Vec<ResponseTemplate>,
    /// Index of the general-inquiry fallback, validated at construction.
    general: usize,
}

impl TemplateTable {
    /// Build the table. Fails unless a slot-free general-inquiry
    /// fallback is present, since that template is what makes every
    /// accepted question answerable.
    pub fn new(templates: Vec<ResponseTemplate>) -> PorsaResult<Self> {
        let general = templates
            .iter()
            .position(|t| {
                t.key == TemplateKey::Intent(Intent::GeneralInquiry) && t.requires.is_empty()
            })
            .ok_or_else(|| EngineError::InvalidConfig {
                message: "template table needs a general_inquiry fallback with no required entities"
                    .to_owned(),
            })?;
        Ok(Self { templates, general })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn templates(&self) -> &[ResponseTemplate] {
        &self.templates
    }

    fn general(&self) -> &ResponseTemplate {
        &self.templates[self.general]
    }

    /// First template for this action whose requirements the evidence
    /// satisfies.
    fn for_action<'a>(
        &'a self,
        action: &ActionId,
        evidence: &Evidence,
    ) -> Option<&'a ResponseTemplate> {
        self.templates
            .iter()
            .filter(|t| matches!(&t.key, TemplateKey::Action(a) if a == action))
            .find(|t| t.satisfied_by(evidence))
    }

    /// First template for this intent whose requirements the evidence
    /// satisfies.
    fn for_intent<'a>(&'a self, intent: Intent, evidence: &Evidence) -> Option<&'a ResponseTemplate> {
        self.templates
            .iter()
            .filter(|t| t.key == TemplateKey::Intent(intent))
            .find(|t| t.satisfied_by(evidence))
    }
}

// ---------------------------------------------------------------------------
// Answer synthesis
// ---------------------------------------------------------------------------

/// The pipeline's terminal product.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub confidence: f32,
    /// Human-readable description of how the answer came to be.
    pub reasoning_path: Vec<String>,
    /// Strongest activated node id, or the intent label when the graph
    /// stayed quiet.
    pub domain: String,
}

/// Combine the two pipeline confidences into the answer confidence.
///
/// The answer confidence is the arithmetic mean of the intent
/// confidence and the reasoning confidence (the latest inference's
/// confidence, 0.0 when no rule fired). The mean is monotone in both
/// inputs: improving either stage never lowers the final score.
pub fn combine_confidence(intent_confidence: f32, reasoning_confidence: f32) -> f32 {
    ((intent_confidence + reasoning_confidence) / 2.0).clamp(0.0, 1.0)
}

/// Synthesize the final answer for one query.
///
/// Template selection: the highest-confidence inference's action first
/// (declaration order breaks ties), then the intent's own fallback,
/// then the guaranteed general fallback.
pub fn build_answer(
    evidence: &Evidence,
    outcome: &ReasoningOutcome,
    templates: &TemplateTable,
) -> Answer {
    let best = best_inference(&evidence.prior_inferences);

    let template = best
        .and_then(|inf| templates.for_action(&inf.action, evidence))
        .or_else(|| templates.for_intent(evidence.intent.intent, evidence))
        .unwrap_or_else(|| templates.general());

    let text = fill_slots(&template.text, evidence);
    let confidence = combine_confidence(evidence.intent.confidence, outcome.confidence);

    let domain = outcome
        .activation
        .first()
        .map(|a| a.id.to_string())
        .unwrap_or_else(|| evidence.intent.intent.label().to_owned());

    Answer {
        text,
        confidence,
        reasoning_path: reasoning_path(evidence, outcome),
        domain,
    }
}

/// Highest confidence wins; earlier inference wins ties.
fn best_inference(inferences: &[Inference]) -> Option<&Inference> {
    let mut best: Option<&Inference> = None;
    for inference in inferences {
        if best.is_none_or(|b| inference.confidence > b.confidence) {
            best = Some(inference);
        }
    }
    best
}

fn fill_slots(text: &str, evidence: &Evidence) -> String {
    let mut out = text.to_owned();
    for (kind, value) in &evidence.entities {
        out = out.replace(&format!("{{{}}}", kind.label()), value);
    }
    out
}

fn reasoning_path(evidence: &Evidence, outcome: &ReasoningOutcome) -> Vec<String> {
    let mut path = Vec::new();
    path.push(format!(
        "intent: {} (confidence {:.2})",
        evidence.intent.intent, evidence.intent.confidence
    ));
    if !evidence.entities.is_empty() {
        let entities: Vec<String> = evidence
            .entities
            .iter()
            .map(|(kind, value)| format!("{kind}={value}"))
            .collect();
        path.push(format!("entities: {}", entities.join(", ")));
    }
    if !outcome.activation.is_empty() {
        let nodes: Vec<String> = outcome
            .activation
            .iter()
            .map(|a| format!("{} ({:.2})", a.id, a.activation))
            .collect();
        path.push(format!("active nodes: {}", nodes.join(", ")));
    }
    path.extend(outcome.steps.iter().cloned());
    path
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
