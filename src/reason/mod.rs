//! Rule-based reasoning over query evidence.
//!
//! A [`Rule`] pairs a conjunction of [`Condition`]s with an action to
//! take when they all hold. Conditions form a closed vocabulary: every
//! predicate the rule author can express is a variant here, checked at
//! load time, rather than a free-form string resolved at runtime. The
//! step loop itself lives in [`engine`].

pub mod engine;

pub use engine::{ReasonEngine, ReasoningOutcome};

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::evidence::Evidence;
use crate::graph::{NodeActivation, NodeId};
use crate::intent::Intent;
use crate::text;

/// Identifier of a response-construction strategy. Rules produce one;
/// the response layer resolves it against the template table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionId {
    fn from(action: &str) -> Self {
        Self(action.to_owned())
    }
}

impl From<String> for ActionId {
    fn from(action: String) -> Self {
        Self(action)
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// One premise of a rule, evaluated against the query evidence and the
/// currently active graph nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Condition {
    /// The classified intent equals this intent.
    IntentIs { intent: Intent },
    /// An entity of this kind was extracted, any value.
    HasEntity { entity: EntityKind },
    /// An entity of this kind was extracted with exactly this value.
    EntityEquals { entity: EntityKind, value: String },
    /// This token survived tokenization.
    TokenPresent { token: String },
    /// This graph node is active for the current query.
    NodeActive { node: NodeId },
    /// An earlier reasoning step produced this action.
    PriorAction { action: ActionId },
    /// The question has at least this many significant tokens.
    MinTokens { count: usize },
}

impl Condition {
    pub fn holds(&self, evidence: &Evidence, active: &[NodeActivation]) -> bool {
        match self {
            Condition::IntentIs { intent } => evidence.intent.intent == *intent,
            Condition::HasEntity { entity } => evidence.has_entity(*entity),
            Condition::EntityEquals { entity, value } => evidence
                .entity(*entity)
                .is_some_and(|v| v == text::normalize(value)),
            Condition::TokenPresent { token } => evidence.has_token(&text::normalize(token)),
            Condition::NodeActive { node } => active.iter().any(|a| &a.id == node),
            Condition::PriorAction { action } => evidence.prior_action(action),
            Condition::MinTokens { count } => evidence.tokens.len() >= *count,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::IntentIs { intent } => write!(f, "intent is {intent}"),
            Condition::HasEntity { entity } => write!(f, "has {entity} entity"),
            Condition::EntityEquals { entity, value } => write!(f, "{entity} = {value}"),
            Condition::TokenPresent { token } => write!(f, "token {token} present"),
            Condition::NodeActive { node } => write!(f, "node {node} active"),
            Condition::PriorAction { action } => write!(f, "prior action {action}"),
            Condition::MinTokens { count } => write!(f, "at least {count} tokens"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rules and inferences
// ---------------------------------------------------------------------------

/// A reasoning rule: all conditions must hold for the rule to fire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub conditions: Vec<Condition>,
    pub action: ActionId,
    /// Author-assigned reliability in [0.0, 1.0].
    pub base_confidence: f32,
}

impl Rule {
    pub fn matches(&self, evidence: &Evidence, active: &[NodeActivation]) -> bool {
        self.conditions.iter().all(|c| c.holds(evidence, active))
    }
}

/// A fired rule: what was concluded and how strongly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inference {
    pub rule_id: String,
    pub action: ActionId,
    /// `base_confidence * evidence_confidence`, clamped to [0.0, 1.0].
    pub confidence: f32,
}

// ---------------------------------------------------------------------------
// Evidence confidence
// ---------------------------------------------------------------------------

/// Additive weights for scoring how much support the evidence gives a
/// rule firing.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceWeights {
    pub base: f32,
    pub person: f32,
    pub topic: f32,
    /// Added when the intent is anything more specific than
    /// [`Intent::GeneralInquiry`].
    pub specific_intent: f32,
}

impl Default for EvidenceWeights {
    fn default() -> Self {
        Self {
            base: 0.5,
            person: 0.2,
            topic: 0.15,
            specific_intent: 0.15,
        }
    }
}

/// Score the evidence: base, plus person entity, plus topic entity,
/// plus a specific (non-fallback) intent. Clamped to [0.0, 1.0].
pub fn evidence_confidence(evidence: &Evidence, weights: &EvidenceWeights) -> f32 {
    let mut confidence = weights.base;
    if evidence.has_entity(EntityKind::Person) {
        confidence += weights.person;
    }
    if evidence.has_entity(EntityKind::Topic) {
        confidence += weights.topic;
    }
    if evidence.intent.intent != Intent::GeneralInquiry {
        confidence += weights.specific_intent;
    }
    confidence.clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Lifecycle of one reasoning run. The step loop asserts transitions
/// in debug builds; an illegal transition is a programming error, not
/// recoverable input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningState {
    Idle,
    Evaluating,
    Inferred,
    NoMatch,
    Terminal,
}

impl ReasoningState {
    pub fn can_advance_to(self, next: ReasoningState) -> bool {
        use ReasoningState::*;
        matches!(
            (self, next),
            (Idle, Evaluating)
                | (Evaluating, Inferred)
                | (Evaluating, NoMatch)
                | (Inferred, Evaluating)
                | (Inferred, Terminal)
                | (NoMatch, Terminal)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReasoningState::Idle => "idle",
            ReasoningState::Evaluating => "evaluating",
            ReasoningState::Inferred => "inferred",
            ReasoningState::NoMatch => "no_match",
            ReasoningState::Terminal => "terminal",
        }
    }
}

impl std::fmt::Display for ReasoningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityMap;
    use crate::graph::NodeKind;
    use crate::intent::IntentResult;

    fn evidence(intent: Intent, entities: &[(EntityKind, &str)]) -> Evidence {
        let mut map = EntityMap::new();
        for (kind, value) in entities {
            map.insert(*kind, (*value).to_owned());
        }
        Evidence::new(
            "متن".to_owned(),
            "متن".to_owned(),
            vec!["متن".to_owned()],
            IntentResult {
                intent,
                confidence: 0.9,
            },
            map,
        )
    }

    fn activation(id: &str) -> NodeActivation {
        NodeActivation {
            id: id.into(),
            kind: NodeKind::Topic,
            weight: 0.8,
            activation: 0.4,
        }
    }

    #[test]
    fn intent_and_entity_conditions() {
        let ev = evidence(Intent::Explanation, &[(EntityKind::Topic, "منطق")]);
        assert!(Condition::IntentIs {
            intent: Intent::Explanation
        }
        .holds(&ev, &[]));
        assert!(!Condition::IntentIs {
            intent: Intent::Greeting
        }
        .holds(&ev, &[]));
        assert!(Condition::HasEntity {
            entity: EntityKind::Topic
        }
        .holds(&ev, &[]));
        assert!(Condition::EntityEquals {
            entity: EntityKind::Topic,
            value: "منطق".to_owned()
        }
        .holds(&ev, &[]));
        assert!(!Condition::EntityEquals {
            entity: EntityKind::Topic,
            value: "ریاضی".to_owned()
        }
        .holds(&ev, &[]));
    }

    #[test]
    fn node_and_token_conditions() {
        let ev = evidence(Intent::GeneralInquiry, &[]);
        let active = [activation("logic")];
        assert!(Condition::NodeActive {
            node: "logic".into()
        }
        .holds(&ev, &active));
        assert!(!Condition::NodeActive { node: "math".into() }.holds(&ev, &active));
        assert!(Condition::TokenPresent {
            token: "متن".to_owned()
        }
        .holds(&ev, &[]));
        assert!(Condition::MinTokens { count: 1 }.holds(&ev, &[]));
        assert!(!Condition::MinTokens { count: 2 }.holds(&ev, &[]));
    }

    #[test]
    fn prior_action_condition_tracks_inferences() {
        let mut ev = evidence(Intent::Explanation, &[]);
        let cond = Condition::PriorAction {
            action: "explain_topic".into(),
        };
        assert!(!cond.holds(&ev, &[]));
        ev.push_inference(Inference {
            rule_id: "explain-topic".to_owned(),
            action: "explain_topic".into(),
            confidence: 0.68,
        });
        assert!(cond.holds(&ev, &[]));
    }

    #[test]
    fn evidence_confidence_accumulates_weights() {
        let weights = EvidenceWeights::default();
        let base = evidence(Intent::GeneralInquiry, &[]);
        assert!((evidence_confidence(&base, &weights) - 0.5).abs() < 1e-6);

        let with_intent = evidence(Intent::Explanation, &[]);
        assert!((evidence_confidence(&with_intent, &weights) - 0.65).abs() < 1e-6);

        let full = evidence(
            Intent::Explanation,
            &[
                (EntityKind::Person, "رضا محمدی"),
                (EntityKind::Topic, "منطق"),
            ],
        );
        assert!((evidence_confidence(&full, &weights) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn state_machine_legal_transitions() {
        use ReasoningState::*;
        assert!(Idle.can_advance_to(Evaluating));
        assert!(Evaluating.can_advance_to(Inferred));
        assert!(Evaluating.can_advance_to(NoMatch));
        assert!(Inferred.can_advance_to(Evaluating));
        assert!(Inferred.can_advance_to(Terminal));
        assert!(NoMatch.can_advance_to(Terminal));

        assert!(!Idle.can_advance_to(Inferred));
        assert!(!NoMatch.can_advance_to(Evaluating));
        assert!(!Terminal.can_advance_to(Evaluating));
    }

    #[test]
    fn conditions_deserialize_from_tagged_form() {
        let toml = r#"
            kind = "intent-is"
            intent = "greeting"
        "#;
        let cond: Condition = toml::from_str(toml).unwrap();
        assert!(matches!(
            cond,
            Condition::IntentIs {
                intent: Intent::Greeting
            }
        ));

        let toml = r#"
            kind = "min-tokens"
            count = 2
        "#;
        let cond: Condition = toml::from_str(toml).unwrap();
        assert!(matches!(cond, Condition::MinTokens { count: 2 }));
    }
}
