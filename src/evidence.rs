//! Per-query evidence record.
//!
//! Everything transient about one question lives here: the raw and
//! normalized text, tokens, classified intent, extracted entities, and
//! the inferences accumulated while reasoning. The engine itself holds
//! no per-query state, so concurrent questions never share an
//! `Evidence`.

use serde::Serialize;

use crate::entity::{EntityKind, EntityMap};
use crate::intent::IntentResult;
use crate::reason::{ActionId, Inference};
use crate::text;

#[derive(Debug, Clone, Serialize)]
pub struct Evidence {
    pub original: String,
    pub normalized: String,
    pub tokens: Vec<String>,
    pub intent: IntentResult,
    pub entities: EntityMap,
    /// Inferences appended in firing order as reasoning steps complete.
    pub prior_inferences: Vec<Inference>,
}

impl Evidence {
    pub fn new(
        original: String,
        normalized: String,
        tokens: Vec<String>,
        intent: IntentResult,
        entities: EntityMap,
    ) -> Self {
        Self {
            original,
            normalized,
            tokens,
            intent,
            entities,
            prior_inferences: Vec::new(),
        }
    }

    pub fn entity(&self, kind: EntityKind) -> Option<&str> {
        self.entities.get(&kind).map(String::as_str)
    }

    pub fn has_entity(&self, kind: EntityKind) -> bool {
        self.entities.contains_key(&kind)
    }

    pub fn has_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Whether the rule with this id already fired during this query.
    pub fn rule_fired(&self, rule_id: &str) -> bool {
        self.prior_inferences.iter().any(|i| i.rule_id == rule_id)
    }

    /// Whether an earlier step produced this action.
    pub fn prior_action(&self, action: &ActionId) -> bool {
        self.prior_inferences.iter().any(|i| &i.action == action)
    }

    pub fn push_inference(&mut self, inference: Inference) {
        self.prior_inferences.push(inference);
    }

    /// Patterns that seed graph activation: the normalized question,
    /// every extracted entity value, and the label of every action
    /// inferred so far. The last group is what lets a fired rule light
    /// up follow-on nodes between reasoning steps. All entries pass
    /// through [`text::normalize`] so they compare cleanly against
    /// node trigger phrases, which are normalized at load time.
    pub fn question_patterns(&self) -> Vec<String> {
        let mut patterns = vec![self.normalized.clone()];
        patterns.extend(self.entities.values().map(|v| text::normalize(v)));
        patterns.extend(
            self.prior_inferences
                .iter()
                .map(|i| text::normalize(i.action.as_str())),
        );
        patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;

    fn evidence(text: &str) -> Evidence {
        let normalized = text::normalize(text);
        let tokens = text::tokenize(&normalized, 2);
        Evidence::new(
            text.to_owned(),
            normalized,
            tokens,
            IntentResult {
                intent: Intent::Explanation,
                confidence: 0.9,
            },
            EntityMap::new(),
        )
    }

    #[test]
    fn question_patterns_start_with_normalized_text() {
        let ev = evidence("یادگیری ماشین چیست؟");
        assert_eq!(ev.question_patterns(), vec!["یادگیری ماشین چیست"]);
    }

    #[test]
    fn question_patterns_grow_with_entities_and_actions() {
        let mut ev = evidence("یادگیری ماشین چیست؟");
        ev.entities
            .insert(EntityKind::Topic, "یادگیری ماشین".to_owned());
        ev.push_inference(Inference {
            rule_id: "explain-topic".to_owned(),
            action: ActionId::from("explain_topic"),
            confidence: 0.68,
        });
        let patterns = ev.question_patterns();
        assert_eq!(patterns.len(), 3);
        assert!(patterns.contains(&"یادگیری ماشین".to_owned()));
        // Action labels are normalized like any other pattern.
        assert!(patterns.contains(&"explain topic".to_owned()));
    }

    #[test]
    fn rule_and_action_lookups() {
        let mut ev = evidence("سلام");
        assert!(!ev.rule_fired("greet"));
        ev.push_inference(Inference {
            rule_id: "greet".to_owned(),
            action: ActionId::from("greet"),
            confidence: 0.5,
        });
        assert!(ev.rule_fired("greet"));
        assert!(ev.prior_action(&ActionId::from("greet")));
        assert!(!ev.prior_action(&ActionId::from("explain_topic")));
    }
}
