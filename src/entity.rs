//! Entity extraction from normalized Persian questions.
//!
//! An ordered list of independent rules scans the question once. Each
//! rule targets one [`EntityKind`] and either captures from a regex or
//! looks up a lexicon of known surface forms mapped to canonical
//! values. Kinds are additive: a question can yield any subset of
//! person, topic, action, and location. The first rule that matches a
//! kind fixes its value; a kind with no matching rule stays absent from
//! the map, never empty.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, PorsaResult};
use crate::text;

/// The closed set of entity kinds the extractor knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Person,
    Topic,
    Action,
    Location,
}

impl EntityKind {
    /// Stable label, also the interpolation slot name in response
    /// templates (`{person}`, `{topic}`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Person => "person",
            EntityKind::Topic => "topic",
            EntityKind::Action => "action",
            EntityKind::Location => "location",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Extracted entities for one question. Absent kind means no match.
pub type EntityMap = BTreeMap<EntityKind, String>;

// ---------------------------------------------------------------------------
// Extraction rules
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Matcher {
    /// Regex with one capture group; the capture is the entity value.
    Capture(Regex),
    /// Surface form -> canonical value pairs, scanned in declared order.
    Lexicon(Vec<(String, String)>),
}

impl Matcher {
    fn find(&self, normalized: &str) -> Option<String> {
        match self {
            Matcher::Capture(re) => re
                .captures(normalized)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_owned()),
            Matcher::Lexicon(entries) => entries
                .iter()
                .find(|(surface, _)| normalized.contains(surface.as_str()))
                .map(|(_, canonical)| canonical.clone()),
        }
    }
}

#[derive(Debug)]
struct ExtractRule {
    kind: EntityKind,
    matcher: Matcher,
}

fn lex(kind: EntityKind, entries: &[(&str, &str)]) -> ExtractRule {
    ExtractRule {
        kind,
        matcher: Matcher::Lexicon(
            entries
                .iter()
                .map(|(surface, canonical)| (text::normalize(surface), (*canonical).to_owned()))
                .collect(),
        ),
    }
}

fn cap(kind: EntityKind, pattern: &str) -> PorsaResult<ExtractRule> {
    let re = Regex::new(pattern).map_err(|e| EngineError::InvalidConfig {
        message: format!("entity pattern `{pattern}`: {e}"),
    })?;
    Ok(ExtractRule {
        kind,
        matcher: Matcher::Capture(re),
    })
}

/// Ordered entity extractor for Persian questions.
#[derive(Debug)]
pub struct EntityExtractor {
    rules: Vec<ExtractRule>,
}

impl EntityExtractor {
    pub fn persian() -> PorsaResult<Self> {
        let rules = vec![
            // Known people first so canonical names win over raw captures.
            lex(
                EntityKind::Person,
                &[
                    ("رضا محمدی", "رضا محمدی"),
                    ("رضا", "رضا محمدی"),
                    ("محمدی", "رضا محمدی"),
                    ("سازنده", "رضا محمدی"),
                    ("نویسنده", "رضا محمدی"),
                ],
            ),
            // Honorific followed by a name word.
            cap(
                EntityKind::Person,
                r"(?:دکتر|استاد|مهندس|پروفسور|خانم|آقای)\s+(\S+)",
            )?,
            lex(
                EntityKind::Topic,
                &[
                    ("پردازش زبان طبیعی", "پردازش زبان"),
                    ("پردازش زبان", "پردازش زبان"),
                    ("هوش مصنوعی", "هوش مصنوعی"),
                    ("یادگیری ماشین", "یادگیری ماشین"),
                    ("یادگیری عمیق", "یادگیری عمیق"),
                    ("برنامه‌نویسی", "برنامه‌نویسی"),
                    ("برنامه نویسی", "برنامه‌نویسی"),
                    ("علم داده", "علم داده"),
                    ("تحلیل داده", "تحلیل داده"),
                    ("ریاضیات", "ریاضی"),
                    ("ریاضی", "ریاضی"),
                    ("منطق", "منطق"),
                    ("استراتژی", "استراتژی"),
                    ("کسب و کار", "کسب و کار"),
                    ("طراحی محصول", "طراحی محصول"),
                ],
            ),
            lex(
                EntityKind::Action,
                &[
                    ("توضیح بده", "توضیح"),
                    ("توضیح", "توضیح"),
                    ("مقایسه کن", "مقایسه"),
                    ("مقایسه", "مقایسه"),
                    ("معرفی کن", "معرفی"),
                    ("معرفی", "معرفی"),
                    ("پیشنهاد بده", "پیشنهاد"),
                    ("پیشنهاد", "پیشنهاد"),
                    ("نشان بده", "نمایش"),
                    ("بگو", "بیان"),
                ],
            ),
            cap(EntityKind::Location, r"در شهر\s+(\S+)")?,
            lex(
                EntityKind::Location,
                &[
                    ("تهران", "تهران"),
                    ("اصفهان", "اصفهان"),
                    ("شیراز", "شیراز"),
                    ("مشهد", "مشهد"),
                    ("تبریز", "تبریز"),
                    ("ایران", "ایران"),
                ],
            ),
        ];
        Ok(Self { rules })
    }

    /// Run every rule over the question. Later rules for an
    /// already-filled kind are skipped.
    pub fn extract(&self, normalized: &str) -> EntityMap {
        let mut entities = EntityMap::new();
        for rule in &self.rules {
            if entities.contains_key(&rule.kind) {
                continue;
            }
            if let Some(value) = rule.matcher.find(normalized) {
                entities.insert(rule.kind, value);
            }
        }
        entities
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(input: &str) -> EntityMap {
        EntityExtractor::persian()
            .unwrap()
            .extract(&crate::text::normalize(input))
    }

    #[test]
    fn known_person_is_canonicalized() {
        let entities = extract("درباره رضا بگو");
        assert_eq!(
            entities.get(&EntityKind::Person).map(String::as_str),
            Some("رضا محمدی")
        );
    }

    #[test]
    fn honorific_captures_following_word() {
        let entities = extract("دکتر سارا کیست؟");
        assert_eq!(
            entities.get(&EntityKind::Person).map(String::as_str),
            Some("سارا")
        );
    }

    #[test]
    fn lexicon_outranks_honorific_capture() {
        let entities = extract("دکتر رضا کیست؟");
        assert_eq!(
            entities.get(&EntityKind::Person).map(String::as_str),
            Some("رضا محمدی")
        );
    }

    #[test]
    fn kinds_are_additive() {
        let entities = extract("رضا درباره هوش مصنوعی توضیح بده");
        assert_eq!(
            entities.get(&EntityKind::Person).map(String::as_str),
            Some("رضا محمدی")
        );
        assert_eq!(
            entities.get(&EntityKind::Topic).map(String::as_str),
            Some("هوش مصنوعی")
        );
        assert_eq!(
            entities.get(&EntityKind::Action).map(String::as_str),
            Some("توضیح")
        );
        assert!(!entities.contains_key(&EntityKind::Location));
    }

    #[test]
    fn no_match_leaves_map_empty() {
        assert!(extract("سلام").is_empty());
    }

    #[test]
    fn topic_lexicon_prefers_longer_surface_forms() {
        let entities = extract("پردازش زبان طبیعی چیست؟");
        assert_eq!(
            entities.get(&EntityKind::Topic).map(String::as_str),
            Some("پردازش زبان")
        );
    }

    #[test]
    fn location_from_city_lexicon() {
        let entities = extract("رویدادهای تهران را نشان بده");
        assert_eq!(
            entities.get(&EntityKind::Location).map(String::as_str),
            Some("تهران")
        );
        assert_eq!(
            entities.get(&EntityKind::Action).map(String::as_str),
            Some("نمایش")
        );
    }
}
