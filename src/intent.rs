//! Intent classification over normalized Persian questions.
//!
//! A fixed, ordered table maps each [`Intent`] to a set of trigger
//! patterns (literal phrases or word-boundary regexes). The first table
//! row with any matching pattern wins, so declaration order doubles as
//! priority. Questions matching no row fall back to
//! [`Intent::GeneralInquiry`] at a reduced confidence; classification
//! never fails.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, PorsaResult};
use crate::text;

/// The closed set of question intents the pipeline distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    IdentityQuery,
    Explanation,
    Comparison,
    PersonInquiry,
    AchievementInquiry,
    ArticleRequest,
    TechnicalQuestion,
    GeneralInquiry,
}

impl Intent {
    pub const ALL: [Intent; 9] = [
        Intent::Greeting,
        Intent::IdentityQuery,
        Intent::Explanation,
        Intent::Comparison,
        Intent::PersonInquiry,
        Intent::AchievementInquiry,
        Intent::ArticleRequest,
        Intent::TechnicalQuestion,
        Intent::GeneralInquiry,
    ];

    /// Stable snake_case label, matching the serde representation used
    /// in seed packs and exports.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::IdentityQuery => "identity_query",
            Intent::Explanation => "explanation",
            Intent::Comparison => "comparison",
            Intent::PersonInquiry => "person_inquiry",
            Intent::AchievementInquiry => "achievement_inquiry",
            Intent::ArticleRequest => "article_request",
            Intent::TechnicalQuestion => "technical_question",
            Intent::GeneralInquiry => "general_inquiry",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of intent classification for one question.
#[derive(Debug, Clone, Serialize)]
pub struct IntentResult {
    pub intent: Intent,
    /// Fixed per the match outcome: `matched_confidence` when a pattern
    /// hit, `fallback_confidence` otherwise.
    pub confidence: f32,
}

// ---------------------------------------------------------------------------
// Pattern table
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum IntentPattern {
    /// Literal substring over normalized text.
    Phrase(String),
    /// Compiled regex, used where substring matching would hit inside
    /// longer words (سلام in اسلام).
    Pattern(Regex),
}

impl IntentPattern {
    fn matches(&self, normalized: &str) -> bool {
        match self {
            IntentPattern::Phrase(p) => normalized.contains(p.as_str()),
            IntentPattern::Pattern(re) => re.is_match(normalized),
        }
    }
}

#[derive(Debug)]
struct IntentRule {
    intent: Intent,
    patterns: Vec<IntentPattern>,
}

/// Ordered first-match-wins intent classifier.
#[derive(Debug)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
    matched_confidence: f32,
    fallback_confidence: f32,
}

fn phrase(p: &str) -> IntentPattern {
    IntentPattern::Phrase(text::normalize(p))
}

/// Whole-word pattern: the trigger surrounded by word boundaries.
fn word(w: &str) -> PorsaResult<IntentPattern> {
    let pattern = format!(r"\b{}\b", regex::escape(&text::normalize(w)));
    let re = Regex::new(&pattern).map_err(|e| EngineError::InvalidConfig {
        message: format!("intent pattern `{w}`: {e}"),
    })?;
    Ok(IntentPattern::Pattern(re))
}

impl IntentClassifier {
    /// Build the Persian intent table. Row order is priority order.
    pub fn persian(matched_confidence: f32, fallback_confidence: f32) -> PorsaResult<Self> {
        let rules = vec![
            IntentRule {
                intent: Intent::Greeting,
                patterns: vec![
                    word("سلام")?,
                    word("درود")?,
                    phrase("صبح بخیر"),
                    phrase("عصر بخیر"),
                    phrase("شب بخیر"),
                    phrase("وقت بخیر"),
                    phrase("خسته نباشید"),
                ],
            },
            IntentRule {
                intent: Intent::IdentityQuery,
                patterns: vec![
                    phrase("کی هستی"),
                    phrase("کی هستید"),
                    phrase("چه کسی هستی"),
                    phrase("خودت را معرفی"),
                    phrase("معرفی کن"),
                    phrase("اسمت چیست"),
                    phrase("اسم شما"),
                ],
            },
            IntentRule {
                intent: Intent::Explanation,
                patterns: vec![
                    phrase("توضیح"),
                    phrase("تعریف کن"),
                    phrase("شرح بده"),
                    phrase("یعنی چه"),
                    phrase("یعنی چی"),
                    word("چیست")?,
                    word("چیه")?,
                ],
            },
            IntentRule {
                intent: Intent::Comparison,
                patterns: vec![
                    phrase("مقایسه"),
                    word("تفاوت")?,
                    word("فرق")?,
                    phrase("کدام بهتر"),
                    phrase("بهتر است یا"),
                ],
            },
            IntentRule {
                intent: Intent::PersonInquiry,
                patterns: vec![
                    word("کیست")?,
                    phrase("چه کسی"),
                    phrase("درباره دکتر"),
                    phrase("درباره استاد"),
                    phrase("درباره مهندس"),
                    word("سازنده")?,
                    word("نویسنده")?,
                ],
            },
            IntentRule {
                intent: Intent::AchievementInquiry,
                patterns: vec![
                    phrase("دستاورد"),
                    phrase("افتخار"),
                    phrase("موفقیت"),
                    phrase("سوابق"),
                    phrase("چه کارهایی"),
                ],
            },
            IntentRule {
                intent: Intent::ArticleRequest,
                patterns: vec![
                    word("مقاله")?,
                    word("مقالات")?,
                    phrase("نوشته"),
                    word("مطلب")?,
                    word("مطالب")?,
                    word("بلاگ")?,
                ],
            },
            IntentRule {
                intent: Intent::TechnicalQuestion,
                patterns: vec![
                    word("چگونه")?,
                    word("چطور")?,
                    word("نصب")?,
                    word("خطا")?,
                    word("ارور")?,
                    phrase("کار نمی‌کند"),
                ],
            },
        ];
        Ok(Self {
            rules,
            matched_confidence,
            fallback_confidence,
        })
    }

    /// Classify normalized text. Always returns a result: the first
    /// matching row, or the general-inquiry fallback.
    pub fn detect(&self, normalized: &str) -> IntentResult {
        for rule in &self.rules {
            if rule.patterns.iter().any(|p| p.matches(normalized)) {
                return IntentResult {
                    intent: rule.intent,
                    confidence: self.matched_confidence,
                };
            }
        }
        IntentResult {
            intent: Intent::GeneralInquiry,
            confidence: self.fallback_confidence,
        }
    }

    /// Number of intents with at least one trigger pattern.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Total number of trigger patterns across all intents.
    pub fn pattern_count(&self) -> usize {
        self.rules.iter().map(|r| r.patterns.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::persian(0.9, 0.3).unwrap()
    }

    fn detect(text: &str) -> IntentResult {
        classifier().detect(&crate::text::normalize(text))
    }

    #[test]
    fn greeting_matches_at_high_confidence() {
        let result = detect("سلام!");
        assert_eq!(result.intent, Intent::Greeting);
        assert!((result.confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn greeting_respects_word_boundaries() {
        let result = detect("تاریخ اسلام چیست؟");
        assert_eq!(result.intent, Intent::Explanation);
    }

    #[test]
    fn explanation_via_chist_suffix() {
        let result = detect("یادگیری ماشین چیست؟");
        assert_eq!(result.intent, Intent::Explanation);
    }

    #[test]
    fn person_inquiry_via_kist() {
        let result = detect("رضا محمدی کیست؟");
        assert_eq!(result.intent, Intent::PersonInquiry);
    }

    #[test]
    fn unmatched_falls_back_to_general_inquiry() {
        let result = detect("قطار تهران ساعت چند حرکت میکند");
        assert_eq!(result.intent, Intent::GeneralInquiry);
        assert!((result.confidence - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn first_matching_row_wins() {
        // Both greeting and explanation patterns present; the greeting
        // row is declared first.
        let result = detect("سلام، یادگیری ماشین چیست؟");
        assert_eq!(result.intent, Intent::Greeting);
    }

    #[test]
    fn configured_confidences_are_reported() {
        let clf = IntentClassifier::persian(0.8, 0.2).unwrap();
        assert!((clf.detect("سلام").confidence - 0.8).abs() < f32::EPSILON);
        assert!((clf.detect("xyz").confidence - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn labels_round_trip_through_serde() {
        for intent in Intent::ALL {
            let json = serde_json::to_string(&intent).unwrap();
            assert_eq!(json, format!("\"{}\"", intent.label()));
            let back: Intent = serde_json::from_str(&json).unwrap();
            assert_eq!(back, intent);
        }
    }
}
