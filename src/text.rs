//! Persian text normalization and tokenization.
//!
//! Every query passes through [`normalize`] before any pattern in the
//! pipeline looks at it, so intent patterns, entity lexicons, and node
//! trigger phrases can all be authored in one canonical form: Persian
//! letter variants folded, digits ASCII, diacritics stripped, punctuation
//! removed, whitespace collapsed, Latin lowercased. `normalize` is
//! idempotent; calling it on its own output is a no-op.

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

use unicode_normalization::UnicodeNormalization;

/// Zero-width non-joiner, the word-internal separator in Persian
/// compounds (می‌خواهم). Preserved inside words, trimmed at token edges.
pub const ZWNJ: char = '\u{200C}';

/// Canonicalize a Persian question for pattern matching.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfc() {
        match fold_char(c) {
            Folded::Keep(k) => out.push(k),
            Folded::Space => out.push(' '),
            Folded::Drop => {}
        }
    }
    // Latin letters in mixed-script questions compare case-insensitively.
    let lowered = out.to_lowercase();
    let mut cleaned = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_alphanumeric() || c == ZWNJ {
            cleaned.push(c);
        } else {
            cleaned.push(' ');
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

enum Folded {
    Keep(char),
    Space,
    Drop,
}

fn fold_char(c: char) -> Folded {
    match c {
        // Arabic letter variants written interchangeably in Persian text.
        '\u{064A}' | '\u{0649}' => Folded::Keep('\u{06CC}'), // ي ى -> ی
        '\u{0643}' => Folded::Keep('\u{06A9}'),              // ك -> ک
        '\u{0629}' => Folded::Keep('\u{0647}'),              // ة -> ه
        '\u{0623}' | '\u{0625}' | '\u{0671}' => Folded::Keep('\u{0627}'), // أ إ ٱ -> ا
        '\u{0624}' => Folded::Keep('\u{0648}'),              // ؤ -> و
        // Extended Arabic-Indic digits (Persian keyboards).
        '\u{06F0}'..='\u{06F9}' => digit_from(c, '\u{06F0}'),
        // Arabic-Indic digits.
        '\u{0660}'..='\u{0669}' => digit_from(c, '\u{0660}'),
        // Harakat and the superscript alef carry no lexical information
        // here; they are Alphabetic to `char`, so drop them explicitly.
        '\u{064B}'..='\u{065F}' | '\u{0670}' => Folded::Drop,
        // Tatweel is pure letter stretching.
        '\u{0640}' => Folded::Drop,
        ZWNJ => Folded::Keep(ZWNJ),
        c if c.is_whitespace() => Folded::Space,
        c if c.is_alphanumeric() => Folded::Keep(c),
        // Everything else: ASCII punctuation, ؟ ، ؛ « », symbols.
        _ => Folded::Space,
    }
}

fn digit_from(c: char, zero: char) -> Folded {
    let offset = (c as u32) - (zero as u32);
    match char::from_u32(('0' as u32) + offset) {
        Some(d) => Folded::Keep(d),
        None => Folded::Drop,
    }
}

// ---------------------------------------------------------------------------
// Tokenization
// ---------------------------------------------------------------------------

/// High-frequency Persian function words, excluded from token streams.
/// Entries are already in normalized form.
const STOP_WORDS: &[&str] = &[
    "و",
    "در",
    "به",
    "از",
    "که",
    "را",
    "با",
    "برای",
    "این",
    "آن",
    "یک",
    "تا",
    "هم",
    "نیز",
    "اما",
    "اگر",
    "پس",
    "است",
    "هست",
    "بود",
    "شد",
    "های",
    "ها",
    "هر",
    "او",
    "ما",
    "شما",
    "من",
    "تو",
    "خود",
    "یا",
    "بر",
    "چون",
    "البته",
    "یعنی",
];

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Split normalized text into significant tokens: whitespace-delimited
/// words, ZWNJ trimmed at the edges, stop words and words shorter than
/// `min_len` scalar values removed.
pub fn tokenize(normalized: &str, min_len: usize) -> Vec<String> {
    normalized
        .split_whitespace()
        .map(|w| w.trim_matches(ZWNJ))
        .filter(|w| w.chars().count() >= min_len && !is_stop_word(w))
        .map(str::to_owned)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
