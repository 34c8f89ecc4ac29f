// src/text.rs
//! Shared text and numeric helpers for the scorers: word tokenizer,
//! significant-word sets, word counts, decimal rounding and clamping.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Default minimum length (in chars) for a word to count as "significant".
pub const DEFAULT_MIN_WORD_CHARS: usize = 4;

// \w is Unicode-aware in the regex crate, so accented words stay whole.
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word regex"));

/// Iterate `\w+` tokens of `text` (no case folding).
pub fn tokenize_words(text: &str) -> impl Iterator<Item = &str> + '_ {
    WORD_RE.find_iter(text).map(|m| m.as_str())
}

/// Lowercased set of tokens with at least `min_chars` characters.
/// Duplicates collapse; short function words drop out.
pub fn significant_words(text: &str, min_chars: usize) -> HashSet<String> {
    let lowered = text.to_lowercase();
    tokenize_words(&lowered)
        .filter(|w| w.chars().count() >= min_chars)
        .map(str::to_string)
        .collect()
}

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Round to `digits` decimal places. Exact ties go to the even digit,
/// so 0.0625 becomes 0.062, not 0.063.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round_ties_even() / factor
}

/// Clamp to [0.0, 1.0]. NaN maps to 0.0.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
