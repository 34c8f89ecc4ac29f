//! Groundedness: how much of the answer's vocabulary is attested in the
//! context the generator was conditioned on.
//!
//! The default strategy is lexical overlap on significant words (4+ chars).
//! It misses paraphrase and is meant to be replaced by a judge-model check;
//! anything implementing `GroundednessStrategy` can be plugged into the
//! `Evaluator` without touching callers.

use crate::text::{clamp01, round_to, significant_words, DEFAULT_MIN_WORD_CHARS};

/// Swappable groundedness measure. Implementations return a value in [0,1]
/// and must return 0.0 for an empty answer or empty context.
pub trait GroundednessStrategy: Send + Sync {
    fn score(&self, answer: &str, context_chunks: &[String]) -> f64;
    /// Short identifier for diagnostics.
    fn name(&self) -> &'static str;
}

/// |answer words ∩ context words| / |answer words| over significant words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalOverlap {
    pub min_word_chars: usize,
}

impl Default for LexicalOverlap {
    fn default() -> Self {
        Self {
            min_word_chars: DEFAULT_MIN_WORD_CHARS,
        }
    }
}

impl GroundednessStrategy for LexicalOverlap {
    fn score(&self, answer: &str, context_chunks: &[String]) -> f64 {
        if answer.is_empty() || context_chunks.is_empty() {
            return 0.0;
        }

        let answer_words = significant_words(answer, self.min_word_chars);
        if answer_words.is_empty() {
            return 0.0;
        }
        let context_words = significant_words(&context_chunks.join(" "), self.min_word_chars);

        let overlap = answer_words.intersection(&context_words).count();
        round_to(clamp01(overlap as f64 / answer_words.len() as f64), 3)
    }

    fn name(&self) -> &'static str {
        "lexical_overlap"
    }
}

/// Groundedness with the default lexical-overlap strategy.
pub fn score_groundedness(answer: &str, context_chunks: &[String]) -> f64 {
    LexicalOverlap::default().score(answer, context_chunks)
}
