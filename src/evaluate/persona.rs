//! Persona fidelity: keyword density of the persona's characteristic
//! vocabulary in the generated answer.
//!
//! Score = min((distinct keyword hits / word count × 100) / calibration, 1.0).
//! With the default calibration, 5 keywords per 100 words is a perfect score.
//! Matching is substring-based on the lowercased answer, so "data" also hits
//! "database". Like groundedness, this is a cheap placeholder behind a trait.

use crate::error::{Result, ScoringError};
use crate::text::{clamp01, round_to, word_count};

/// Characteristic vocabulary of the default persona.
pub const DEFAULT_PERSONA_KEYWORDS: &[&str] = &[
    "framework",
    "metric",
    "data",
    "product-market fit",
    "growth",
    "retention",
    "funnel",
    "roadmap",
    "prioritize",
    "north star",
    "activation",
    "aha moment",
    "iterate",
];

/// Keyword density (percent) that maps to a perfect score.
pub const DEFAULT_CALIBRATION: f64 = 5.0;

/// Swappable persona measure. Implementations return a value in [0,1] and
/// 0.0 for an empty answer.
pub trait PersonaStrategy: Send + Sync {
    fn score(&self, answer: &str) -> f64;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordDensity {
    keywords: Vec<String>,
    calibration: f64,
}

impl KeywordDensity {
    /// Keywords are trimmed and lowercased; blanks and duplicates are dropped.
    /// Calibration must be finite and positive.
    pub fn new<I, S>(keywords: I, calibration: f64) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !calibration.is_finite() || calibration <= 0.0 {
            return Err(ScoringError::Configuration(format!(
                "persona calibration must be a positive number, got {calibration}"
            )));
        }
        Ok(Self {
            keywords: normalize_keywords(keywords),
            calibration,
        })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn calibration(&self) -> f64 {
        self.calibration
    }
}

impl Default for KeywordDensity {
    fn default() -> Self {
        Self {
            keywords: normalize_keywords(DEFAULT_PERSONA_KEYWORDS),
            calibration: DEFAULT_CALIBRATION,
        }
    }
}

impl PersonaStrategy for KeywordDensity {
    fn score(&self, answer: &str) -> f64 {
        if answer.is_empty() {
            return 0.0;
        }
        let words = word_count(answer);
        if words == 0 {
            return 0.0;
        }

        let lowered = answer.to_lowercase();
        let hits = self
            .keywords
            .iter()
            .filter(|k| lowered.contains(k.as_str()))
            .count();

        let density = hits as f64 / words as f64 * 100.0;
        round_to(clamp01(density / self.calibration), 3)
    }

    fn name(&self) -> &'static str {
        "keyword_density"
    }
}

pub(crate) fn normalize_keywords<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for k in keywords {
        let k = k.as_ref().trim().to_lowercase();
        if !k.is_empty() && !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

/// Persona score with the default vocabulary and calibration.
pub fn score_persona(answer: &str) -> f64 {
    KeywordDensity::default().score(answer)
}

/// Persona score with a caller-supplied vocabulary and calibration.
pub fn score_persona_with<S: AsRef<str>>(
    answer: &str,
    keywords: &[S],
    calibration: f64,
) -> Result<f64> {
    Ok(KeywordDensity::new(keywords, calibration)?.score(answer))
}
