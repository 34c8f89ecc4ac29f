// src/config/scoring.rs
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoringError};
use crate::evaluate::persona::{normalize_keywords, DEFAULT_CALIBRATION, DEFAULT_PERSONA_KEYWORDS};
use crate::evaluate::CompositeWeights;
use crate::retrieval::DEFAULT_KNOWN_SOURCE_COUNT;
use crate::text::DEFAULT_MIN_WORD_CHARS;

fn default_known_source_count() -> usize {
    DEFAULT_KNOWN_SOURCE_COUNT
}
fn default_persona_name() -> String {
    "Lenny Rachitsky".to_string()
}
fn default_keywords() -> Vec<String> {
    DEFAULT_PERSONA_KEYWORDS.iter().map(|s| s.to_string()).collect()
}
fn default_calibration() -> f64 {
    DEFAULT_CALIBRATION
}
fn default_min_word_chars() -> usize {
    DEFAULT_MIN_WORD_CHARS
}
fn default_top_k() -> usize {
    3
}

/// Scoring configuration, loaded from `config/scoring.toml` (or JSON).
/// Every field has a default, so an empty file is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Number of content channels the corpus is built from (divisor for diversity).
    #[serde(default = "default_known_source_count")]
    pub known_source_count: usize,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub weights: CompositeWeights,
    #[serde(default)]
    pub groundedness: GroundednessConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Display name used in the generation prompt.
    #[serde(default = "default_persona_name")]
    pub name: String,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// Keyword density (percent) that counts as a perfect persona score.
    #[serde(default = "default_calibration")]
    pub calibration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundednessConfig {
    #[serde(default = "default_min_word_chars")]
    pub min_word_chars: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of chunks retrieved per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            known_source_count: default_known_source_count(),
            persona: PersonaConfig::default(),
            weights: CompositeWeights::default(),
            groundedness: GroundednessConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            keywords: default_keywords(),
            calibration: default_calibration(),
        }
    }
}

impl Default for GroundednessConfig {
    fn default() -> Self {
        Self {
            min_word_chars: default_min_word_chars(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl ScoringConfig {
    /// Parse from TOML text. Values are checked when an `Evaluator` is
    /// built from the config, not here.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: ScoringConfig = toml::from_str(s)
            .map_err(|e| ScoringError::Configuration(format!("invalid scoring TOML: {e}")))?;
        cfg.normalize();
        Ok(cfg)
    }

    /// Parse from JSON text.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let mut cfg: ScoringConfig = serde_json::from_str(s)
            .map_err(|e| ScoringError::Configuration(format!("invalid scoring JSON: {e}")))?;
        cfg.normalize();
        Ok(cfg)
    }

    /// Trim/lowercase keywords and drop blanks and duplicates.
    pub fn normalize(&mut self) {
        self.persona.keywords = normalize_keywords(&self.persona.keywords);
        self.persona.name = self.persona.name.trim().to_string();
    }

    /// Eager rejection of configs the scorers can't use.
    pub fn validate(&self) -> Result<()> {
        if self.known_source_count == 0 {
            return Err(ScoringError::Configuration(
                "known_source_count must be at least 1".into(),
            ));
        }
        let c = self.persona.calibration;
        if !c.is_finite() || c <= 0.0 {
            return Err(ScoringError::Configuration(format!(
                "persona.calibration must be a positive number, got {c}"
            )));
        }
        if self.groundedness.min_word_chars == 0 {
            return Err(ScoringError::Configuration(
                "groundedness.min_word_chars must be at least 1".into(),
            ));
        }
        if self.pipeline.top_k == 0 {
            return Err(ScoringError::Configuration(
                "pipeline.top_k must be at least 1".into(),
            ));
        }
        self.weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg = ScoringConfig::from_toml_str("").expect("empty config");
        assert_eq!(cfg, ScoringConfig::default());
        assert_eq!(cfg.known_source_count, 2);
        assert_eq!(cfg.pipeline.top_k, 3);
        assert_eq!(cfg.persona.keywords.len(), DEFAULT_PERSONA_KEYWORDS.len());
    }

    #[test]
    fn partial_toml_overrides() {
        let cfg = ScoringConfig::from_toml_str(
            r#"
known_source_count = 3

[persona]
keywords = ["Moat", "moat", "  ", "Flywheel"]
calibration = 2.5

[weights]
retrieval = 0.5
groundedness = 0.3
persona = 0.2
"#,
        )
        .expect("valid");
        assert_eq!(cfg.known_source_count, 3);
        assert_eq!(cfg.persona.keywords, vec!["moat", "flywheel"]);
        assert_eq!(cfg.persona.calibration, 2.5);
        assert_eq!(cfg.persona.name, "Lenny Rachitsky");
        assert_eq!(cfg.weights.retrieval, 0.5);
        assert_eq!(cfg.groundedness.min_word_chars, 4);
    }

    #[test]
    fn json_is_accepted() {
        let cfg = ScoringConfig::from_json_str(r#"{"persona":{"name":" Ada "}}"#).expect("valid");
        assert_eq!(cfg.persona.name, "Ada");
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        for bad in [
            "known_source_count = 0",
            "[persona]\ncalibration = 0.0",
            "[weights]\nretrieval = -0.4",
            "[groundedness]\nmin_word_chars = 0",
            "[pipeline]\ntop_k = 0",
            "known_source_count = \"two\"",
        ] {
            let checked = ScoringConfig::from_toml_str(bad).and_then(|cfg| cfg.validate());
            assert!(
                matches!(checked, Err(ScoringError::Configuration(_))),
                "expected configuration error for {bad:?}"
            );
        }
    }

    #[test]
    fn parsing_does_not_validate() {
        // unnormalized weights parse, and bad values surface only on validate
        let cfg = ScoringConfig::from_toml_str("known_source_count = 0\n[weights]\npersona = 0.9")
            .expect("parses");
        assert_eq!(cfg.known_source_count, 0);
        assert_eq!(cfg.weights.persona, 0.9);
        assert!(cfg.validate().is_err());
        assert!(crate::evaluate::Evaluator::from_config(&cfg).is_err());
    }
}
