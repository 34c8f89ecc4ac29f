// src/evaluate/mod.rs
//! Evaluation entry: runs the three component scorers over one answered
//! request and blends them into a graded report.

pub mod composite;
pub mod groundedness;
pub mod persona;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::ScoringConfig;
use crate::error::Result;
use crate::retrieval::{score_retrieval_with, RetrievalMetrics, RetrievalResult};

// Re-export convenient types.
pub use crate::evaluate::composite::{
    score_composite, score_composite_with, ComponentBreakdown, CompositeWeights, Grade,
    ScoreBreakdown,
};
pub use crate::evaluate::groundedness::{score_groundedness, GroundednessStrategy, LexicalOverlap};
pub use crate::evaluate::persona::{
    score_persona, score_persona_with, KeywordDensity, PersonaStrategy, DEFAULT_CALIBRATION,
    DEFAULT_PERSONA_KEYWORDS,
};

/// Everything the serving layer knows after answering one query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub answer: String,
    #[serde(default)]
    pub context_chunks: Vec<String>,
    #[serde(default)]
    pub results: Vec<RetrievalResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub retrieval: RetrievalMetrics,
    pub groundedness: f64,
    pub persona: f64,
    pub score: ScoreBreakdown,
}

/// Stateless scoring service. Holds read-only config plus the two swappable
/// heuristics; safe to share across threads and call concurrently.
#[derive(Clone)]
pub struct Evaluator {
    known_source_count: usize,
    weights: CompositeWeights,
    groundedness: Arc<dyn GroundednessStrategy>,
    persona: Arc<dyn PersonaStrategy>,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("known_source_count", &self.known_source_count)
            .field("weights", &self.weights)
            .field("groundedness", &self.groundedness.name())
            .field("persona", &self.persona.name())
            .finish()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            known_source_count: crate::retrieval::DEFAULT_KNOWN_SOURCE_COUNT,
            weights: CompositeWeights::default(),
            groundedness: Arc::new(LexicalOverlap::default()),
            persona: Arc::new(KeywordDensity::default()),
        }
    }
}

impl Evaluator {
    /// Build from a config. This is the one place a config is validated.
    pub fn from_config(cfg: &ScoringConfig) -> Result<Self> {
        cfg.validate()?;
        let persona = KeywordDensity::new(&cfg.persona.keywords, cfg.persona.calibration)?;
        Ok(Self {
            known_source_count: cfg.known_source_count,
            weights: cfg.weights,
            groundedness: Arc::new(LexicalOverlap {
                min_word_chars: cfg.groundedness.min_word_chars,
            }),
            persona: Arc::new(persona),
        })
    }

    /// Swap in a different groundedness measure (e.g. a judge model).
    pub fn with_groundedness_strategy(mut self, s: Arc<dyn GroundednessStrategy>) -> Self {
        self.groundedness = s;
        self
    }

    /// Swap in a different persona measure.
    pub fn with_persona_strategy(mut self, s: Arc<dyn PersonaStrategy>) -> Self {
        self.persona = s;
        self
    }

    pub fn weights(&self) -> &CompositeWeights {
        &self.weights
    }

    pub fn known_source_count(&self) -> usize {
        self.known_source_count
    }

    pub fn score_retrieval(&self, results: &[RetrievalResult]) -> RetrievalMetrics {
        score_retrieval_with(results, self.known_source_count)
    }

    pub fn score_groundedness(&self, answer: &str, context_chunks: &[String]) -> f64 {
        self.groundedness.score(answer, context_chunks)
    }

    pub fn score_persona(&self, answer: &str) -> f64 {
        self.persona.score(answer)
    }

    pub fn score_composite(
        &self,
        retrieval: &RetrievalMetrics,
        groundedness: f64,
        persona: f64,
    ) -> ScoreBreakdown {
        score_composite_with(retrieval, groundedness, persona, &self.weights)
    }

    /// Full scoring pass: retrieval → groundedness → persona → composite.
    pub fn evaluate(&self, req: &EvaluationRequest) -> EvaluationReport {
        let retrieval = self.score_retrieval(&req.results);
        let groundedness = self.score_groundedness(&req.answer, &req.context_chunks);
        let persona = self.score_persona(&req.answer);
        let score = self.score_composite(&retrieval, groundedness, persona);

        dev_log_evaluation(&req.answer, &retrieval, groundedness, persona, &score);

        EvaluationReport {
            retrieval,
            groundedness,
            persona,
            score,
        }
    }
}

// Dev logging gate: EVAL_DEV_LOG=1 AND dev env (debug or SHUTTLE_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("EVAL_DEV_LOG").ok().as_deref() == Some("1");
    on && crate::config::is_dev_env()
}

/// Short anonymized id for a text (first 6 bytes of SHA-256, hex).
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn dev_log_evaluation(
    answer: &str,
    retrieval: &RetrievalMetrics,
    groundedness: f64,
    persona: f64,
    score: &ScoreBreakdown,
) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(answer);
    // Never log raw text. Only hashed id + numbers.
    info!(
        target: "evaluate",
        %id,
        avg_score = retrieval.avg_score,
        top_score = retrieval.top_score,
        source_diversity = retrieval.source_diversity,
        groundedness,
        persona,
        overall = score.overall,
        grade = %score.grade,
        "evaluated answer"
    );
}
