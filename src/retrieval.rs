// src/retrieval.rs
//! # Retrieval scoring
//!
//! Summarizes the candidates returned by the vector search for one query:
//! mean similarity, top similarity, and how much of the known source
//! universe (LinkedIn posts, YouTube transcripts) the results drew from.
//!
//! Diversity is measured against a fixed `known_source_count`, not against
//! the number of sources seen in the request. A single-channel result set
//! therefore reads 0.5 with the default two channels.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Result, ScoringError};
use crate::text::round_to;

/// Number of content channels the corpus is ingested from.
pub const DEFAULT_KNOWN_SOURCE_COUNT: usize = 2;

/// Source tags used by the ingestion pipeline.
pub const SOURCE_LINKEDIN: &str = "linkedin";
pub const SOURCE_YOUTUBE: &str = "youtube";

/// One retrieved candidate. The score is optional (some vector stores omit
/// it); when present it is finite and non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRetrievalResult")]
pub struct RetrievalResult {
    score: Option<f64>,
    source: String,
}

#[derive(Deserialize)]
struct RawRetrievalResult {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    source: String,
}

impl TryFrom<RawRetrievalResult> for RetrievalResult {
    type Error = ScoringError;

    fn try_from(raw: RawRetrievalResult) -> Result<Self> {
        match raw.score {
            Some(s) => RetrievalResult::new(s, raw.source),
            None => Ok(RetrievalResult::unscored(raw.source)),
        }
    }
}

impl RetrievalResult {
    /// Scored candidate. Rejects negative and non-finite scores.
    pub fn new(score: f64, source: impl Into<String>) -> Result<Self> {
        if !score.is_finite() {
            return Err(ScoringError::InvalidInput(format!(
                "similarity score must be finite, got {score}"
            )));
        }
        if score < 0.0 {
            return Err(ScoringError::InvalidInput(format!(
                "similarity score must be non-negative, got {score}"
            )));
        }
        Ok(Self {
            score: Some(score),
            source: source.into(),
        })
    }

    /// Candidate without a similarity score. It still counts toward diversity.
    pub fn unscored(source: impl Into<String>) -> Self {
        Self {
            score: None,
            source: source.into(),
        }
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Aggregate retrieval quality for one request. All fields rounded to 3 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RetrievalMetrics {
    pub avg_score: f64,
    pub top_score: f64,
    pub source_diversity: f64,
}

/// Score a result list against the default two-channel universe.
pub fn score_retrieval(results: &[RetrievalResult]) -> RetrievalMetrics {
    score_retrieval_with(results, DEFAULT_KNOWN_SOURCE_COUNT)
}

/// Score a result list. `known_source_count` of 0 is treated as 1 so the
/// ratio stays defined; validated configs never pass 0.
pub fn score_retrieval_with(
    results: &[RetrievalResult],
    known_source_count: usize,
) -> RetrievalMetrics {
    if results.is_empty() {
        return RetrievalMetrics::default();
    }

    let scores: Vec<f64> = results.iter().filter_map(|r| r.score).collect();
    let (avg, top) = if scores.is_empty() {
        (0.0, 0.0)
    } else {
        let sum: f64 = scores.iter().sum();
        let top = scores.iter().copied().fold(f64::MIN, f64::max);
        (sum / scores.len() as f64, top)
    };

    let distinct: HashSet<&str> = results.iter().map(|r| r.source.as_str()).collect();
    let diversity = distinct.len() as f64 / known_source_count.max(1) as f64;

    RetrievalMetrics {
        avg_score: round_to(avg, 3),
        top_score: round_to(top, 3),
        source_diversity: round_to(diversity, 3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(score: f64, src: &str) -> RetrievalResult {
        RetrievalResult::new(score, src).expect("valid result")
    }

    #[test]
    fn empty_input_yields_zero_metrics() {
        assert_eq!(score_retrieval(&[]), RetrievalMetrics::default());
    }

    #[test]
    fn mean_top_and_mixed_sources() {
        let m = score_retrieval(&[
            r(0.9, SOURCE_LINKEDIN),
            r(0.8, SOURCE_YOUTUBE),
            r(0.7, SOURCE_LINKEDIN),
        ]);
        assert_eq!(m.avg_score, 0.8);
        assert_eq!(m.top_score, 0.9);
        assert_eq!(m.source_diversity, 1.0);
    }

    #[test]
    fn single_channel_reads_half() {
        let m = score_retrieval(&[r(0.5, SOURCE_YOUTUBE), r(0.4, SOURCE_YOUTUBE)]);
        assert_eq!(m.source_diversity, 0.5);
    }

    #[test]
    fn unscored_results_only_count_for_diversity() {
        let m = score_retrieval(&[
            r(0.6, SOURCE_LINKEDIN),
            RetrievalResult::unscored(SOURCE_YOUTUBE),
        ]);
        assert_eq!(m.avg_score, 0.6);
        assert_eq!(m.top_score, 0.6);
        assert_eq!(m.source_diversity, 1.0);

        let none = score_retrieval(&[RetrievalResult::unscored(SOURCE_LINKEDIN)]);
        assert_eq!(none.avg_score, 0.0);
        assert_eq!(none.top_score, 0.0);
        assert_eq!(none.source_diversity, 0.5);
    }

    #[test]
    fn scores_above_one_are_not_capped() {
        let m = score_retrieval(&[r(1.4, SOURCE_LINKEDIN)]);
        assert_eq!(m.top_score, 1.4);
    }

    #[test]
    fn unknown_channels_can_push_diversity_past_one() {
        let m = score_retrieval(&[r(0.5, "linkedin"), r(0.5, "youtube"), r(0.5, "podcast")]);
        assert_eq!(m.source_diversity, 1.5);
    }

    #[test]
    fn custom_known_source_count() {
        let m = score_retrieval_with(&[r(0.5, "linkedin"), r(0.5, "youtube")], 4);
        assert_eq!(m.source_diversity, 0.5);
    }

    #[test]
    fn rejects_negative_and_non_finite_scores() {
        assert!(matches!(
            RetrievalResult::new(-0.1, "linkedin"),
            Err(ScoringError::InvalidInput(_))
        ));
        assert!(RetrievalResult::new(f64::NAN, "linkedin").is_err());
        assert!(RetrievalResult::new(f64::INFINITY, "linkedin").is_err());
    }

    #[test]
    fn deserialize_validates_and_allows_missing_score() {
        let ok: Vec<RetrievalResult> =
            serde_json::from_str(r#"[{"score":0.7,"source":"linkedin"},{"source":"youtube"}]"#)
                .expect("parse");
        assert_eq!(ok[0].score(), Some(0.7));
        assert_eq!(ok[1].score(), None);

        let bad = serde_json::from_str::<RetrievalResult>(r#"{"score":-1.0,"source":"x"}"#);
        assert!(bad.is_err());
        let non_numeric = serde_json::from_str::<RetrievalResult>(r#"{"score":"high","source":"x"}"#);
        assert!(non_numeric.is_err());
    }
}
