//! Composite score: weighted blend of retrieval, groundedness and persona,
//! expressed as a percentage with a letter grade.
//!
//! overall = 100 × (w_r·retrieval.avg_score + w_g·groundedness + w_p·persona)
//!
//! Weights are expected to sum to 1.0. That is a caller contract: weights
//! that don't are accepted (and logged), while negative, non-finite or
//! all-zero weights are rejected as a configuration error.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ScoringError};
use crate::retrieval::RetrievalMetrics;
use crate::text::round_to;

/// Missing fields fall back to the defaults when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub retrieval: f64,
    pub groundedness: f64,
    pub persona: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            retrieval: 0.4,
            groundedness: 0.4,
            persona: 0.2,
        }
    }
}

impl CompositeWeights {
    pub fn new(retrieval: f64, groundedness: f64, persona: f64) -> Result<Self> {
        let w = Self {
            retrieval,
            groundedness,
            persona,
        };
        w.validate()?;
        Ok(w)
    }

    /// Reject weights that can't form a usable blend.
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("retrieval", self.retrieval),
            ("groundedness", self.groundedness),
            ("persona", self.persona),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ScoringError::Configuration(format!(
                    "weight '{name}' must be a non-negative number, got {v}"
                )));
            }
        }
        if self.sum() <= 0.0 {
            return Err(ScoringError::Configuration(
                "composite weights must not all be zero".into(),
            ));
        }
        if (self.sum() - 1.0).abs() > 1e-6 {
            tracing::warn!(
                sum = self.sum(),
                "composite weights do not sum to 1.0; overall score is not normalized"
            );
        }
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.retrieval + self.groundedness + self.persona
    }
}

/// Letter grade on the overall percentage. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_percent(overall: f64) -> Self {
        if overall >= 80.0 {
            Grade::A
        } else if overall >= 70.0 {
            Grade::B
        } else if overall >= 60.0 {
            Grade::C
        } else if overall >= 50.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Component percentages, each rounded to 1 decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentBreakdown {
    pub retrieval: f64,
    pub groundedness: f64,
    pub persona: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub overall: f64,
    pub breakdown: ComponentBreakdown,
    pub grade: Grade,
}

/// Composite score with the default 0.4 / 0.4 / 0.2 weights.
pub fn score_composite(
    retrieval: &RetrievalMetrics,
    groundedness: f64,
    persona: f64,
) -> ScoreBreakdown {
    score_composite_with(
        retrieval,
        groundedness,
        persona,
        &CompositeWeights::default(),
    )
}

/// Composite score with explicit weights. Pure arithmetic; never fails.
/// The grade is taken from the rounded overall so number and letter agree.
/// Older reports graded the unrounded blend instead, so a blend of 0.7996
/// read `80.0`/`B` there and reads `80.0`/`A` here.
pub fn score_composite_with(
    retrieval: &RetrievalMetrics,
    groundedness: f64,
    persona: f64,
    weights: &CompositeWeights,
) -> ScoreBreakdown {
    let retrieval_score = retrieval.avg_score;
    let blended = weights.retrieval * retrieval_score
        + weights.groundedness * groundedness
        + weights.persona * persona;

    let overall = percent(blended);

    ScoreBreakdown {
        overall,
        breakdown: ComponentBreakdown {
            retrieval: percent(retrieval_score),
            groundedness: percent(groundedness),
            persona: percent(persona),
        },
        grade: Grade::from_percent(overall),
    }
}

/// Fraction → percentage in [0,100], 1 decimal.
fn percent(x: f64) -> f64 {
    round_to((x * 100.0).clamp(0.0, 100.0), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(avg: f64) -> RetrievalMetrics {
        RetrievalMetrics {
            avg_score: avg,
            top_score: avg,
            source_diversity: 1.0,
        }
    }

    #[test]
    fn perfect_inputs_grade_a() {
        let s = score_composite(&metrics(1.0), 1.0, 1.0);
        assert_eq!(s.overall, 100.0);
        assert_eq!(s.grade, Grade::A);
        assert_eq!(s.breakdown.retrieval, 100.0);
        assert_eq!(s.breakdown.groundedness, 100.0);
        assert_eq!(s.breakdown.persona, 100.0);
    }

    #[test]
    fn zero_inputs_grade_f() {
        let s = score_composite(&RetrievalMetrics::default(), 0.0, 0.0);
        assert_eq!(s.overall, 0.0);
        assert_eq!(s.grade, Grade::F);
    }

    #[test]
    fn weighted_blend_is_rounded() {
        // 0.4*0.812 + 0.4*0.667 + 0.2*0.4 = 0.6716 → 67.2
        let s = score_composite(&metrics(0.812), 0.667, 0.4);
        assert_eq!(s.overall, 67.2);
        assert_eq!(s.grade, Grade::C);
        assert_eq!(s.breakdown.retrieval, 81.2);
        assert_eq!(s.breakdown.groundedness, 66.7);
        assert_eq!(s.breakdown.persona, 40.0);
    }

    #[test]
    fn uniform_point_eight_is_an_a() {
        // the raw float blend is not exactly 0.8; the rounded overall decides
        let s = score_composite(&metrics(0.8), 0.8, 0.8);
        assert_eq!(s.overall, 80.0);
        assert_eq!(s.grade, Grade::A);
    }

    #[test]
    fn grade_boundaries_are_closed_below() {
        assert_eq!(Grade::from_percent(80.0), Grade::A);
        assert_eq!(Grade::from_percent(79.9), Grade::B);
        assert_eq!(Grade::from_percent(70.0), Grade::B);
        assert_eq!(Grade::from_percent(69.9), Grade::C);
        assert_eq!(Grade::from_percent(60.0), Grade::C);
        assert_eq!(Grade::from_percent(50.0), Grade::D);
        assert_eq!(Grade::from_percent(49.9), Grade::F);
    }

    #[test]
    fn custom_weights() {
        let w = CompositeWeights::new(1.0, 0.0, 0.0).expect("valid");
        let s = score_composite_with(&metrics(0.55), 1.0, 1.0, &w);
        assert_eq!(s.overall, 55.0);
        assert_eq!(s.grade, Grade::D);
    }

    #[test]
    fn rejects_negative_nan_and_zero_weights() {
        assert!(matches!(
            CompositeWeights::new(-0.1, 0.6, 0.5),
            Err(ScoringError::Configuration(_))
        ));
        assert!(CompositeWeights::new(f64::NAN, 0.5, 0.5).is_err());
        assert!(CompositeWeights::new(0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn unnormalized_weights_are_accepted() {
        assert!(CompositeWeights::new(1.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn grade_serializes_as_letter() {
        let v = serde_json::to_value(Grade::B).unwrap();
        assert_eq!(v, serde_json::json!("B"));
        assert_eq!(Grade::F.to_string(), "F");
    }
}
