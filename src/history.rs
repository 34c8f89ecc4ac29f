//! history.rs — bounded in-memory log of recent evaluations for diagnostics.

use serde::Serialize;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::evaluate::{ComponentBreakdown, EvaluationReport, Grade};

const MAX_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub ts_unix: u64,
    pub overall: f64,
    pub grade: Grade,
    pub breakdown: ComponentBreakdown,
    pub source_diversity: f64,
}

#[derive(Debug)]
pub struct History {
    inner: Mutex<Vec<HistoryEntry>>,
    cap: usize,
}

impl History {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(1, MAX_CAPACITY);
        Self {
            inner: Mutex::new(Vec::with_capacity(cap)),
            cap,
        }
    }

    pub fn push(&self, report: &EvaluationReport) {
        let entry = HistoryEntry {
            ts_unix: now_unix(),
            overall: report.score.overall,
            grade: report.score.grade,
            breakdown: report.score.breakdown,
            source_diversity: report.retrieval.source_diversity,
        };

        let mut v = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        v.push(entry);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    /// Last `n` entries, oldest first.
    pub fn snapshot_last_n(&self, n: usize) -> Vec<HistoryEntry> {
        let v = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let start = v.len().saturating_sub(n);
        v[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::{EvaluationRequest, Evaluator};

    fn report(answer: &str) -> EvaluationReport {
        Evaluator::default().evaluate(&EvaluationRequest {
            answer: answer.into(),
            ..Default::default()
        })
    }

    #[test]
    fn keeps_only_the_newest_entries() {
        let h = History::with_capacity(2);
        h.push(&report("a"));
        h.push(&report("b"));
        h.push(&report("c"));
        assert_eq!(h.len(), 2);
        assert_eq!(h.snapshot_last_n(10).len(), 2);
        assert_eq!(h.snapshot_last_n(1).len(), 1);
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let h = History::with_capacity(0);
        assert!(h.is_empty());
        h.push(&report("x"));
        assert_eq!(h.len(), 1);
        assert_eq!(h.snapshot_last_n(5)[0].grade, Grade::F);
    }
}
