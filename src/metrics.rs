use axum::{routing::get, Router};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::evaluate::EvaluationReport;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls reuse it.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// Record one finished evaluation. No-op until a recorder is installed.
pub fn record_evaluation(report: &EvaluationReport) {
    counter!("rag_evaluations_total", "grade" => report.score.grade.as_str()).increment(1);
    histogram!("rag_overall_score").record(report.score.overall);
    histogram!("rag_retrieval_avg_score").record(report.retrieval.avg_score);
    histogram!("rag_groundedness_score").record(report.groundedness);
    histogram!("rag_persona_score").record(report.persona);
}

/// Count requests rejected for bad input or config.
pub fn record_rejection(kind: &'static str) {
    counter!("rag_rejected_requests_total", "kind" => kind).increment(1);
}
