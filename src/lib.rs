// src/lib.rs
// Public library surface for integration tests (and reuse by a serving layer).

pub mod api;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod history;
pub mod metrics;
pub mod pipeline;
pub mod retrieval;
pub mod text;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::{ScoringConfig, ScoringHandle};
pub use crate::error::{Result, ScoringError};
pub use crate::evaluate::{
    score_composite, score_composite_with, score_groundedness, score_persona, score_persona_with,
    CompositeWeights, EvaluationReport, EvaluationRequest, Evaluator, Grade, ScoreBreakdown,
};
pub use crate::retrieval::{
    score_retrieval, score_retrieval_with, RetrievalMetrics, RetrievalResult,
};

/// Build the full HTTP app (scoring routes + `/metrics`) from discovered config.
/// Also starts the dev-only config hot reload when enabled.
pub fn app() -> anyhow::Result<axum::Router> {
    let (cfg, path) = config::load_config_default()?;
    let handle = ScoringHandle::new(cfg)?;
    if let Some(p) = path {
        tracing::info!(path = %p.display(), "loaded scoring config");
        config::start_hot_reload_thread(handle.clone(), p);
    }

    let metrics = metrics::Metrics::init()?;
    let router = api::router(AppState::new(handle)).merge(metrics.router());
    Ok(router)
}
