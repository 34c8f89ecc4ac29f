use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::config::{ScoringConfig, ScoringHandle};
use crate::error::ScoringError;
use crate::evaluate::{
    score_composite_with, CompositeWeights, EvaluationReport, EvaluationRequest, KeywordDensity,
    PersonaStrategy, ScoreBreakdown,
};
use crate::history::{History, HistoryEntry};
use crate::metrics::{record_evaluation, record_rejection};
use crate::retrieval::{RetrievalMetrics, RetrievalResult};

const HISTORY_CAPACITY: usize = 2000;
const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub scoring: ScoringHandle,
    pub history: Arc<History>,
}

impl AppState {
    pub fn new(scoring: ScoringHandle) -> Self {
        Self {
            scoring,
            history: Arc::new(History::with_capacity(HISTORY_CAPACITY)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/evaluate", post(evaluate))
        .route("/score/retrieval", post(score_retrieval))
        .route("/score/groundedness", post(score_groundedness))
        .route("/score/persona", post(score_persona))
        .route("/score/composite", post(score_composite))
        .route("/config", get(current_config))
        .route("/debug/history", get(debug_history))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ScoringError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Unwrap a JSON body, turning extractor rejections into our 400 error shape.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ScoringError> {
    match payload {
        Ok(Json(v)) => Ok(v),
        Err(rej) => {
            record_rejection("invalid_input");
            Err(ScoringError::InvalidInput(rej.body_text()))
        }
    }
}

async fn evaluate(
    State(state): State<AppState>,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<Json<EvaluationReport>, ScoringError> {
    let req = body(payload)?;
    let report = state.scoring.evaluator().evaluate(&req);
    debug!(overall = report.score.overall, grade = %report.score.grade, "evaluate");

    state.history.push(&report);
    record_evaluation(&report);
    Ok(Json(report))
}

#[derive(Deserialize)]
struct RetrievalReq {
    #[serde(default)]
    results: Vec<RetrievalResult>,
}

async fn score_retrieval(
    State(state): State<AppState>,
    payload: Result<Json<RetrievalReq>, JsonRejection>,
) -> Result<Json<RetrievalMetrics>, ScoringError> {
    let req = body(payload)?;
    Ok(Json(state.scoring.evaluator().score_retrieval(&req.results)))
}

#[derive(Deserialize)]
struct GroundednessReq {
    answer: String,
    #[serde(default)]
    context_chunks: Vec<String>,
}

#[derive(Serialize)]
struct GroundednessResp {
    groundedness: f64,
}

async fn score_groundedness(
    State(state): State<AppState>,
    payload: Result<Json<GroundednessReq>, JsonRejection>,
) -> Result<Json<GroundednessResp>, ScoringError> {
    let req = body(payload)?;
    let groundedness = state
        .scoring
        .evaluator()
        .score_groundedness(&req.answer, &req.context_chunks);
    Ok(Json(GroundednessResp { groundedness }))
}

#[derive(Deserialize)]
struct PersonaReq {
    answer: String,
    #[serde(default)]
    keywords: Option<Vec<String>>,
    #[serde(default)]
    calibration: Option<f64>,
}

#[derive(Serialize)]
struct PersonaResp {
    persona: f64,
}

async fn score_persona(
    State(state): State<AppState>,
    payload: Result<Json<PersonaReq>, JsonRejection>,
) -> Result<Json<PersonaResp>, ScoringError> {
    let req = body(payload)?;

    let persona = if req.keywords.is_none() && req.calibration.is_none() {
        state.scoring.evaluator().score_persona(&req.answer)
    } else {
        let cfg = state.scoring.config();
        let keywords = req.keywords.unwrap_or_else(|| cfg.persona.keywords.clone());
        let calibration = req.calibration.unwrap_or(cfg.persona.calibration);
        KeywordDensity::new(&keywords, calibration)
            .inspect_err(|e| record_rejection(e.kind()))?
            .score(&req.answer)
    };
    Ok(Json(PersonaResp { persona }))
}

#[derive(Deserialize)]
struct CompositeReq {
    retrieval: RetrievalMetrics,
    groundedness: f64,
    persona: f64,
    #[serde(default)]
    weights: Option<CompositeWeights>,
}

async fn score_composite(
    State(state): State<AppState>,
    payload: Result<Json<CompositeReq>, JsonRejection>,
) -> Result<Json<ScoreBreakdown>, ScoringError> {
    let req = body(payload)?;
    let evaluator = state.scoring.evaluator();
    let out = match req.weights {
        Some(w) => {
            w.validate().inspect_err(|e| record_rejection(e.kind()))?;
            score_composite_with(&req.retrieval, req.groundedness, req.persona, &w)
        }
        None => evaluator.score_composite(&req.retrieval, req.groundedness, req.persona),
    };
    Ok(Json(out))
}

async fn current_config(State(state): State<AppState>) -> Json<ScoringConfig> {
    Json(state.scoring.config().as_ref().clone())
}

async fn debug_history(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Vec<HistoryEntry>> {
    let limit = q
        .get("limit")
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_HISTORY_LIMIT);
    Json(state.history.snapshot_last_n(limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoring_error_maps_to_bad_request() {
        let resp = ScoringError::Configuration("nope".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
