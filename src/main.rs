//! Scoring service — binary entrypoint.
//! Boots the Axum HTTP server with the scoring routes and Prometheus metrics.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("persona_rag_eval=info,warn"));

    // Shuttle may already have installed a subscriber; ignore that case.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables SCORING_CONFIG_PATH / SCORING_HOT_RELOAD / EVAL_DEV_LOG from .env.
    let _ = dotenvy::dotenv();

    init_tracing();

    let router = persona_rag_eval::app()?;
    Ok(router.into())
}
