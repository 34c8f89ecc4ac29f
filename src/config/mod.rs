// src/config/mod.rs
//! Config discovery and the shared, hot-swappable evaluator handle.

pub mod scoring;

pub use scoring::{GroundednessConfig, PersonaConfig, PipelineConfig, ScoringConfig};

use anyhow::{anyhow, Context};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

use crate::evaluate::Evaluator;

// --- env defaults & names ---
pub const DEFAULT_SCORING_CONFIG_PATH: &str = "config/scoring.toml";
pub const FALLBACK_SCORING_CONFIG_JSON: &str = "config/scoring.json";
pub const ENV_SCORING_CONFIG_PATH: &str = "SCORING_CONFIG_PATH";
pub const ENV_SCORING_HOT_RELOAD: &str = "SCORING_HOT_RELOAD";

/// Dev environment: debug build OR SHUTTLE_ENV in {local, development, dev}.
pub fn is_dev_env() -> bool {
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Load a config from an explicit path. `.json` is parsed as JSON, anything else as TOML.
pub fn load_config_from(path: &Path) -> anyhow::Result<ScoringConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading scoring config from {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let cfg = if is_json {
        ScoringConfig::from_json_str(&content)
    } else {
        ScoringConfig::from_toml_str(&content)
    };
    cfg.with_context(|| format!("parsing scoring config {}", path.display()))
}

/// Load config using env var + fallbacks:
/// 1) $SCORING_CONFIG_PATH (must exist)
/// 2) config/scoring.toml
/// 3) config/scoring.json
/// 4) built-in defaults
///
/// Returns the config and the path it came from (if any).
pub fn load_config_default() -> anyhow::Result<(ScoringConfig, Option<PathBuf>)> {
    if let Ok(p) = std::env::var(ENV_SCORING_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!(
                "{ENV_SCORING_CONFIG_PATH} points to non-existent path {}",
                pb.display()
            ));
        }
        let cfg = load_config_from(&pb)?;
        return Ok((cfg, Some(pb)));
    }
    for candidate in [DEFAULT_SCORING_CONFIG_PATH, FALLBACK_SCORING_CONFIG_JSON] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            let cfg = load_config_from(&pb)?;
            return Ok((cfg, Some(pb)));
        }
    }
    info!("no scoring config found; using built-in defaults");
    Ok((ScoringConfig::default(), None))
}

/* ----------------------------
Thread-safe handle + hot reload
---------------------------- */

#[derive(Debug)]
struct Loaded {
    config: Arc<ScoringConfig>,
    evaluator: Arc<Evaluator>,
}

/// Shared handle to the active config and evaluator.
/// Readers get an `Arc` snapshot, so a reload never changes a request mid-flight.
#[derive(Clone, Debug)]
pub struct ScoringHandle {
    inner: Arc<RwLock<Loaded>>,
}

impl ScoringHandle {
    pub fn new(config: ScoringConfig) -> crate::error::Result<Self> {
        let loaded = Self::build(config)?;
        Ok(Self {
            inner: Arc::new(RwLock::new(loaded)),
        })
    }

    fn build(config: ScoringConfig) -> crate::error::Result<Loaded> {
        let evaluator = Evaluator::from_config(&config)?;
        Ok(Loaded {
            config: Arc::new(config),
            evaluator: Arc::new(evaluator),
        })
    }

    /// Current evaluator snapshot.
    pub fn evaluator(&self) -> Arc<Evaluator> {
        match self.inner.read() {
            Ok(g) => g.evaluator.clone(),
            Err(poisoned) => poisoned.into_inner().evaluator.clone(),
        }
    }

    /// Current config snapshot.
    pub fn config(&self) -> Arc<ScoringConfig> {
        match self.inner.read() {
            Ok(g) => g.config.clone(),
            Err(poisoned) => poisoned.into_inner().config.clone(),
        }
    }

    /// Validate and atomically swap in a new config. On error the old one stays active.
    pub fn replace(&self, config: ScoringConfig) -> crate::error::Result<()> {
        let loaded = Self::build(config)?;
        let mut guard = match self.inner.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = loaded;
        Ok(())
    }
}

/// Returns true if we should enable hot reload (dev/local only).
fn hot_reload_enabled() -> bool {
    let want = std::env::var(ENV_SCORING_HOT_RELOAD)
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false);
    want && is_dev_env()
}

/// Start a simple polling watcher on `path` to hot-reload into `handle`.
/// Polls mtime every 2s.
pub fn start_hot_reload_thread(handle: ScoringHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }
    info!(path = %path.display(), "scoring config hot reload enabled");

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            if let Ok(mtime) = fs::metadata(&path).and_then(|m| m.modified()) {
                let changed = match last_mtime {
                    None => {
                        last_mtime = Some(mtime);
                        false
                    }
                    Some(prev) => mtime > prev,
                };
                if changed {
                    reload_once(&handle, &path);
                    last_mtime = Some(mtime);
                }
            }
            // File missing or unreadable; keep trying.
            thread::sleep(poll);
        }
    });
}

/// Reload `path` into `handle`; bad configs are logged and ignored.
pub fn reload_once(handle: &ScoringHandle, path: &Path) -> bool {
    let result = load_config_from(path).and_then(|cfg| handle.replace(cfg).map_err(Into::into));
    match result {
        Ok(()) => {
            info!(path = %path.display(), "scoring config reloaded");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "scoring config reload rejected");
            false
        }
    }
}
