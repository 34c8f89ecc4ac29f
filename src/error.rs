// src/error.rs
//! Library error type. The scorers themselves never fail; errors only come
//! from building inputs or configuration that break the caller contract.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ScoringError {
    /// Stable, machine-readable kind used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::InvalidInput(_) => "invalid_input",
            ScoringError::Configuration(_) => "configuration",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;
