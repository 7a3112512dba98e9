//! Error types
//!
//! The solver itself is total; only tuning overrides can be rejected.

use thiserror::Error;

/// Why a tuning override was refused
#[derive(Error, Debug)]
pub enum TuningError {
    /// Override was not valid JSON for the tuning schema
    #[error("Invalid tuning JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Sampling needs at least one candidate per pass
    #[error("Candidate count must be positive")]
    NoCandidates,

    /// Grid needs at least one row and one column
    #[error("Grid must have at least 1x1 cells, got {cols}x{rows}")]
    EmptyGrid { cols: u32, rows: u32 },

    /// Distances, margins and weights must be finite and non-negative
    #[error("Tuning value `{name}` must be finite and >= 0, got {value}")]
    OutOfRange { name: &'static str, value: f32 },
}
