//! Data-driven escape tuning
//!
//! Each solver variant carries its own constants; the two sets are tuned
//! independently and are not interchangeable. Pages may override any field
//! with a JSON object in the card's `data-tuning` attribute.

use serde::{Deserialize, Serialize};

use crate::error::TuningError;

/// Constants for the random-sampling solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingTuning {
    /// Inset from the container edges (px)
    pub padding: f32,
    /// Candidates sampled per pass
    pub candidates: u32,
    /// Columns of the grid candidates are spread over, one per cell
    pub strata_cols: u32,
    pub strata_rows: u32,
    /// Also try the four corners of the valid range
    pub corner_candidates: bool,
    /// Max random offset added to each candidate on both axes (px)
    pub jitter: f32,
    /// Clearance kept around the safe element (px)
    pub safe_margin: f32,
    /// Candidates closer than this to a recent center are dropped (px)
    pub anti_repeat_distance: f32,
    /// Score weight for distance to the pointer
    pub pointer_weight: f32,
    /// Score weight for distance to the safe element's center
    pub safe_weight: f32,
    /// Score weight for distance to the container's center
    pub center_weight: f32,
}

impl Default for SamplingTuning {
    fn default() -> Self {
        Self {
            padding: 20.0,
            candidates: 35,
            strata_cols: 7,
            strata_rows: 5,
            corner_candidates: true,
            jitter: 10.0,
            safe_margin: 28.0,
            anti_repeat_distance: 120.0,
            pointer_weight: 2.0,
            safe_weight: 1.0,
            center_weight: 0.2,
        }
    }
}

/// Constants for the fixed-grid solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridTuning {
    pub padding: f32,
    pub cols: u32,
    pub rows: u32,
    pub safe_margin: f32,
}

impl Default for GridTuning {
    fn default() -> Self {
        Self {
            padding: 20.0,
            cols: 7,
            rows: 5,
            safe_margin: 16.0,
        }
    }
}

/// All tunable solver constants
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub sampling: SamplingTuning,
    pub grid: GridTuning,
}

impl Tuning {
    /// Parse a (possibly partial) JSON override; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Parse an optional override, falling back to defaults with a warning
    pub fn from_json_or_default(json: Option<&str>) -> Self {
        match json.map(Self::from_json) {
            Some(Ok(tuning)) => {
                log::info!("Loaded tuning override");
                tuning
            }
            Some(Err(e)) => {
                log::warn!("Ignoring tuning override: {}", e);
                Self::default()
            }
            None => Self::default(),
        }
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let s = &self.sampling;
        if s.candidates == 0 {
            return Err(TuningError::NoCandidates);
        }
        if s.strata_cols == 0 || s.strata_rows == 0 {
            return Err(TuningError::EmptyGrid {
                cols: s.strata_cols,
                rows: s.strata_rows,
            });
        }
        let g = &self.grid;
        if g.cols == 0 || g.rows == 0 {
            return Err(TuningError::EmptyGrid {
                cols: g.cols,
                rows: g.rows,
            });
        }
        for (name, value) in [
            ("sampling.padding", s.padding),
            ("sampling.jitter", s.jitter),
            ("sampling.safe_margin", s.safe_margin),
            ("sampling.anti_repeat_distance", s.anti_repeat_distance),
            ("sampling.pointer_weight", s.pointer_weight),
            ("sampling.safe_weight", s.safe_weight),
            ("sampling.center_weight", s.center_weight),
            ("grid.padding", g.padding),
            ("grid.safe_margin", g.safe_margin),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TuningError::OutOfRange { name, value });
            }
        }
        Ok(())
    }
}
