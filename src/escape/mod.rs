//! Escape position solvers
//!
//! Given the pointer and the current layout, pick a new top-left position for
//! the moving element that stays inside the container, clears the safe
//! element and gets away from the pointer. Solvers are total: degenerate
//! geometry or an empty candidate set yields the element's current position.
//!
//! Two strategies exist and are selected, never blended:
//! - `sampling`: random candidates with jitter, repeat avoidance and a weighted score
//! - `grid`: fixed grid, farthest cell from the pointer

pub mod grid;
pub mod history;
pub mod sampling;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use grid::GridSolver;
pub use history::RingBuffer;
pub use sampling::SamplingSolver;

use crate::geometry::Rect;
use crate::tuning::Tuning;

/// Everything a solver needs for one placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscapeQuery {
    /// Pointer or touch position
    pub pointer: Vec2,
    /// Bounds the moving element must stay inside
    pub container: Rect,
    /// Element that must never be covered
    pub safe: Rect,
    /// Moving element as currently laid out (size + fallback position)
    pub moving: Rect,
}

impl EscapeQuery {
    /// Position returned when no placement is possible
    pub fn fallback(&self) -> Vec2 {
        let pos = self.moving.top_left();
        if pos.is_finite() { pos } else { Vec2::ZERO }
    }

    /// Geometry the solvers refuse to work with
    pub fn is_degenerate(&self) -> bool {
        !self.pointer.is_finite()
            || self.container.is_degenerate()
            || self.safe.is_degenerate()
            || self.moving.is_degenerate()
    }
}

/// A placement strategy
pub trait Placement {
    /// New top-left for the moving element
    fn place<R: Rng + ?Sized>(&mut self, query: &EscapeQuery, rng: &mut R) -> Vec2;

    /// Forget any per-session memory
    fn reset(&mut self) {}
}

/// Which solver drives the moving element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapeStrategy {
    #[default]
    Sampling,
    Grid,
}

impl EscapeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscapeStrategy::Sampling => "sampling",
            EscapeStrategy::Grid => "grid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sampling" | "random" => Some(EscapeStrategy::Sampling),
            "grid" => Some(EscapeStrategy::Grid),
            _ => None,
        }
    }
}

/// Runtime-selected solver
#[derive(Debug, Clone)]
pub enum EscapeSolver {
    Sampling(SamplingSolver),
    Grid(GridSolver),
}

impl EscapeSolver {
    pub fn new(strategy: EscapeStrategy, tuning: &Tuning) -> Self {
        match strategy {
            EscapeStrategy::Sampling => Self::Sampling(SamplingSolver::new(tuning.sampling.clone())),
            EscapeStrategy::Grid => Self::Grid(GridSolver::new(tuning.grid.clone())),
        }
    }

    pub fn strategy(&self) -> EscapeStrategy {
        match self {
            Self::Sampling(_) => EscapeStrategy::Sampling,
            Self::Grid(_) => EscapeStrategy::Grid,
        }
    }
}

impl Placement for EscapeSolver {
    fn place<R: Rng + ?Sized>(&mut self, query: &EscapeQuery, rng: &mut R) -> Vec2 {
        match self {
            Self::Sampling(s) => s.place(query, rng),
            Self::Grid(g) => g.place(query, rng),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Sampling(s) => s.reset(),
            Self::Grid(g) => g.reset(),
        }
    }
}
