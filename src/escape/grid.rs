//! Fixed-grid escape solver
//!
//! Deterministic: the valid range is split into `cols x rows` cells and the
//! cell whose center is farthest from the pointer wins.

use glam::Vec2;
use rand::Rng;

use super::{EscapeQuery, Placement};
use crate::geometry::{Rect, placement_range};
use crate::tuning::GridTuning;

#[derive(Debug, Clone, Default)]
pub struct GridSolver {
    tuning: GridTuning,
}

impl GridSolver {
    pub fn new(tuning: GridTuning) -> Self {
        Self { tuning }
    }

    /// Top-left positions at the center of every grid cell, row-major
    pub fn cells(&self, min: Vec2, max: Vec2) -> impl Iterator<Item = Vec2> + '_ {
        let span = max - min;
        let cols = self.tuning.cols.max(1);
        let rows = self.tuning.rows.max(1);
        (0..rows).flat_map(move |row| {
            (0..cols).map(move |col| {
                Vec2::new(
                    min.x + (col as f32 + 0.5) / cols as f32 * span.x,
                    min.y + (row as f32 + 0.5) / rows as f32 * span.y,
                )
            })
        })
    }
}

impl Placement for GridSolver {
    fn place<R: Rng + ?Sized>(&mut self, query: &EscapeQuery, _rng: &mut R) -> Vec2 {
        if query.is_degenerate() {
            return query.fallback();
        }
        let size = query.moving.size();
        let Some((min, max)) = placement_range(&query.container, size, self.tuning.padding) else {
            return query.fallback();
        };
        let half = Vec2::new(size.width, size.height) * 0.5;

        let mut best: Option<(Vec2, f32)> = None;
        for top_left in self.cells(min, max) {
            if Rect::at(top_left, size).intersects_padded(&query.safe, self.tuning.safe_margin) {
                continue;
            }
            let dist = (top_left + half).distance(query.pointer);
            if best.is_none_or(|(_, d)| dist > d) {
                best = Some((top_left, dist));
            }
        }

        match best {
            Some((top_left, _)) => top_left,
            None => {
                log::debug!("Every grid cell overlaps the safe element");
                query.fallback()
            }
        }
    }
}
