//! Random-sampling escape solver
//!
//! Candidates are spread over the valid range one per cell of a coarse
//! grid (uniform inside the cell), plus the range corners where the
//! distance score peaks. Each gets a small jitter. Candidates that crowd
//! the safe element or revisit a recent spot are dropped and the best
//! scoring survivor wins. When nothing survives, repeat avoidance is
//! relaxed to the last spot only and the pass runs once more.

use glam::Vec2;
use rand::Rng;

use super::history::RingBuffer;
use super::{EscapeQuery, Placement};
use crate::geometry::{Rect, placement_range};
use crate::tuning::SamplingTuning;

/// Recent centers remembered for repeat avoidance
pub const HISTORY_LEN: usize = 4;

/// Passes per placement: strict, then avoiding only the last spot
const MAX_PASSES: usize = 2;

/// A provisional position evaluated during one placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub top_left: Vec2,
    pub center: Vec2,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct SamplingSolver {
    tuning: SamplingTuning,
    history: RingBuffer<Vec2, HISTORY_LEN>,
}

impl Default for SamplingSolver {
    fn default() -> Self {
        Self::new(SamplingTuning::default())
    }
}

impl SamplingSolver {
    pub fn new(tuning: SamplingTuning) -> Self {
        Self {
            tuning,
            history: RingBuffer::new(),
        }
    }

    /// Centers chosen by recent placements, oldest first
    pub fn history(&self) -> &RingBuffer<Vec2, HISTORY_LEN> {
        &self.history
    }

    /// Desirability of a candidate center; higher is better
    pub fn score(&self, center: Vec2, query: &EscapeQuery) -> f32 {
        let t = &self.tuning;
        center.distance(query.pointer) * t.pointer_weight
            + center.distance(query.safe.center()) * t.safe_weight
            + center.distance(query.container.center()) * t.center_weight
    }

    fn near_recent(&self, center: Vec2) -> bool {
        self.history
            .iter()
            .any(|recent| center.distance(*recent) < self.tuning.anti_repeat_distance)
    }

    /// Un-jittered sample points: one per stratum, then the four range corners
    fn sample_points<R: Rng + ?Sized>(&self, min: Vec2, max: Vec2, rng: &mut R) -> Vec<Vec2> {
        let span = max - min;
        let cols = self.tuning.strata_cols.max(1);
        let rows = self.tuning.strata_rows.max(1);
        let cells = cols * rows;

        let mut points = Vec::with_capacity(self.tuning.candidates as usize + 4);
        for i in 0..self.tuning.candidates {
            let cell = i % cells;
            let (col, row) = ((cell % cols) as f32, (cell / cols) as f32);
            points.push(Vec2::new(
                min.x + (col + rng.random::<f32>()) / cols as f32 * span.x,
                min.y + (row + rng.random::<f32>()) / rows as f32 * span.y,
            ));
        }
        if self.tuning.corner_candidates {
            points.extend([min, Vec2::new(max.x, min.y), Vec2::new(min.x, max.y), max]);
        }
        points
    }

    /// One sampling pass over the valid range `[min, max]`
    fn best_candidate<R: Rng + ?Sized>(
        &self,
        query: &EscapeQuery,
        min: Vec2,
        max: Vec2,
        rng: &mut R,
    ) -> Option<Candidate> {
        let size = query.moving.size();
        let half = Vec2::new(size.width, size.height) * 0.5;
        let jitter = self.tuning.jitter;
        let mut best: Option<Candidate> = None;

        for base in self.sample_points(min, max, rng) {
            let offset = Vec2::new(
                (rng.random::<f32>() * 2.0 - 1.0) * jitter,
                (rng.random::<f32>() * 2.0 - 1.0) * jitter,
            );
            let top_left = (base + offset).clamp(min, max);

            if Rect::at(top_left, size).intersects_padded(&query.safe, self.tuning.safe_margin) {
                continue;
            }
            let center = top_left + half;
            if self.near_recent(center) {
                continue;
            }

            let score = self.score(center, query);
            if best.is_none_or(|b| score > b.score) {
                best = Some(Candidate {
                    top_left,
                    center,
                    score,
                });
            }
        }
        best
    }
}

impl Placement for SamplingSolver {
    fn place<R: Rng + ?Sized>(&mut self, query: &EscapeQuery, rng: &mut R) -> Vec2 {
        if query.is_degenerate() {
            log::debug!("Degenerate layout, keeping current position");
            return query.fallback();
        }
        let Some((min, max)) = placement_range(&query.container, query.moving.size(), self.tuning.padding)
        else {
            log::debug!("Moving element does not fit its container");
            return query.fallback();
        };

        for pass in 0..MAX_PASSES {
            if let Some(best) = self.best_candidate(query, min, max, rng) {
                self.history.push(best.center);
                return best.top_left;
            }
            if pass + 1 < MAX_PASSES {
                log::debug!("No escape candidate survived, avoiding only the last spot");
                self.history.retain_newest();
            }
        }

        // Start clean next time so a tight layout cannot pin the element
        log::debug!("No escape candidate after relaxing, keeping current position");
        self.history.clear();
        query.fallback()
    }

    fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn scenario() -> EscapeQuery {
        EscapeQuery {
            pointer: Vec2::new(350.0, 20.0),
            container: Rect::from_ltrb(0.0, 0.0, 400.0, 300.0),
            safe: Rect::from_ltrb(150.0, 130.0, 250.0, 170.0),
            moving: Rect::from_ltwh(260.0, 180.0, 100.0, 40.0),
        }
    }

    #[test]
    fn test_score_weights() {
        let solver = SamplingSolver::default();
        let q = EscapeQuery {
            pointer: Vec2::new(0.0, 0.0),
            container: Rect::from_ltrb(0.0, 0.0, 20.0, 20.0),
            safe: Rect::from_ltrb(0.0, 0.0, 20.0, 20.0),
            moving: Rect::from_ltwh(0.0, 0.0, 1.0, 1.0),
        };
        // Safe and container centers coincide with the candidate
        let s = solver.score(Vec2::new(10.0, 10.0), &q);
        let expected = Vec2::new(10.0, 10.0).length() * 2.0;
        assert!((s - expected).abs() < 1e-3);
    }

    #[test]
    fn test_dense_sampling_finds_bottom_left_corner() {
        // With enough samples the global optimum region is always found
        let tuning = SamplingTuning {
            candidates: 1000,
            ..SamplingTuning::default()
        };
        for seed in 0..50 {
            let mut solver = SamplingSolver::new(tuning.clone());
            let mut rng = Pcg32::seed_from_u64(seed);
            let q = scenario();
            let pos = solver.place(&q, &mut rng);
            let center = pos + Vec2::new(50.0, 20.0);
            assert!(!Rect::at(pos, Size::new(100.0, 40.0)).intersects_padded(&q.safe, 28.0));
            assert!(
                center.x < 200.0 && center.y > 150.0,
                "seed {seed}: center {center} not bottom-left"
            );
        }
    }

    #[test]
    fn test_history_is_recorded_and_bounded() {
        let mut solver = SamplingSolver::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let q = EscapeQuery {
            pointer: Vec2::new(600.0, 400.0),
            container: Rect::from_ltrb(0.0, 0.0, 1200.0, 800.0),
            safe: Rect::from_ltwh(550.0, 380.0, 100.0, 40.0),
            moving: Rect::from_ltwh(700.0, 380.0, 80.0, 40.0),
        };
        for i in 1..=6 {
            let pos = solver.place(&q, &mut rng);
            assert_eq!(solver.history().newest(), Some(&(pos + Vec2::new(40.0, 20.0))));
            assert_eq!(solver.history().len(), i.min(HISTORY_LEN));
        }
    }

    #[test]
    fn test_single_spot_is_not_repeated() {
        // Room for exactly one spot: the relaxed pass still avoids the last one
        let mut solver = SamplingSolver::new(SamplingTuning {
            jitter: 0.0,
            ..SamplingTuning::default()
        });
        let mut rng = Pcg32::seed_from_u64(5);
        let q = EscapeQuery {
            pointer: Vec2::new(0.0, 0.0),
            container: Rect::from_ltwh(0.0, 0.0, 140.0, 80.0),
            safe: Rect::from_ltwh(500.0, 500.0, 10.0, 10.0),
            moving: Rect::from_ltwh(0.0, 0.0, 100.0, 40.0),
        };
        assert_eq!(solver.place(&q, &mut rng), Vec2::new(20.0, 20.0));
        assert_eq!(solver.place(&q, &mut rng), q.fallback());
        assert!(solver.history().is_empty());
        // Cleared memory lets the next dodge move again
        assert_eq!(solver.place(&q, &mut rng), Vec2::new(20.0, 20.0));
    }

    #[test]
    fn test_relaxed_pass_avoids_last_spot() {
        // 700x80 strip: four remembered spots block the whole range
        let mut solver = SamplingSolver::default();
        let mut rng = Pcg32::seed_from_u64(21);
        let q = EscapeQuery {
            pointer: Vec2::new(70.0, 40.0),
            container: Rect::from_ltwh(0.0, 0.0, 700.0, 80.0),
            safe: Rect::from_ltwh(5000.0, 5000.0, 10.0, 10.0),
            moving: Rect::from_ltwh(20.0, 20.0, 100.0, 40.0),
        };
        let mut relaxed = 0;
        let mut last: Option<Vec2> = None;
        for _ in 0..40 {
            let before = solver.history().len();
            solver.place(&q, &mut rng);
            if solver.history().len() < before {
                relaxed += 1;
            }
            let newest = *solver.history().newest().expect("strip always has a spot");
            if let Some(prev) = last {
                assert!(newest.distance(prev) >= 120.0, "{newest} repeats {prev}");
            }
            last = Some(newest);
        }
        assert!(relaxed > 0);
    }

    #[test]
    fn test_corners_are_candidates() {
        let solver = SamplingSolver::default();
        let mut rng = Pcg32::seed_from_u64(0);
        let (min, max) = (Vec2::new(20.0, 20.0), Vec2::new(280.0, 240.0));
        let points = solver.sample_points(min, max, &mut rng);
        assert_eq!(points.len(), 35 + 4);
        assert!(points.contains(&Vec2::new(20.0, 240.0)));
        // One sample per stratum of the 7x5 grid
        for (i, p) in points[..35].iter().enumerate() {
            let col = ((p.x - 20.0) / (260.0 / 7.0)).floor() as usize;
            let row = ((p.y - 20.0) / (220.0 / 5.0)).floor() as usize;
            assert_eq!((col.min(6), row.min(4)), (i % 7, i / 7));
        }
    }

    #[test]
    fn test_fallback_when_safe_fills_container() {
        let mut solver = SamplingSolver::default();
        let mut rng = Pcg32::seed_from_u64(9);
        let q = EscapeQuery {
            pointer: Vec2::new(10.0, 10.0),
            container: Rect::from_ltrb(0.0, 0.0, 300.0, 200.0),
            safe: Rect::from_ltrb(0.0, 0.0, 300.0, 200.0),
            moving: Rect::from_ltwh(40.0, 30.0, 100.0, 40.0),
        };
        assert_eq!(solver.place(&q, &mut rng), Vec2::new(40.0, 30.0));
        assert!(solver.history().is_empty());
    }

    #[test]
    fn test_degenerate_inputs_fall_back() {
        let mut solver = SamplingSolver::default();
        let mut rng = Pcg32::seed_from_u64(1);

        let mut tiny = scenario();
        tiny.container = Rect::from_ltrb(0.0, 0.0, 90.0, 30.0);
        assert_eq!(solver.place(&tiny, &mut rng), tiny.fallback());

        let mut no_safe = scenario();
        no_safe.safe = Rect::from_ltwh(200.0, 150.0, 0.0, 0.0);
        assert_eq!(solver.place(&no_safe, &mut rng), no_safe.fallback());

        let mut nan = scenario();
        nan.pointer = Vec2::new(f32::NAN, 3.0);
        assert_eq!(solver.place(&nan, &mut rng), nan.fallback());
    }
}
