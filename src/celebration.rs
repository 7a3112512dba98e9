//! Decorative particles
//!
//! Confetti for the celebration and magic dust from the wizard's wand. Only
//! the random parameters live here; the binary turns them into DOM nodes.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::geometry::Rect;

pub const CONFETTI_SYMBOLS: [&str; 5] = ["♥", "♦", "💖", "✨", "❀"];
pub const CONFETTI_COLORS: [&str; 5] = ["#EC4899", "#F472B6", "#8B5CF6", "#C4B5FD", "#FDE68A"];

/// Wand tip position as a fraction of the wizard SVG box (viewBox 120x180)
pub const WAND_TIP: Vec2 = Vec2::new(115.0 / 120.0, 45.0 / 180.0);

pub const CONFETTI_KEYFRAMES: &str = "
@keyframes confettiUp {
  0% { transform: translateY(0) rotate(0deg); opacity: 1; }
  100% { transform: translateY(-100vh) rotate(var(--twist, 0deg)); opacity: 0; }
}";

pub const SPARKLE_KEYFRAMES: &str = "
@keyframes sparkleFly {
  0% { opacity: 1; transform: translate(0,0) scale(1); }
  100% { opacity: 0; transform: translate(var(--dx,0), var(--dy,0)) scale(0.3); }
}
@media (prefers-reduced-motion: reduce) { .sparkle { animation: none; opacity: 0; } }";

/// One piece of rising confetti
#[derive(Debug, Clone, PartialEq)]
pub struct ConfettiPiece {
    pub symbol: &'static str,
    pub color: &'static str,
    /// Horizontal start, viewport width percent
    pub left_vw: f32,
    pub font_px: f32,
    pub duration_s: f32,
    pub delay_s: f32,
    /// Final rotation, degrees
    pub twist_deg: f32,
}

impl ConfettiPiece {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            symbol: CONFETTI_SYMBOLS.choose(rng).copied().unwrap_or("♥"),
            color: CONFETTI_COLORS.choose(rng).copied().unwrap_or("#EC4899"),
            left_vw: rng.random::<f32>() * 100.0,
            font_px: 14.0 + rng.random::<f32>() * 16.0,
            duration_s: 2.0 + rng.random::<f32>() * 2.0,
            delay_s: rng.random::<f32>() * 0.5,
            twist_deg: rng.random::<f32>() * 360.0 - 180.0,
        }
    }

    pub fn css_text(&self) -> String {
        format!(
            "position: fixed; left: {:.2}vw; bottom: -20px; font-size: {:.1}px; color: {}; \
             pointer-events: none; z-index: 100; \
             animation: confettiUp {:.2}s ease-out forwards; animation-delay: {:.2}s;",
            self.left_vw, self.font_px, self.color, self.duration_s, self.delay_s
        )
    }
}

pub fn confetti_batch<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<ConfettiPiece> {
    (0..count).map(|_| ConfettiPiece::random(rng)).collect()
}

/// Flight of one sparkle relative to the wand tip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparkleFlight {
    pub dx: f32,
    pub dy: f32,
}

impl SparkleFlight {
    /// Mostly upward, within ±0.4 rad of vertical, 30..70px plus a 20px lift
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let angle = rng.random::<f32>() * 0.8 - 0.4;
        let dist = 30.0 + rng.random::<f32>() * 40.0;
        Self {
            dx: angle.sin() * dist,
            dy: -angle.cos() * dist - 20.0,
        }
    }
}

/// Wand tip in `layer` coordinates, given the wizard SVG's on-screen box
pub fn wand_tip(wizard: &Rect, layer: &Rect) -> Vec2 {
    Vec2::new(
        wizard.left + WAND_TIP.x * wizard.width() - layer.left,
        wizard.top + WAND_TIP.y * wizard.height() - layer.top,
    )
}

pub fn sparkle_css_text(tip: Vec2) -> String {
    format!(
        "position: absolute; left: {:.1}px; top: {:.1}px; width: 6px; height: 6px; border-radius: 50%; \
         background: radial-gradient(circle, #FDE68A 0%, #F59E0B 50%, transparent 70%); \
         pointer-events: none; animation: sparkleFly 1.2s ease-out forwards;",
        tip.x, tip.y
    )
}
