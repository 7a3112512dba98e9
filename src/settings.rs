//! Card settings and preferences
//!
//! Read once at boot from the page; nothing is persisted across reloads.

use serde::{Deserialize, Serialize};

use crate::escape::EscapeStrategy;

/// Runtime preferences for one page load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Sound effects and music (toggled by the speaker button)
    pub sound_enabled: bool,
    /// Honor `prefers-reduced-motion`: no shake, sparkles or confetti
    pub reduced_motion: bool,
    /// Which solver moves the button
    pub strategy: EscapeStrategy,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            reduced_motion: false,
            strategy: EscapeStrategy::Sampling,
            master_volume: 1.0,
        }
    }
}

impl Settings {
    /// Whether moving things (shake, sparkles, confetti) should animate
    pub fn effective_motion(&self) -> bool {
        !self.reduced_motion
    }

    /// Apply a `data-strategy` attribute value, ignoring unknown names
    pub fn apply_strategy(&mut self, name: Option<&str>) {
        if let Some(name) = name {
            match EscapeStrategy::from_str(name) {
                Some(strategy) => self.strategy = strategy,
                None => log::warn!("Unknown escape strategy '{}', keeping {}", name, self.strategy.as_str()),
            }
        }
    }

    /// Read preferences from the browser (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn from_environment() -> Self {
        let reduced_motion = web_sys::window()
            .and_then(|w| w.match_media("(prefers-reduced-motion: reduce)").ok().flatten())
            .map(|mq| mq.matches())
            .unwrap_or(false);
        if reduced_motion {
            log::info!("Reduced motion requested");
        }
        Self {
            reduced_motion,
            ..Self::default()
        }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_environment() -> Self {
        Self::default()
    }
}
