//! Evasive Card - a greeting card whose "No" button won't be caught
//!
//! Core modules:
//! - `geometry`: Rects, sizes and padded overlap tests
//! - `escape`: Escape position solvers (sampling and grid)
//! - `session`: Widget controller turning input events into effects
//! - `celebration`: Confetti and wand sparkle particle generation
//! - `sound`: Procedural tone descriptions for every cue
//! - `tuning`: Data-driven solver and interaction constants

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod celebration;
pub mod error;
pub mod escape;
pub mod geometry;
pub mod session;
pub mod settings;
pub mod sound;
pub mod throttle;
pub mod tuning;

pub use error::TuningError;
pub use escape::{EscapeQuery, EscapeStrategy, Placement};
pub use geometry::{Rect, Size};
pub use session::{Effect, InputEvent, LayoutProvider, Session};
pub use settings::Settings;
pub use tuning::Tuning;

/// Interaction constants that are not part of the solver tuning
pub mod consts {
    /// Dodge sound may replay at most this often (ms)
    pub const DODGE_SOUND_THROTTLE_MS: f64 = 180.0;
    /// Hover (mouseenter / pointerenter) dodges at most this often (ms)
    pub const HOVER_THROTTLE_MS: f64 = 50.0;
    /// Touch start / pointer down debounce (ms)
    pub const TOUCH_DEBOUNCE_MS: f64 = 50.0;
    /// Touch move near the button dodges at most this often (ms)
    pub const TOUCH_MOVE_THROTTLE_MS: f64 = 50.0;
    /// Mouse move over the card is sampled at most this often (ms)
    pub const MOUSE_MOVE_THROTTLE_MS: f64 = 80.0;

    /// Mouse move triggers a dodge within this many px of the button
    pub const MOUSE_PROXIMITY_PX: f32 = 60.0;
    /// Touch move triggers a dodge within this many px of the button
    pub const TOUCH_PROXIMITY_PX: f32 = 30.0;

    /// Dodges before the easter tooltip appears
    pub const TOOLTIP_DODGE_COUNT: u32 = 5;
    /// How long the full tooltip stays up before going compact (ms)
    pub const TOOLTIP_FULL_MS: i32 = 2500;
    /// Gap between hiding the full tooltip and showing the compact one (ms)
    pub const TOOLTIP_COMPACT_DELAY_MS: i32 = 200;

    /// Shake class duration before the button snaps to its new spot (ms)
    pub const SHAKE_MS: i32 = 80;
    /// Transform transition once the shake ends
    pub const MOVE_TRANSITION: &str = "transform 0.12s ease";

    /// Delay before wand sparkles start (ms)
    pub const SPARKLE_START_DELAY_MS: i32 = 500;
    /// Wand sparkle spawn interval (ms)
    pub const SPARKLE_INTERVAL_MS: i32 = 800;
    /// Chance a sparkle tick also plays the magic cue
    pub const SPARKLE_SOUND_CHANCE: f64 = 0.25;
    /// Sparkle lifetime (ms)
    pub const SPARKLE_LIFETIME_MS: i32 = 1200;

    /// Confetti pieces per celebration
    pub const CONFETTI_COUNT: usize = 50;
    /// Confetti lifetime (ms)
    pub const CONFETTI_LIFETIME_MS: i32 = 4000;

    /// Background music volume
    pub const MUSIC_VOLUME: f64 = 0.5;
    /// Background music asset
    pub const MUSIC_URL: &str = "./audio/background.mp3";
}
