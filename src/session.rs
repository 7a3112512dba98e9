//! Widget controller
//!
//! One `Session` per page load owns every piece of mutable interaction state
//! (dodge counter, throttles, the confirmed flag, the solver and its RNG).
//! Event handlers feed it `InputEvent`s and apply the returned `Effect`s;
//! the session itself never touches the DOM.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::celebration::{ConfettiPiece, SparkleFlight, confetti_batch};
use crate::consts::*;
use crate::escape::{EscapeQuery, EscapeSolver, EscapeStrategy, Placement};
use crate::geometry::Rect;
use crate::settings::Settings;
use crate::sound::Cue;
use crate::throttle::Throttle;
use crate::tuning::Tuning;

/// On-demand access to the current on-screen boxes
pub trait LayoutProvider {
    /// Card the moving button lives in
    fn container(&self) -> Rect;
    /// The "Yes" button
    fn safe(&self) -> Rect;
    /// The "No" button, including any transform already applied
    fn moving(&self) -> Rect;
}

/// Fixed layout for tests and headless runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticLayout {
    pub container: Rect,
    pub safe: Rect,
    pub moving: Rect,
}

impl LayoutProvider for StaticLayout {
    fn container(&self) -> Rect {
        self.container
    }

    fn safe(&self) -> Rect {
        self.safe
    }

    fn moving(&self) -> Rect {
        self.moving
    }
}

/// Input commands (one per DOM event)
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Mouse moved anywhere over the card
    MouseMove { pos: Vec2 },
    /// Mouse/pointer entered the moving button
    PointerEnter { pos: Vec2 },
    /// Finger landed on the moving button (touchstart or touch pointerdown)
    TouchStart { pos: Vec2 },
    /// Fingers moved anywhere on the page
    TouchMove { touches: Vec<Vec2> },
    /// First user gesture; `prewarm` for pointer/touch gestures
    Unlock { prewarm: bool },
    /// "Yes" clicked
    Confirm,
    /// "Again" clicked
    Again,
    /// Speaker button clicked
    ToggleSound,
    /// Wand sparkle timer fired
    SparkleTick,
    /// Success image failed to load
    ImageError,
}

/// Presentation commands for the page
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Translate the moving button relative to its layout origin
    MoveEvader { translate: Vec2, animate: bool },
    Play(Cue),
    UnlockAudio,
    StartMusic,
    ResumeMusic,
    StopMusic,
    /// Start the easter tooltip sequence (full, then compact)
    ShowTooltip,
    HideTooltip,
    StopSparkles,
    SpawnSparkle(SparkleFlight),
    /// Swap the card into its success state
    Celebrate,
    Confetti(Vec<ConfettiPiece>),
    SoundToggled { enabled: bool },
    ShowImageFallback,
    Reload,
}

pub struct Session {
    settings: Settings,
    solver: EscapeSolver,
    rng: Pcg32,
    /// Moving button's untransformed top-left relative to the container's,
    /// captured on the first dodge. Survives scrolling and resizes.
    origin: Option<Vec2>,
    confirmed: bool,
    dodge_count: u32,
    tooltip_shown: bool,
    audio_unlocked: bool,
    audio_prewarmed: bool,
    dodge_sound: Throttle,
    pointer_enter: Throttle,
    touch_debounce: Throttle,
    touch_move: Throttle,
    mouse_move: Throttle,
}

impl Session {
    pub fn new(settings: Settings, tuning: &Tuning, seed: u64) -> Self {
        let solver = EscapeSolver::new(settings.strategy, tuning);
        Self {
            settings,
            solver,
            rng: Pcg32::seed_from_u64(seed),
            origin: None,
            confirmed: false,
            dodge_count: 0,
            tooltip_shown: false,
            audio_unlocked: false,
            audio_prewarmed: false,
            dodge_sound: Throttle::new(DODGE_SOUND_THROTTLE_MS),
            pointer_enter: Throttle::new(HOVER_THROTTLE_MS),
            touch_debounce: Throttle::new(TOUCH_DEBOUNCE_MS),
            touch_move: Throttle::new(TOUCH_MOVE_THROTTLE_MS),
            mouse_move: Throttle::new(MOUSE_MOVE_THROTTLE_MS),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn strategy(&self) -> EscapeStrategy {
        self.solver.strategy()
    }

    /// Once confirmed, the button stops dodging for the rest of the page
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn dodge_count(&self) -> u32 {
        self.dodge_count
    }

    /// Layout position of the moving button inside its container
    pub fn origin(&self) -> Option<Vec2> {
        self.origin
    }

    /// Whether the wand sparkle timer should run at all
    pub fn sparkles_enabled(&self) -> bool {
        !self.confirmed && self.settings.effective_motion()
    }

    /// Process one input event
    pub fn handle(&mut self, event: InputEvent, layout: &impl LayoutProvider, now_ms: f64) -> Vec<Effect> {
        match event {
            InputEvent::MouseMove { pos } => {
                if self.confirmed || !self.mouse_move.ready(now_ms) {
                    return Vec::new();
                }
                if !layout.moving().contains_padded(pos, MOUSE_PROXIMITY_PX) {
                    return Vec::new();
                }
                self.mouse_move.mark(now_ms);
                self.dodge(pos, layout, now_ms)
            }
            InputEvent::PointerEnter { pos } => {
                // mouseenter and pointerenter arrive as a pair for one hover
                if self.confirmed || !self.pointer_enter.try_fire(now_ms) {
                    return Vec::new();
                }
                self.dodge(pos, layout, now_ms)
            }
            InputEvent::TouchStart { pos } => {
                if self.confirmed || !self.touch_debounce.try_fire(now_ms) {
                    return Vec::new();
                }
                self.dodge(pos, layout, now_ms)
            }
            InputEvent::TouchMove { touches } => {
                if self.confirmed || !self.touch_move.ready(now_ms) {
                    return Vec::new();
                }
                let moving = layout.moving();
                match touches
                    .into_iter()
                    .find(|t| moving.contains_padded(*t, TOUCH_PROXIMITY_PX))
                {
                    Some(pos) => {
                        self.touch_move.mark(now_ms);
                        self.dodge(pos, layout, now_ms)
                    }
                    None => Vec::new(),
                }
            }
            InputEvent::Unlock { prewarm } => self.unlock(prewarm),
            InputEvent::Confirm => self.confirm(),
            InputEvent::Again => vec![Effect::StopMusic, Effect::Reload],
            InputEvent::ToggleSound => self.toggle_sound(),
            InputEvent::SparkleTick => self.sparkle(),
            InputEvent::ImageError => vec![Effect::ShowImageFallback],
        }
    }

    /// Run away from `pointer`
    fn dodge(&mut self, pointer: Vec2, layout: &impl LayoutProvider, now_ms: f64) -> Vec<Effect> {
        if self.confirmed {
            return Vec::new();
        }
        let mut effects = Vec::new();

        if self.settings.sound_enabled && self.dodge_sound.try_fire(now_ms) {
            effects.push(Effect::Play(Cue::Dodge));
        }

        self.dodge_count += 1;
        if self.dodge_count >= TOOLTIP_DODGE_COUNT && !self.tooltip_shown {
            self.tooltip_shown = true;
            log::info!("Tooltip unlocked after {} dodges", self.dodge_count);
            effects.push(Effect::ShowTooltip);
        }

        let query = EscapeQuery {
            pointer,
            container: layout.container(),
            safe: layout.safe(),
            moving: layout.moving(),
        };
        let corner = query.container.top_left();
        if self.origin.is_none() && query.moving.top_left().is_finite() && corner.is_finite() {
            self.origin = Some(query.moving.top_left() - corner);
        }
        let Some(offset) = self.origin else {
            log::warn!("Moving element has no usable layout position");
            return effects;
        };
        // Screen position the button would have without its transform
        let origin = corner + offset;
        if !origin.is_finite() {
            log::warn!("Container has no usable layout position");
            return effects;
        }

        let target = self.solver.place(&query, &mut self.rng);
        log::debug!("Dodge #{} from {} to {}", self.dodge_count, pointer, target);
        effects.push(Effect::MoveEvader {
            translate: target - origin,
            animate: self.settings.effective_motion(),
        });
        effects
    }

    fn unlock(&mut self, prewarm: bool) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.audio_unlocked {
            self.audio_unlocked = true;
            effects.push(Effect::UnlockAudio);
        }
        if prewarm && self.settings.sound_enabled && !self.audio_prewarmed {
            self.audio_prewarmed = true;
            effects.push(Effect::Play(Cue::Prewarm));
        }
        effects
    }

    fn confirm(&mut self) -> Vec<Effect> {
        let mut effects = self.unlock(false);
        if self.confirmed {
            effects.extend([Effect::StopMusic, Effect::Reload]);
            return effects;
        }
        self.confirmed = true;
        self.solver.reset();
        log::info!("Confirmed after {} dodges", self.dodge_count);

        effects.push(Effect::StopSparkles);
        effects.push(Effect::HideTooltip);
        if self.settings.sound_enabled {
            effects.extend([
                Effect::Play(Cue::Magic),
                Effect::Play(Cue::Success),
                Effect::StartMusic,
            ]);
        }
        effects.push(Effect::Celebrate);
        if self.settings.effective_motion() {
            effects.push(Effect::Confetti(confetti_batch(&mut self.rng, CONFETTI_COUNT)));
        }
        effects
    }

    fn toggle_sound(&mut self) -> Vec<Effect> {
        self.settings.sound_enabled = !self.settings.sound_enabled;
        let enabled = self.settings.sound_enabled;
        log::info!("Sound {}", if enabled { "on" } else { "off" });

        let mut effects = vec![Effect::SoundToggled { enabled }];
        if !enabled {
            effects.push(Effect::StopMusic);
        } else if self.confirmed {
            effects.push(Effect::ResumeMusic);
        }
        effects
    }

    fn sparkle(&mut self) -> Vec<Effect> {
        if !self.sparkles_enabled() {
            return Vec::new();
        }
        let mut effects = vec![Effect::SpawnSparkle(SparkleFlight::random(&mut self.rng))];
        if self.settings.sound_enabled
            && self.audio_unlocked
            && self.rng.random::<f64>() < SPARKLE_SOUND_CHANCE
        {
            effects.push(Effect::Play(Cue::Magic));
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> StaticLayout {
        StaticLayout {
            container: Rect::from_ltrb(0.0, 0.0, 400.0, 300.0),
            safe: Rect::from_ltrb(80.0, 200.0, 180.0, 240.0),
            moving: Rect::from_ltwh(220.0, 200.0, 100.0, 40.0),
        }
    }

    fn session() -> Session {
        Session::new(Settings::default(), &Tuning::default(), 42)
    }

    fn moves(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::MoveEvader { .. }))
            .count()
    }

    #[test]
    fn test_pointer_enter_moves_and_plays() {
        let mut s = session();
        let effects = s.handle(InputEvent::PointerEnter { pos: Vec2::new(250.0, 210.0) }, &layout(), 0.0);
        assert_eq!(effects[0], Effect::Play(Cue::Dodge));
        assert_eq!(moves(&effects), 1);
        assert_eq!(s.origin(), Some(Vec2::new(220.0, 200.0)));
        assert_eq!(s.dodge_count(), 1);
    }

    #[test]
    fn test_translate_is_relative_to_origin() {
        let mut s = session();
        let mut l = layout();
        s.handle(InputEvent::PointerEnter { pos: Vec2::new(250.0, 210.0) }, &l, 0.0);
        // Browser now reports the transformed box; origin must not move
        l.moving = l.moving.moved_to(Vec2::new(30.0, 30.0));
        let effects = s.handle(InputEvent::PointerEnter { pos: Vec2::new(60.0, 40.0) }, &l, 1000.0);
        let Some(Effect::MoveEvader { translate, .. }) = effects.last() else {
            panic!("expected a move");
        };
        let target = *translate + Vec2::new(220.0, 200.0);
        assert!(target.x >= 20.0 && target.x <= 280.0);
        assert!(target.y >= 20.0 && target.y <= 240.0);
        assert_eq!(s.origin(), Some(Vec2::new(220.0, 200.0)));
    }

    #[test]
    fn test_dodge_sound_is_throttled() {
        let mut s = session();
        let l = layout();
        let p = Vec2::new(250.0, 210.0);
        let sounds = [0.0, 60.0, 120.0, 180.0, 240.0]
            .into_iter()
            .map(|t| s.handle(InputEvent::PointerEnter { pos: p }, &l, t))
            .filter(|fx| fx.contains(&Effect::Play(Cue::Dodge)))
            .count();
        assert_eq!(sounds, 2);
        assert_eq!(s.dodge_count(), 5);
    }

    #[test]
    fn test_enter_pair_counts_once() {
        let mut s = session();
        let l = layout();
        let p = Vec2::new(250.0, 210.0);
        // mouseenter then pointerenter for the same hover
        assert_eq!(moves(&s.handle(InputEvent::PointerEnter { pos: p }, &l, 1000.0)), 1);
        assert!(s.handle(InputEvent::PointerEnter { pos: p }, &l, 1000.0).is_empty());
        assert_eq!(s.dodge_count(), 1);
    }

    #[test]
    fn test_hover_burst_is_throttled() {
        let mut s = session();
        let l = layout();
        let p = Vec2::new(250.0, 210.0);
        let solved = (0..10)
            .map(|t| s.handle(InputEvent::PointerEnter { pos: p }, &l, t as f64))
            .filter(|fx| moves(fx) == 1)
            .count();
        assert_eq!(solved, 1);
        assert_eq!(moves(&s.handle(InputEvent::PointerEnter { pos: p }, &l, 60.0)), 1);
        assert_eq!(s.dodge_count(), 2);
    }

    #[test]
    fn test_tooltip_needs_five_distinct_hovers() {
        let mut s = session();
        let l = layout();
        let p = Vec2::new(250.0, 210.0);
        let mut shown_at = None;
        for hover in 0..5 {
            // Each hover fires both enter events
            for _ in 0..2 {
                let fx = s.handle(InputEvent::PointerEnter { pos: p }, &l, hover as f64 * 400.0);
                if fx.contains(&Effect::ShowTooltip) {
                    shown_at = Some(hover + 1);
                }
            }
        }
        assert_eq!(s.dodge_count(), 5);
        assert_eq!(shown_at, Some(5));
    }

    #[test]
    fn test_mouse_move_needs_proximity_and_throttle() {
        let mut s = session();
        let l = layout();
        let far = s.handle(InputEvent::MouseMove { pos: Vec2::new(10.0, 10.0) }, &l, 0.0);
        assert!(far.is_empty());
        let near = s.handle(InputEvent::MouseMove { pos: Vec2::new(200.0, 190.0) }, &l, 10.0);
        assert_eq!(moves(&near), 1);
        let too_soon = s.handle(InputEvent::MouseMove { pos: Vec2::new(200.0, 190.0) }, &l, 60.0);
        assert!(too_soon.is_empty());
        let later = s.handle(InputEvent::MouseMove { pos: Vec2::new(200.0, 190.0) }, &l, 90.0);
        assert_eq!(moves(&later), 1);
    }

    #[test]
    fn test_touch_start_debounce() {
        let mut s = session();
        let l = layout();
        let p = Vec2::new(250.0, 210.0);
        assert_eq!(moves(&s.handle(InputEvent::TouchStart { pos: p }, &l, 0.0)), 1);
        assert!(s.handle(InputEvent::TouchStart { pos: p }, &l, 20.0).is_empty());
        assert_eq!(moves(&s.handle(InputEvent::TouchStart { pos: p }, &l, 50.0)), 1);
    }

    #[test]
    fn test_touch_move_uses_first_nearby_touch() {
        let mut s = session();
        let l = layout();
        let none = s.handle(InputEvent::TouchMove { touches: vec![Vec2::new(5.0, 5.0)] }, &l, 0.0);
        assert!(none.is_empty());
        let some = s.handle(
            InputEvent::TouchMove {
                touches: vec![Vec2::new(5.0, 5.0), Vec2::new(330.0, 245.0)],
            },
            &l,
            0.0,
        );
        assert_eq!(moves(&some), 1);
    }

    #[test]
    fn test_touch_move_burst_is_throttled() {
        let mut s = session();
        let l = layout();
        let near = vec![Vec2::new(330.0, 245.0)];
        let solved = (0..10)
            .map(|t| s.handle(InputEvent::TouchMove { touches: near.clone() }, &l, t as f64))
            .filter(|fx| moves(fx) == 1)
            .count();
        assert_eq!(solved, 1);
        // Far touches do not use up the window
        assert!(s.handle(InputEvent::TouchMove { touches: vec![Vec2::ZERO] }, &l, 50.0).is_empty());
        assert_eq!(moves(&s.handle(InputEvent::TouchMove { touches: near }, &l, 51.0)), 1);
        assert_eq!(s.dodge_count(), 2);
    }

    #[test]
    fn test_origin_follows_scrolled_container() {
        let mut s = session();
        let mut l = layout();
        s.handle(InputEvent::PointerEnter { pos: Vec2::new(250.0, 210.0) }, &l, 0.0);
        assert_eq!(s.origin(), Some(Vec2::new(220.0, 200.0)));

        // Page scrolled by 150px: every box moves up, translate must not change meaning
        let scroll = Vec2::new(0.0, -150.0);
        l.container = l.container.moved_to(l.container.top_left() + scroll);
        l.safe = l.safe.moved_to(l.safe.top_left() + scroll);
        l.moving = l.moving.moved_to(l.moving.top_left() + scroll);
        let fx = s.handle(InputEvent::PointerEnter { pos: Vec2::new(250.0, 60.0) }, &l, 1000.0);
        let Some(Effect::MoveEvader { translate, .. }) = fx.last() else {
            panic!("expected a move");
        };
        // Untransformed spot in page coordinates plus translate lands inside the card
        let target = Vec2::new(220.0, 50.0) + *translate;
        assert!(target.x >= 20.0 && target.x <= 280.0, "{target}");
        assert!(target.y >= -130.0 && target.y <= 90.0, "{target}");
        assert_eq!(s.origin(), Some(Vec2::new(220.0, 200.0)));
    }

    #[test]
    fn test_tooltip_once_on_fifth_dodge() {
        let mut s = session();
        let l = layout();
        let mut shown_at = Vec::new();
        for i in 0..10 {
            let fx = s.handle(InputEvent::PointerEnter { pos: Vec2::new(250.0, 210.0) }, &l, i as f64 * 1000.0);
            if fx.contains(&Effect::ShowTooltip) {
                shown_at.push(i + 1);
            }
        }
        assert_eq!(shown_at, vec![5]);
    }

    #[test]
    fn test_confirm_is_terminal() {
        let mut s = session();
        let l = layout();
        let fx = s.handle(InputEvent::Confirm, &l, 0.0);
        assert!(s.is_confirmed());
        assert_eq!(fx[0], Effect::UnlockAudio);
        assert!(fx.contains(&Effect::StopSparkles));
        assert!(fx.contains(&Effect::Play(Cue::Success)));
        assert!(fx.contains(&Effect::StartMusic));
        assert!(fx.contains(&Effect::Celebrate));
        assert!(fx.iter().any(|e| matches!(e, Effect::Confetti(batch) if batch.len() == CONFETTI_COUNT)));

        assert!(s.handle(InputEvent::PointerEnter { pos: Vec2::ZERO }, &l, 500.0).is_empty());
        assert!(s.handle(InputEvent::TouchStart { pos: Vec2::ZERO }, &l, 500.0).is_empty());
        assert!(s.handle(InputEvent::SparkleTick, &l, 500.0).is_empty());
        assert!(!s.sparkles_enabled());

        // Second click restarts the page; audio is already unlocked
        assert_eq!(s.handle(InputEvent::Confirm, &l, 600.0), vec![Effect::StopMusic, Effect::Reload]);
        assert_eq!(s.handle(InputEvent::Again, &l, 700.0), vec![Effect::StopMusic, Effect::Reload]);
    }

    #[test]
    fn test_confirm_without_sound_or_motion() {
        let settings = Settings {
            sound_enabled: false,
            reduced_motion: true,
            ..Settings::default()
        };
        let mut s = Session::new(settings, &Tuning::default(), 1);
        let fx = s.handle(InputEvent::Confirm, &layout(), 0.0);
        assert!(!fx.iter().any(|e| matches!(e, Effect::Play(_) | Effect::StartMusic | Effect::Confetti(_))));
        assert!(fx.contains(&Effect::Celebrate));
    }

    #[test]
    fn test_reduced_motion_moves_without_animation() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        let mut s = Session::new(settings, &Tuning::default(), 1);
        let fx = s.handle(InputEvent::PointerEnter { pos: Vec2::new(250.0, 210.0) }, &layout(), 0.0);
        assert!(fx.iter().any(|e| matches!(e, Effect::MoveEvader { animate: false, .. })));
        assert!(s.handle(InputEvent::SparkleTick, &layout(), 0.0).is_empty());
    }

    #[test]
    fn test_toggle_sound() {
        let mut s = session();
        let l = layout();
        assert_eq!(
            s.handle(InputEvent::ToggleSound, &l, 0.0),
            vec![Effect::SoundToggled { enabled: false }, Effect::StopMusic]
        );
        let fx = s.handle(InputEvent::PointerEnter { pos: Vec2::new(250.0, 210.0) }, &l, 0.0);
        assert!(!fx.contains(&Effect::Play(Cue::Dodge)));
        s.handle(InputEvent::Confirm, &l, 0.0);
        assert_eq!(
            s.handle(InputEvent::ToggleSound, &l, 0.0),
            vec![Effect::SoundToggled { enabled: true }, Effect::ResumeMusic]
        );
    }

    #[test]
    fn test_unlock_and_prewarm_once() {
        let mut s = session();
        let l = layout();
        assert_eq!(
            s.handle(InputEvent::Unlock { prewarm: true }, &l, 0.0),
            vec![Effect::UnlockAudio, Effect::Play(Cue::Prewarm)]
        );
        assert!(s.handle(InputEvent::Unlock { prewarm: true }, &l, 0.0).is_empty());
    }

    #[test]
    fn test_sparkle_sound_needs_unlock() {
        let mut s = session();
        let l = layout();
        for _ in 0..50 {
            let fx = s.handle(InputEvent::SparkleTick, &l, 0.0);
            assert!(matches!(fx[0], Effect::SpawnSparkle(_)));
            assert!(!fx.contains(&Effect::Play(Cue::Magic)));
        }
        s.handle(InputEvent::Unlock { prewarm: false }, &l, 0.0);
        let with_sound = (0..200)
            .filter(|_| s.handle(InputEvent::SparkleTick, &l, 0.0).contains(&Effect::Play(Cue::Magic)))
            .count();
        assert!(with_sound > 20 && with_sound < 90, "{with_sound}");
    }

    #[test]
    fn test_degenerate_layout_keeps_position() {
        let mut s = session();
        let mut l = layout();
        l.container = Rect::from_ltwh(0.0, 0.0, 0.0, 0.0);
        let fx = s.handle(InputEvent::PointerEnter { pos: Vec2::new(250.0, 210.0) }, &l, 0.0);
        assert!(fx.contains(&Effect::MoveEvader {
            translate: Vec2::ZERO,
            animate: true
        }));
    }
}
