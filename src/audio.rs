//! Audio system using Web Audio API
//!
//! Procedurally generated cues from `sound`, plus the looping background
//! track played after confirmation.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioContext, AudioParam, GainNode, HtmlAudioElement, OscillatorType};

use crate::consts::{MUSIC_URL, MUSIC_VOLUME};
use crate::sound::{self, Automation, Cue, MusicState, NoiseBurst, Ramp, Route, Tone, Voice};

/// Audio manager for the card
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master: Option<GainNode>,
    volume: f32,
    muted: bool,
    unlocked: bool,
    music: Option<HtmlAudioElement>,
    music_state: MusicState,
    rng: Pcg32,
}

impl AudioManager {
    /// The context is created lazily on the first user gesture (`unlock`)
    pub fn new(volume: f32, muted: bool) -> Self {
        Self {
            ctx: None,
            master: None,
            volume: volume.clamp(0.0, 1.0),
            muted,
            unlocked: false,
            music: None,
            music_state: MusicState::Idle,
            rng: Pcg32::seed_from_u64(js_sys::Date::now() as u64),
        }
    }

    /// Create and resume the context (required after user gesture)
    pub fn unlock(&mut self) {
        if self.ctx.is_none() {
            match AudioContext::new() {
                Ok(ctx) => {
                    let master = ctx.create_gain().ok();
                    if let Some(master) = &master {
                        master.gain().set_value(self.volume);
                        let _ = master.connect_with_audio_node(&ctx.destination());
                    }
                    self.master = master;
                    self.ctx = Some(ctx);
                    log::info!("Audio unlocked");
                }
                Err(_) => log::warn!("Failed to create AudioContext - audio disabled"),
            }
        }
        self.unlocked = true;
        if let Some(ctx) = &self.ctx {
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        }
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.stop_music();
        }
    }

    /// Play a sound cue
    pub fn play(&mut self, cue: Cue) {
        if self.muted {
            return;
        }
        if cue == Cue::Dodge {
            self.unlock();
        }
        if sound::needs_unlock(cue) && !self.unlocked {
            return;
        }
        let Some(ctx) = self.ctx.clone() else { return };
        let t = ctx.current_time();

        for voice in sound::voices(cue) {
            let played = match &voice {
                Voice::Tone(tone) => self.play_tone(&ctx, tone, t),
                Voice::Noise(burst) => self.play_noise(&ctx, burst, t),
            };
            if played.is_none() {
                log::warn!("Failed to schedule {:?} voice", cue);
            }
        }
    }

    fn destination(&self, ctx: &AudioContext, route: Route) -> web_sys::AudioNode {
        match (route, &self.master) {
            (Route::Master, Some(master)) => master.clone().into(),
            _ => ctx.destination().into(),
        }
    }

    /// Sine oscillator with its frequency and gain curves
    fn play_tone(&self, ctx: &AudioContext, tone: &Tone, t: f64) -> Option<()> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;
        osc.set_type(OscillatorType::Sine);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&self.destination(ctx, tone.route)).ok()?;

        automate(&osc.frequency(), &tone.frequency, t);
        automate(&gain.gain(), &tone.gain, t);

        osc.start_with_when(t + tone.start).ok()?;
        osc.stop_with_when(t + tone.stop).ok()?;
        Some(())
    }

    /// Short white-noise buffer
    fn play_noise(&mut self, ctx: &AudioContext, burst: &NoiseBurst, t: f64) -> Option<()> {
        let buffer = ctx.create_buffer(1, burst.samples, burst.sample_rate).ok()?;
        let mut samples = sound::noise_samples(&mut self.rng, burst);
        buffer.copy_to_channel(&mut samples[..], 0).ok()?;

        let source = ctx.create_buffer_source().ok()?;
        source.set_buffer(Some(&buffer));
        let gain = ctx.create_gain().ok()?;
        source.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;
        automate(&gain.gain(), &burst.gain, t);

        source.start_with_when(t).ok()?;
        source.stop_with_when(t + burst.stop).ok()?;
        Some(())
    }

    /// Start the looping background track from the top
    pub fn start_music(&mut self) {
        if !self.music_state.start(self.muted) {
            return;
        }
        if self.music.is_none() {
            match HtmlAudioElement::new_with_src(MUSIC_URL) {
                Ok(music) => {
                    music.set_loop(true);
                    music.set_volume(MUSIC_VOLUME);
                    self.music = Some(music);
                }
                Err(_) => log::warn!("Failed to create background music element"),
            }
        }
        if let Some(music) = &self.music {
            music.set_current_time(0.0);
            play_element(music);
        }
    }

    /// Resume the track after unmuting, if one was started
    pub fn resume_music(&mut self) {
        if !self.music_state.resume(self.muted) {
            return;
        }
        if let Some(music) = &self.music {
            play_element(music);
        }
    }

    /// Pause, keeping the element and its position for `resume_music`
    pub fn stop_music(&mut self) {
        self.music_state.stop();
        if let Some(music) = &self.music {
            let _ = music.pause();
        }
    }
}

/// Apply automation points relative to cue start `t`
fn automate(param: &AudioParam, points: &[Automation], t: f64) {
    for p in points {
        let at = t + p.at;
        let _ = match p.ramp {
            Ramp::Set => param.set_value_at_time(p.value, at),
            Ramp::Linear => param.linear_ramp_to_value_at_time(p.value, at),
            Ramp::Exponential => param.exponential_ramp_to_value_at_time(p.value, at),
        };
    }
}

/// `play()` returns a promise that rejects when autoplay is blocked
fn play_element(music: &HtmlAudioElement) {
    match music.play() {
        Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                log::warn!("Audio blocked: {:?}", err);
            }
        }),
        Err(err) => log::warn!("Audio play failed: {:?}", err),
    }
}
