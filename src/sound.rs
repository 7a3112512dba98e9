//! Procedural sound cues
//!
//! Every cue is described as plain data (oscillators, noise bursts and their
//! automation curves) so the schedule can be checked without an audio
//! device. `audio::AudioManager` turns these into WebAudio nodes.

use rand::Rng;

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Moving button dodges - short falling blip
    Dodge,
    /// Wand sparkle - rising chime plus a puff of noise
    Magic,
    /// Confirmation - C major arpeggio over a soft heartbeat hum
    Success,
    /// Silent tone that wakes the audio pipeline on iOS
    Prewarm,
}

/// How a parameter reaches its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ramp {
    /// Jump at `at`
    Set,
    /// Linear ramp ending at `at`
    Linear,
    /// Exponential ramp ending at `at` (value must be > 0)
    Exponential,
}

/// One automation point; `at` is seconds after the cue starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Automation {
    pub ramp: Ramp,
    pub value: f32,
    pub at: f64,
}

const fn set(value: f32, at: f64) -> Automation {
    Automation {
        ramp: Ramp::Set,
        value,
        at,
    }
}

const fn linear(value: f32, at: f64) -> Automation {
    Automation {
        ramp: Ramp::Linear,
        value,
        at,
    }
}

const fn exp(value: f32, at: f64) -> Automation {
    Automation {
        ramp: Ramp::Exponential,
        value,
        at,
    }
}

/// Where a voice is connected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Through the master gain (respects volume)
    Master,
    /// Straight to the destination
    Direct,
}

/// Sine oscillator voice
#[derive(Debug, Clone, PartialEq)]
pub struct Tone {
    pub start: f64,
    pub stop: f64,
    pub frequency: Vec<Automation>,
    pub gain: Vec<Automation>,
    pub route: Route,
}

/// Mono white-noise buffer voice
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseBurst {
    pub samples: u32,
    pub sample_rate: f32,
    pub amplitude: f32,
    pub stop: f64,
    pub gain: Vec<Automation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Voice {
    Tone(Tone),
    Noise(NoiseBurst),
}

impl Voice {
    /// Seconds after the cue starts when this voice goes silent
    pub fn end(&self) -> f64 {
        match self {
            Voice::Tone(t) => t.stop,
            Voice::Noise(n) => n.stop,
        }
    }
}

/// Success arpeggio: C5 E5 G5 C6
const SUCCESS_NOTES: [f32; 4] = [523.25, 659.25, 783.99, 1046.5];
const SUCCESS_STEP: f64 = 0.12;

/// Voices that make up `cue`
pub fn voices(cue: Cue) -> Vec<Voice> {
    match cue {
        Cue::Dodge => vec![Voice::Tone(Tone {
            start: 0.0,
            stop: 0.1,
            frequency: vec![set(420.0, 0.0), exp(180.0, 0.08)],
            gain: vec![set(0.0, 0.0), linear(0.12, 0.008), exp(0.001, 0.1)],
            route: Route::Master,
        })],
        Cue::Magic => vec![
            Voice::Tone(Tone {
                start: 0.0,
                stop: 0.2,
                frequency: vec![set(880.0, 0.0), exp(1320.0, 0.05), exp(1760.0, 0.1)],
                gain: vec![set(0.08, 0.0), exp(0.001, 0.2)],
                route: Route::Direct,
            }),
            Voice::Noise(NoiseBurst {
                samples: 4410,
                sample_rate: 44_100.0,
                amplitude: 0.03,
                stop: 0.08,
                gain: vec![set(0.04, 0.0), exp(0.001, 0.08)],
            }),
        ],
        Cue::Success => {
            let mut out: Vec<Voice> = SUCCESS_NOTES
                .iter()
                .enumerate()
                .map(|(i, &freq)| {
                    let t = i as f64 * SUCCESS_STEP;
                    Voice::Tone(Tone {
                        start: t,
                        stop: t + 0.3,
                        frequency: vec![set(freq, t)],
                        gain: vec![set(0.0, t), linear(0.12, t + 0.03), exp(0.001, t + 0.25)],
                        route: Route::Direct,
                    })
                })
                .collect();
            // Heartbeat hum under the arpeggio
            out.push(Voice::Tone(Tone {
                start: 0.0,
                stop: 0.6,
                frequency: vec![set(200.0, 0.0)],
                gain: vec![set(0.03, 0.0), exp(0.001, 0.6)],
                route: Route::Direct,
            }));
            out
        }
        Cue::Prewarm => vec![Voice::Tone(Tone {
            start: 0.0,
            stop: 0.01,
            frequency: vec![set(440.0, 0.0)],
            gain: vec![set(0.0001, 0.0)],
            route: Route::Master,
        })],
    }
}

/// Cues that stay silent until a user gesture has unlocked the audio context
pub fn needs_unlock(cue: Cue) -> bool {
    matches!(cue, Cue::Magic | Cue::Success)
}

/// White noise in `[-amplitude, amplitude]`
pub fn noise_samples<R: Rng + ?Sized>(rng: &mut R, burst: &NoiseBurst) -> Vec<f32> {
    (0..burst.samples)
        .map(|_| (rng.random::<f32>() * 2.0 - 1.0) * burst.amplitude)
        .collect()
}

/// Background track lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MusicState {
    /// Never started
    #[default]
    Idle,
    Playing,
    /// Started, then stopped by muting; resumable
    Paused,
}

impl MusicState {
    /// Start from the top; true if the track should play
    pub fn start(&mut self, muted: bool) -> bool {
        if muted {
            return false;
        }
        *self = Self::Playing;
        true
    }

    pub fn stop(&mut self) {
        if *self == Self::Playing {
            *self = Self::Paused;
        }
    }

    /// Pick up a stopped track; true if it should play again
    pub fn resume(&mut self, muted: bool) -> bool {
        if muted || *self != Self::Paused {
            return false;
        }
        *self = Self::Playing;
        true
    }
}
