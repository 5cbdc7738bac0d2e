//! Keyword-driven local synth
//!
//! Offline stand-in for the generation service: a sine tone whose pitch,
//! harmonics, noise and echo are picked from words in the prompt.

use crate::sample::{Sample, SampleError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use tracing::debug;

pub const LOCAL_SAMPLE_RATE: u32 = 44100;

const ATTACK_SECS: f64 = 0.1;
const RELEASE_SECS: f64 = 0.3;
const HEADROOM: f64 = 0.7;
const NOISE_LEVEL: f64 = 0.2;

/// Sound characteristics read from a prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromptTraits {
    pub low: bool,
    pub high: bool,
    pub noisy: bool,
    pub reverb: bool,
}

impl PromptTraits {
    pub fn from_prompt(prompt: &str) -> Self {
        let prompt = prompt.to_lowercase();
        let any = |words: &[&str]| words.iter().any(|w| prompt.contains(w));
        Self {
            low: any(&["bass", "low", "deep"]),
            high: any(&["high", "bright", "sharp"]),
            noisy: any(&["noise", "distortion", "fuzzy"]),
            reverb: any(&["reverb", "echo", "ambient"]),
        }
    }

    /// A5 for bright prompts, A2 for low ones, otherwise A4
    pub fn base_frequency(&self) -> f64 {
        if self.high {
            880.0
        } else if self.low {
            110.0
        } else {
            440.0
        }
    }
}

/// Render `duration` seconds of mono audio for `prompt`
///
/// A fixed `seed` makes the output reproducible; `None` draws one from
/// the OS.
pub fn synthesize(prompt: &str, duration: f64, seed: Option<u64>) -> Result<Sample, SampleError> {
    let traits = PromptTraits::from_prompt(prompt);
    let freq = traits.base_frequency();
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    debug!(?traits, freq, duration, "synthesizing local sample");

    let duration = duration.max(0.0);
    let sr = LOCAL_SAMPLE_RATE as f64;
    let frames = (sr * duration).floor() as usize;
    let tone = |t: f64, mult: f64| (TAU * freq * mult * t).sin();

    let data = (0..frames)
        .map(|i| {
            let t = i as f64 / sr;
            let mut s = tone(t, 1.0);

            if traits.low {
                s += 0.5 * tone(t, 2.0);
                s += 0.25 * tone(t, 1.5);
            }
            if traits.high {
                s += 0.3 * tone(t, 3.0);
            }
            if traits.noisy {
                s += NOISE_LEVEL * rng.gen_range(-1.0..1.0);
            }

            let envelope = if t < ATTACK_SECS {
                t / ATTACK_SECS
            } else if t > duration - RELEASE_SECS {
                ((duration - t) / RELEASE_SECS).max(0.0)
            } else {
                1.0
            };

            if traits.reverb && t > 0.1 {
                s += 0.3 * tone(t - 0.1, 1.0);
                s += 0.15 * tone(t - 0.2, 1.0);
            }

            (s * envelope * HEADROOM).clamp(-1.0, 1.0) as f32
        })
        .collect();

    Sample::mono(LOCAL_SAMPLE_RATE, data)
}
