//! Voice building blocks
//!
//! Contains the key layout, envelope automation, playback voices and the
//! bounded voice pool.

mod envelope;
mod keys;
mod pool;
mod voice;

pub use envelope::{Automation, EnvelopeParams, GainParam, ATTACK_RANGE, RELEASE_RANGE};
pub use keys::{clamp_octave, playback_rate, Key, KEY_LAYOUT, OCTAVE_RANGE};
pub use pool::{VoiceArena, VoiceId, VoicePool, MAX_VOICES};
pub use voice::{PlaybackSource, Voice, VoiceState};
