//! A single sounding note: playback source plus its gain envelope

use super::envelope::GainParam;
use super::keys::Key;
use crate::sample::Sample;
use std::sync::Arc;

/// Lifecycle of a voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceState {
    /// Key is down; attack ramp scheduled or finished
    Held,
    /// Key released; fading out, stops at `ends_at`
    Releasing { ends_at: f64 },
    /// Evicted to make room; short fade, stops at `ends_at`
    Stolen { ends_at: f64 },
}

/// Reads through a sample at a playback rate
#[derive(Debug, Clone)]
pub struct PlaybackSource {
    sample: Arc<Sample>,
    rate: f64,
    /// Source frames advanced per output frame
    step: f64,
    position: f64,
    stop_at: Option<f64>,
}

impl PlaybackSource {
    /// Bind a source to `sample`, rendering at `output_rate`
    pub fn new(sample: Arc<Sample>, rate: f64, output_rate: u32) -> Self {
        let step = rate * sample.sample_rate() as f64 / output_rate as f64;
        Self {
            sample,
            rate,
            step,
            position: 0.0,
            stop_at: None,
        }
    }

    pub fn sample(&self) -> &Arc<Sample> {
        &self.sample
    }

    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    /// Current read position in source frames
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Schedule the source to stop at an audio-clock time
    pub fn stop(&mut self, time: f64) {
        self.stop_at = Some(time);
    }

    pub fn stop_time(&self) -> Option<f64> {
        self.stop_at
    }

    /// Whether the read head has run past the end of the sample
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.sample.frame_count() as f64
    }

    /// Next output frame at audio-clock time `now`
    pub fn next(&mut self, now: f64) -> f32 {
        if self.stop_at.is_some_and(|t| now >= t) || self.is_exhausted() {
            return 0.0;
        }

        let idx = self.position as usize;
        let frac = (self.position - idx as f64) as f32;
        let a = self.sample.frame_mono(idx);
        let b = self.sample.frame_mono(idx + 1);
        self.position += self.step;

        a + (b - a) * frac
    }
}

/// One active playback instance
#[derive(Debug, Clone)]
pub struct Voice {
    key: Key,
    source: PlaybackSource,
    gain: GainParam,
    start_time: f64,
    serial: u64,
    state: VoiceState,
}

impl Voice {
    pub fn new(key: Key, source: PlaybackSource, gain: GainParam, start_time: f64, serial: u64) -> Self {
        Self {
            key,
            source,
            gain,
            start_time,
            serial,
            state: VoiceState::Held,
        }
    }

    pub fn key(&self) -> Key {
        self.key
    }

    /// Audio-clock time the voice started
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Allocation order; strictly increasing across voices
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Sort key used to pick the oldest voice
    pub fn age_order(&self) -> (f64, u64) {
        (self.start_time, self.serial)
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_held(&self) -> bool {
        self.state == VoiceState::Held
    }

    pub fn source(&self) -> &PlaybackSource {
        &self.source
    }

    pub fn gain(&self) -> &GainParam {
        &self.gain
    }

    /// Fade to silence from the current gain and stop at the end of the fade
    ///
    /// Returns the audio-clock time the voice stops.
    fn fade_out(&mut self, now: f64, duration: f64) -> f64 {
        let current = self.gain.value_at(now);
        let ends_at = now + duration;
        self.gain.cancel_scheduled_values(now);
        self.gain.set_value_at_time(current, now);
        self.gain.linear_ramp_to_value_at_time(0.0, ends_at);
        self.source.stop(ends_at);
        ends_at
    }

    /// Start the release ramp
    pub fn release(&mut self, now: f64, release: f64) {
        let ends_at = self.fade_out(now, release);
        self.state = VoiceState::Releasing { ends_at };
    }

    /// Start the eviction fade
    pub fn steal(&mut self, now: f64, fade: f64) {
        let ends_at = self.fade_out(now, fade);
        self.state = VoiceState::Stolen { ends_at };
    }

    /// Whether the scheduled stop has been reached
    pub fn is_finished(&self, now: f64) -> bool {
        self.source.stop_time().is_some_and(|t| now >= t)
    }

    /// Render one output frame
    pub fn render(&mut self, now: f64) -> f32 {
        self.source.next(now) * self.gain.value_at(now)
    }

    /// Drop automation events that are already in the past
    pub fn prune(&mut self, now: f64) {
        self.gain.prune(now);
    }
}
