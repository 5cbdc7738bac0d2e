//! Fixed routing graph: voices → master bus, voices → delay → feedback/wet
//!
//! ```text
//!  voice ─┬──────────────────────────────► master ──► out
//!         └─► delay ─┬─► wet gain ─────────┘
//!               ▲    └─► feedback gain ─┐
//!               └───────────────────────┘
//! ```
//!
//! The graph never owns voices. It holds `VoiceId`s and pulls each voice's
//! output through `VoiceSource` while rendering.

use crate::synth::{VoiceArena, VoiceId};

/// Longest supported delay time in seconds
pub const MAX_DELAY_SECS: f64 = 2.0;

/// Anything the graph can pull voice output from
pub trait VoiceSource {
    /// Render the next frame of a voice; unknown ids render silence
    fn render_voice(&mut self, id: VoiceId, now: f64) -> f32;
}

impl VoiceSource for VoiceArena {
    fn render_voice(&mut self, id: VoiceId, now: f64) -> f32 {
        self.get_mut(id).map_or(0.0, |v| v.render(now))
    }
}

/// Circular delay buffer with a fixed delay time
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Create a delay of `delay_samples` frames (at least one)
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
        }
    }

    pub fn delay_samples(&self) -> usize {
        self.buffer.len()
    }

    /// The frame written `delay_samples` frames ago
    pub fn read(&self) -> f32 {
        self.buffer[self.write_pos]
    }

    /// Write the next input frame
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Master bus plus the shared delay/feedback effect bus
#[derive(Debug, Clone)]
pub struct RoutingGraph {
    inputs: Vec<VoiceId>,
    delay: DelayLine,
    feedback_gain: f32,
    wet_gain: f32,
    master_gain: f32,
}

impl RoutingGraph {
    /// Build the graph once for an engine lifetime
    pub fn new(sample_rate: u32, delay_time: f64, master_gain: f32, reverb_amount: f32) -> Self {
        let delay_time = delay_time.clamp(1.0 / sample_rate as f64, MAX_DELAY_SECS);
        let delay_samples = (delay_time * sample_rate as f64).round() as usize;
        let reverb_amount = reverb_amount.clamp(0.0, 1.0);

        Self {
            inputs: Vec::with_capacity(crate::synth::MAX_VOICES * 2),
            delay: DelayLine::new(delay_samples),
            feedback_gain: reverb_amount,
            wet_gain: reverb_amount,
            master_gain: master_gain.clamp(0.0, 1.0),
        }
    }

    /// Route a voice into the master and delay inputs
    pub fn connect(&mut self, id: VoiceId) {
        if !self.inputs.contains(&id) {
            self.inputs.push(id);
        }
    }

    pub fn disconnect(&mut self, id: VoiceId) {
        self.inputs.retain(|&i| i != id);
    }

    pub fn inputs(&self) -> &[VoiceId] {
        &self.inputs
    }

    pub fn is_connected(&self, id: VoiceId) -> bool {
        self.inputs.contains(&id)
    }

    /// Write feedback and wet gain together, effective immediately
    pub fn set_reverb_amount(&mut self, amount: f32) {
        let amount = amount.clamp(0.0, 1.0);
        self.feedback_gain = amount;
        self.wet_gain = amount;
    }

    pub fn reverb_amount(&self) -> f32 {
        self.wet_gain
    }

    pub fn feedback_gain(&self) -> f32 {
        self.feedback_gain
    }

    pub fn wet_gain(&self) -> f32 {
        self.wet_gain
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain.clamp(0.0, 1.0);
    }

    pub fn delay_samples(&self) -> usize {
        self.delay.delay_samples()
    }

    /// Render one output frame
    pub fn process<S: VoiceSource>(&mut self, voices: &mut S, now: f64) -> f32 {
        let dry: f32 = self
            .inputs
            .iter()
            .map(|&id| voices.render_voice(id, now))
            .sum();

        let echo = self.delay.read();
        self.delay.write(dry + echo * self.feedback_gain);

        (dry + echo * self.wet_gain) * self.master_gain
    }

    /// Silence the delay tail
    pub fn reset(&mut self) {
        self.delay.reset();
    }
}
