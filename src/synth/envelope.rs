//! Envelope parameters and the scheduled gain control each voice owns
//!
//! `GainParam` works like an automation lane: callers schedule set-value and
//! linear-ramp events at audio-clock times, and the render loop evaluates the
//! lane at the current time. Nothing here looks at the wall clock.

/// Attack range in seconds
pub const ATTACK_RANGE: (f64, f64) = (0.01, 2.0);
/// Release range in seconds
pub const RELEASE_RANGE: (f64, f64) = (0.1, 3.0);

/// Attack/release times shared by all voices
///
/// Read when a voice starts or is released; changing them never touches
/// voices already in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    attack: f64,
    release: f64,
}

impl EnvelopeParams {
    /// Create envelope parameters, clamping to the supported ranges
    pub fn new(attack: f64, release: f64) -> Self {
        Self {
            attack: attack.clamp(ATTACK_RANGE.0, ATTACK_RANGE.1),
            release: release.clamp(RELEASE_RANGE.0, RELEASE_RANGE.1),
        }
    }

    pub fn attack(&self) -> f64 {
        self.attack
    }

    pub fn release(&self) -> f64 {
        self.release
    }

    /// Set attack time in seconds
    pub fn set_attack(&mut self, seconds: f64) {
        self.attack = seconds.clamp(ATTACK_RANGE.0, ATTACK_RANGE.1);
    }

    /// Set release time in seconds
    pub fn set_release(&mut self, seconds: f64) {
        self.release = seconds.clamp(RELEASE_RANGE.0, RELEASE_RANGE.1);
    }
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self::new(0.1, 0.3)
    }
}

/// A scheduled change on a `GainParam`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Automation {
    /// Jump to `value` at `time`
    SetValue { time: f64, value: f32 },
    /// Ramp linearly from the previous event to `value`, arriving at `time`
    LinearRamp { time: f64, value: f32 },
}

impl Automation {
    pub fn time(&self) -> f64 {
        match *self {
            Automation::SetValue { time, .. } | Automation::LinearRamp { time, .. } => time,
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            Automation::SetValue { value, .. } | Automation::LinearRamp { value, .. } => value,
        }
    }
}

/// Gain control driven by scheduled automation events
#[derive(Debug, Clone)]
pub struct GainParam {
    initial: f32,
    events: Vec<Automation>,
}

impl GainParam {
    /// Create a gain control resting at `initial`
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            events: Vec::with_capacity(4),
        }
    }

    /// Scheduled events, ordered by time
    pub fn events(&self) -> &[Automation] {
        &self.events
    }

    /// Jump to `value` at `time`
    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(Automation::SetValue { time, value });
    }

    /// Ramp linearly to `value`, arriving at `time`
    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(Automation::LinearRamp { time, value });
    }

    /// Drop every event scheduled at or after `time`
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Evaluate the lane at `time`
    pub fn value_at(&self, time: f64) -> f32 {
        let mut prev_time = 0.0;
        let mut prev_value = self.initial;

        for event in &self.events {
            match *event {
                Automation::SetValue { time: t, value } => {
                    if t > time {
                        return prev_value;
                    }
                    prev_time = t;
                    prev_value = value;
                }
                Automation::LinearRamp { time: t, value } => {
                    if t > time {
                        if time <= prev_time {
                            return prev_value;
                        }
                        let progress = ((time - prev_time) / (t - prev_time)) as f32;
                        return prev_value + (value - prev_value) * progress;
                    }
                    prev_time = t;
                    prev_value = value;
                }
            }
        }

        prev_value
    }

    /// Time of the last scheduled event, if any
    pub fn end_time(&self) -> Option<f64> {
        self.events.last().map(Automation::time)
    }

    /// Collapse events that are fully in the past into one anchor
    ///
    /// Keeps the lane short for long-held voices without changing any value
    /// `value_at` returns for times >= `time`.
    pub fn prune(&mut self, time: f64) {
        let past = self.events.iter().take_while(|e| e.time() <= time).count();
        if past > 1 {
            let anchor = self.events[past - 1];
            self.events.drain(..past - 1);
            self.events[0] = Automation::SetValue {
                time: anchor.time(),
                value: anchor.value(),
            };
        }
    }

    fn insert(&mut self, event: Automation) {
        let idx = self
            .events
            .iter()
            .position(|e| e.time() > event.time())
            .unwrap_or(self.events.len());
        self.events.insert(idx, event);
    }
}
