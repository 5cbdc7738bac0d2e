//! Audio-clock time
//!
//! Time advances only when frames are rendered, so everything scheduled
//! against it stays sample-accurate no matter how late the control thread
//! gets around to it.

#[derive(Debug, Clone)]
pub struct AudioClock {
    sample_rate: u32,
    frames: u64,
}

impl AudioClock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frames: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Current time in seconds
    pub fn now(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    pub fn advance(&mut self, frames: u64) {
        self.frames += frames;
    }

    /// Whole frames covering `seconds`
    pub fn frames_for(&self, seconds: f64) -> u64 {
        (seconds * self.sample_rate as f64).ceil() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances_by_frames() {
        let mut clock = AudioClock::new(48000);
        assert_eq!(clock.now(), 0.0);

        clock.advance(24000);
        assert_eq!(clock.frames(), 24000);
        assert_eq!(clock.now(), 0.5);
    }

    #[test]
    fn test_frames_for_rounds_up() {
        let clock = AudioClock::new(44100);
        assert_eq!(clock.frames_for(1.0), 44100);
        assert_eq!(clock.frames_for(0.01), 441);
        assert_eq!(clock.frames_for(0.00001), 1);
    }
}
