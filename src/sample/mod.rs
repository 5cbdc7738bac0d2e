//! Decoded sample buffers and the store that holds the current one
//!
//! A `Sample` is never mutated after construction. Loading, recording or
//! generating a new sound swaps the whole `Arc` in the `SampleStore`, so
//! voices already playing keep the buffer they were started with.

mod decode;

pub use decode::DecodeError;

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Invalid buffer shapes rejected by `Sample::new`
#[derive(Debug, Error, PartialEq)]
pub enum SampleError {
    #[error("sample has no channels")]
    NoChannels,

    #[error("channel {channel} has {len} frames, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        len: usize,
        expected: usize,
    },

    #[error("sample rate must be greater than zero")]
    ZeroSampleRate,
}

/// Immutable decoded PCM buffer
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl Sample {
    /// Create a sample from per-channel float data
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, SampleError> {
        if sample_rate == 0 {
            return Err(SampleError::ZeroSampleRate);
        }
        let expected = channels.first().ok_or(SampleError::NoChannels)?.len();
        for (channel, data) in channels.iter().enumerate().skip(1) {
            if data.len() != expected {
                return Err(SampleError::ChannelLengthMismatch {
                    channel,
                    len: data.len(),
                    expected,
                });
            }
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Half a second of a 440 Hz sine, used when no sample file is given
    pub fn fallback_tone(sample_rate: u32) -> Result<Self, SampleError> {
        let frames = sample_rate as usize / 2;
        let data = (0..frames)
            .map(|i| (2.0 * std::f64::consts::PI * 440.0 * i as f64 / sample_rate as f64).sin() as f32)
            .collect();
        Self::mono(sample_rate, data)
    }

    /// Create a single-channel sample
    pub fn mono(sample_rate: u32, data: Vec<f32>) -> Result<Self, SampleError> {
        Self::new(sample_rate, vec![data])
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Length in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Data for one channel
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Average of all channels at a frame, 0.0 past the end
    pub fn frame_mono(&self, frame: usize) -> f32 {
        if frame >= self.frame_count() {
            return 0.0;
        }
        let sum: f32 = self.channels.iter().map(|c| c[frame]).sum();
        sum / self.channels.len() as f32
    }
}

/// Holds the current playback source
#[derive(Debug, Default)]
pub struct SampleStore {
    current: Option<Arc<Sample>>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current sample
    pub fn current(&self) -> Option<Arc<Sample>> {
        self.current.clone()
    }

    pub fn has_sample(&self) -> bool {
        self.current.is_some()
    }

    /// Replace the current sample wholesale
    pub fn replace(&mut self, sample: Sample) -> Arc<Sample> {
        let sample = Arc::new(sample);
        self.current = Some(sample.clone());
        sample
    }

    /// Decode a WAV file and make it current
    ///
    /// On failure the previous sample stays in place.
    pub fn load_wav(&mut self, path: &Path) -> Result<Arc<Sample>, DecodeError> {
        let sample = Sample::from_wav_file(path)?;
        info!(
            path = %path.display(),
            channels = sample.channel_count(),
            sample_rate = sample.sample_rate(),
            frames = sample.frame_count(),
            "loaded sample"
        );
        Ok(self.replace(sample))
    }

}
