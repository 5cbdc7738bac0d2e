//! WAV decoding into `Sample`

use super::{Sample, SampleError};
use hound::{SampleFormat, WavReader};
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;

/// Input could not be turned into a `Sample`
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decode WAV data: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audio contains no frames")]
    Empty,

    #[error("decoded audio is invalid: {0}")]
    Invalid(#[from] SampleError),
}

impl Sample {
    /// Decode a WAV file from disk
    pub fn from_wav_file(path: &Path) -> Result<Self, DecodeError> {
        let reader = WavReader::open(path)?;
        decode(reader)
    }

    /// Decode an in-memory WAV file
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let reader = WavReader::new(Cursor::new(bytes))?;
        decode(reader)
    }
}

fn decode<R: Read>(reader: WavReader<R>) -> Result<Sample, DecodeError> {
    let spec = reader.spec();
    let channel_count = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    if interleaved.len() < channel_count {
        return Err(DecodeError::Empty);
    }

    let frames = interleaved.len() / channel_count;
    let mut channels = vec![Vec::with_capacity(frames); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, &value) in channels.iter_mut().zip(frame) {
            channel.push(value);
        }
    }

    Ok(Sample::new(spec.sample_rate, channels)?)
}
