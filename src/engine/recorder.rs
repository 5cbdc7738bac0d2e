//! WAV file output
//!
//! Records engine output offline and saves samples to disk.

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use super::Engine;
use crate::sample::Sample;

/// Frames rendered per write when recording from an engine
const RENDER_BLOCK: usize = 512;

/// Extra time rendered after the last release so the delay tail rings out
const TAIL_SECS: f64 = 1.0;

/// Writes 32-bit float mono WAV files
pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    sample_rate: u32,
    samples_written: u64,
}

impl Recorder {
    pub fn new(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer,
            sample_rate,
            samples_written: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Get the duration recorded in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples_written as f64 / self.sample_rate as f64
    }

    /// Write a buffer of samples
    pub fn write_buffer(&mut self, buffer: &[f32]) -> Result<()> {
        for &sample in buffer {
            self.writer
                .write_sample(sample)
                .context("failed to write sample")?;
        }
        self.samples_written += buffer.len() as u64;
        Ok(())
    }

    /// Render `seconds` of engine output straight into the file
    pub fn record(&mut self, engine: &mut Engine, seconds: f64) -> Result<()> {
        let mut remaining = (seconds.max(0.0) * engine.sample_rate() as f64).ceil() as usize;
        let mut block = [0.0f32; RENDER_BLOCK];
        while remaining > 0 {
            let len = remaining.min(RENDER_BLOCK);
            engine.fill_buffer(&mut block[..len]);
            self.write_buffer(&block[..len])?;
            remaining -= len;
        }
        Ok(())
    }

    /// Finalize the WAV file
    ///
    /// This must be called to properly close the file and write the header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("failed to finalize WAV file")
    }
}

/// Play a note pattern through the engine and record the result
///
/// The pattern is whitespace separated steps. Each step lists the keys
/// pressed together, or `-` for a rest. Every step lasts `note_length`
/// seconds; keys are released at the end of their step.
///
/// Returns the number of frames written.
pub fn bounce(engine: &mut Engine, pattern: &str, note_length: f64, path: &Path) -> Result<u64> {
    if !engine.has_sample() {
        bail!("no sample loaded; nothing to bounce");
    }
    if note_length <= 0.0 {
        bail!("note length must be positive");
    }

    let steps: Vec<&str> = pattern.split_whitespace().collect();
    for step in &steps {
        if *step != "-" {
            if let Some(c) = step.chars().find(|&c| crate::synth::Key::from_char(c).is_none()) {
                bail!("'{}' is not on the keyboard", c);
            }
        }
    }

    let mut recorder = Recorder::new(path, engine.sample_rate())?;
    for step in &steps {
        if *step != "-" {
            for c in step.chars() {
                engine.key_down(c);
            }
        }
        recorder.record(engine, note_length)?;
        if *step != "-" {
            for c in step.chars() {
                engine.key_up(c);
            }
        }
    }
    recorder.record(engine, engine.envelope().release() + TAIL_SECS)?;

    let frames = recorder.samples_written();
    let duration = recorder.duration_secs();
    recorder.finalize()?;
    info!(path = %path.display(), steps = steps.len(), duration, "bounced pattern");
    Ok(frames)
}

/// Save a sample as a 32-bit float WAV with its own rate and channel count
pub fn write_sample_wav(path: &Path, sample: &Sample) -> Result<()> {
    let spec = WavSpec {
        channels: sample.channel_count() as u16,
        sample_rate: sample.sample_rate(),
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create WAV file: {:?}", path))?;

    for frame in 0..sample.frame_count() {
        for ch in 0..sample.channel_count() {
            let value = sample.channel(ch).map_or(0.0, |c| c[frame]);
            writer.write_sample(value).context("failed to write sample")?;
        }
    }
    writer.finalize().context("failed to finalize WAV file")
}
