//! Real-time audio playback using cpal

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BufferSize, Device, SampleFormat, Stream, StreamConfig, SupportedBufferSize,
    SupportedStreamConfig,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::Engine;
use crate::viz::SampleBuffer;

/// Drives an `Engine` from the audio device callback
pub struct Player {
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl Player {
    pub fn new() -> Self {
        Self {
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start playing audio from the engine
    pub fn start(&mut self, engine: Arc<Mutex<Engine>>) -> Result<()> {
        self.start_with_viz(engine, None)
    }

    /// Start playing audio, mirroring the master output into `viz_buffer`
    ///
    /// The engine must have been built for the device's sample rate; see
    /// [`default_output_rate`].
    pub fn start_with_viz(
        &mut self,
        engine: Arc<Mutex<Engine>>,
        viz_buffer: Option<Arc<Mutex<SampleBuffer>>>,
    ) -> Result<()> {
        let (device_name, buffer_size) = {
            let engine = engine.lock().map_err(|_| anyhow!("engine lock poisoned"))?;
            let audio = &engine.config().audio;
            (audio.device.clone(), audio.buffer_size)
        };
        let device = output_device(device_name.as_deref())?;

        let config = device.default_output_config()?;
        let sample_format = config.sample_format();
        let stream_config = stream_config(&config, buffer_size);

        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = stream_config.sample_rate.0,
            channels = stream_config.channels,
            buffer_size = ?stream_config.buffer_size,
            "starting output stream"
        );

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        let stream = match sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(&device, &stream_config, engine, running, viz_buffer)?,
            SampleFormat::I16 => self.build_stream::<i16>(&device, &stream_config, engine, running, viz_buffer)?,
            SampleFormat::U16 => self.build_stream::<u16>(&device, &stream_config, engine, running, viz_buffer)?,
            other => return Err(anyhow!("Unsupported sample format: {:?}", other)),
        };

        stream.play()?;
        self.stream = Some(stream);

        Ok(())
    }

    /// Stop playback
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stream = None;
    }

    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
        &self,
        device: &Device,
        config: &StreamConfig,
        engine: Arc<Mutex<Engine>>,
        running: Arc<AtomicBool>,
        viz_buffer: Option<Arc<Mutex<SampleBuffer>>>,
    ) -> Result<Stream> {
        let channels = config.channels as usize;

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let silence = T::from_sample(0.0f32);
                if !running.load(Ordering::SeqCst) {
                    data.fill(silence);
                    return;
                }

                // The control thread holds the lock only briefly; skip the
                // block rather than wait on it
                let Ok(mut eng) = engine.try_lock() else {
                    data.fill(silence);
                    return;
                };

                let mut viz = viz_buffer.as_ref().and_then(|v| v.try_lock().ok());
                for frame in data.chunks_mut(channels) {
                    let sample = eng.process();
                    if let Some(buf) = viz.as_mut() {
                        buf.push(sample);
                    }
                    frame.fill(T::from_sample(sample));
                }
            },
            |err| {
                warn!(error = %err, "audio stream error");
            },
            None,
        )?;

        Ok(stream)
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// Device default format with a fixed buffer of `buffer_size` frames
///
/// The size is clamped to what the device reports it supports.
fn stream_config(supported: &SupportedStreamConfig, buffer_size: usize) -> StreamConfig {
    let wanted = u32::try_from(buffer_size).unwrap_or(u32::MAX);
    let frames = match *supported.buffer_size() {
        SupportedBufferSize::Range { min, max } => wanted.max(min).min(max),
        SupportedBufferSize::Unknown => wanted,
    };

    let mut config = supported.config();
    config.buffer_size = BufferSize::Fixed(frames);
    config
}

/// Find an output device by name, or the host default
fn output_device(name: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();
    match name {
        Some(wanted) => host
            .output_devices()?
            .find(|d| d.name().is_ok_and(|n| n == wanted))
            .ok_or_else(|| anyhow!("Output device not found: {}", wanted)),
        None => host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available")),
    }
}

/// Sample rate the output device will run at
pub fn default_output_rate(device: Option<&str>) -> Result<u32> {
    let device = output_device(device)?;
    Ok(device.default_output_config()?.sample_rate().0)
}

/// List all available output devices
pub fn list_output_devices() -> Vec<(String, StreamConfig)> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
                devices.push((name, config.into()));
            }
        }
    }

    devices
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::SampleRate;

    fn supported(buffer_size: SupportedBufferSize) -> SupportedStreamConfig {
        SupportedStreamConfig::new(2, SampleRate(48000), buffer_size, SampleFormat::F32)
    }

    #[test]
    fn test_stream_config_uses_buffer_size() {
        let config = stream_config(&supported(SupportedBufferSize::Range { min: 64, max: 4096 }), 512);
        assert_eq!(config.buffer_size, BufferSize::Fixed(512));
        assert_eq!(config.sample_rate, SampleRate(48000));
        assert_eq!(config.channels, 2);
    }

    #[test]
    fn test_stream_config_clamps_to_device_range() {
        let range = SupportedBufferSize::Range { min: 256, max: 1024 };
        assert_eq!(stream_config(&supported(range.clone()), 64).buffer_size, BufferSize::Fixed(256));
        assert_eq!(stream_config(&supported(range), 8192).buffer_size, BufferSize::Fixed(1024));

        let unknown = stream_config(&supported(SupportedBufferSize::Unknown), 2048);
        assert_eq!(unknown.buffer_size, BufferSize::Fixed(2048));
    }
}
