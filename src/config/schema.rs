//! Configuration schema definitions

use crate::bank::ByteOrder;
use crate::synth::{ATTACK_RANGE, OCTAVE_RANGE, RELEASE_RANGE};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for Sampleboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Master bus settings
    #[serde(default)]
    pub master: MasterConfig,

    /// Attack/release shared by all voices
    #[serde(default)]
    pub envelope: EnvelopeConfig,

    /// Delay/feedback bus
    #[serde(default)]
    pub effect: EffectConfig,

    /// Keyboard settings
    #[serde(default)]
    pub keyboard: KeyboardConfig,

    /// Remote sample generation
    #[serde(default)]
    pub generation: GenerationConfig,

    /// SoundFont export
    #[serde(default)]
    pub export: ExportConfig,
}

impl SamplerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate audio settings
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if self.audio.buffer_size < 64 || self.audio.buffer_size > 8192 {
            bail!("Buffer size must be between 64 and 8192");
        }

        if !(0.0..=1.0).contains(&self.master.volume) {
            bail!("Master volume must be between 0.0 and 1.0");
        }

        if !(ATTACK_RANGE.0..=ATTACK_RANGE.1).contains(&self.envelope.attack) {
            bail!(
                "Attack must be between {} and {} seconds",
                ATTACK_RANGE.0,
                ATTACK_RANGE.1
            );
        }
        if !(RELEASE_RANGE.0..=RELEASE_RANGE.1).contains(&self.envelope.release) {
            bail!(
                "Release must be between {} and {} seconds",
                RELEASE_RANGE.0,
                RELEASE_RANGE.1
            );
        }

        if !(0.0..=1.0).contains(&self.effect.reverb_amount) {
            bail!("Reverb amount must be between 0.0 and 1.0");
        }
        if self.effect.delay_time <= 0.0 || self.effect.delay_time > 2.0 {
            bail!("Delay time must be greater than 0 and at most 2 seconds");
        }

        if !(OCTAVE_RANGE.0..=OCTAVE_RANGE.1).contains(&self.keyboard.octave) {
            bail!(
                "Octave must be between {} and {}",
                OCTAVE_RANGE.0,
                OCTAVE_RANGE.1
            );
        }

        let generation = &self.generation;
        if generation.endpoint.trim().is_empty() {
            bail!("Generation endpoint must not be empty");
        }
        if !(10..=50).contains(&generation.num_steps) {
            bail!("Generation steps must be between 10 and 50");
        }
        if !(1.0..=7.0).contains(&generation.cfg_strength) {
            bail!("Generation guidance must be between 1.0 and 7.0");
        }
        if !(1.0..=8.0).contains(&generation.duration) {
            bail!("Generation duration must be between 1 and 8 seconds");
        }
        if generation.seed < -1 {
            bail!("Generation seed must be -1 (random) or a non-negative number");
        }

        if self.export.name.is_empty() {
            bail!("Export name must not be empty");
        }

        Ok(())
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Buffer size in samples (default: 512)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Output device name (None = default device)
    pub device: Option<String>,
}

fn default_sample_rate() -> u32 { 44100 }
fn default_buffer_size() -> usize { 512 }

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            device: None,
        }
    }
}

/// Master bus settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Master volume 0.0-1.0 (default: 0.9)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 { 0.9 }

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
        }
    }
}

/// Envelope settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Attack in seconds, 0.01-2 (default: 0.1)
    #[serde(default = "default_attack")]
    pub attack: f64,

    /// Release in seconds, 0.1-3 (default: 0.3)
    #[serde(default = "default_release")]
    pub release: f64,
}

fn default_attack() -> f64 { 0.1 }
fn default_release() -> f64 { 0.3 }

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            attack: default_attack(),
            release: default_release(),
        }
    }
}

/// Delay/feedback bus settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectConfig {
    /// Feedback and wet level 0.0-1.0 (default: 0.2)
    #[serde(default = "default_reverb_amount")]
    pub reverb_amount: f32,

    /// Delay time in seconds (default: 0.3)
    #[serde(default = "default_delay_time")]
    pub delay_time: f64,
}

fn default_reverb_amount() -> f32 { 0.2 }
fn default_delay_time() -> f64 { 0.3 }

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            reverb_amount: default_reverb_amount(),
            delay_time: default_delay_time(),
        }
    }
}

/// Keyboard settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyboardConfig {
    /// Octave shift -2..=2 (default: 0)
    #[serde(default)]
    pub octave: i8,
}

/// Remote generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Service URL accepting generation requests
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Seed, -1 for random (default: -1)
    #[serde(default = "default_seed")]
    pub seed: i64,

    /// Diffusion steps 10-50 (default: 25)
    #[serde(default = "default_num_steps")]
    pub num_steps: u32,

    /// Guidance strength 1-7 (default: 4.5)
    #[serde(default = "default_cfg_strength")]
    pub cfg_strength: f32,

    /// Length of generated audio in seconds 1-8 (default: 1)
    #[serde(default = "default_duration")]
    pub duration: f32,

    /// Request timeout in seconds (default: 120)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String { "http://localhost:7860/api/synth/generate".to_string() }
fn default_seed() -> i64 { -1 }
fn default_num_steps() -> u32 { 25 }
fn default_cfg_strength() -> f32 { 4.5 }
fn default_duration() -> f32 { 1.0 }
fn default_timeout_secs() -> u64 { 120 }

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            seed: default_seed(),
            num_steps: default_num_steps(),
            cfg_strength: default_cfg_strength(),
            duration: default_duration(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// SoundFont export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Bank name written to the INFO chunk
    #[serde(default = "default_export_name")]
    pub name: String,

    /// Byte order of numeric fields (default: little)
    #[serde(default)]
    pub byte_order: ByteOrder,
}

fn default_export_name() -> String { "Sampleboard Sample".to_string() }

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            name: default_export_name(),
            byte_order: ByteOrder::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_audio_config() {
        let yaml = "sample_rate: 48000";
        let config: AudioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, 512); // default
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: SamplerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.master.volume, 0.9);
        assert_eq!(config.envelope.attack, 0.1);
        assert_eq!(config.envelope.release, 0.3);
        assert_eq!(config.effect.reverb_amount, 0.2);
        assert_eq!(config.keyboard.octave, 0);
        assert_eq!(config.generation.num_steps, 25);
        assert_eq!(config.export.byte_order, ByteOrder::Little);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generation_config() {
        let yaml = r#"
endpoint: "https://example.com/generate"
seed: 42
num_steps: 30
cfg_strength: 5.0
duration: 2.5
"#;
        let config: GenerationConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.endpoint, "https://example.com/generate");
        assert_eq!(config.seed, 42);
        assert_eq!(config.num_steps, 30);
        assert_eq!(config.duration, 2.5);
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_export_byte_order() {
        let config: ExportConfig = serde_yaml::from_str("byte_order: big").unwrap();
        assert_eq!(config.byte_order, ByteOrder::Big);
        assert_eq!(config.name, "Sampleboard Sample");
    }

    #[test]
    fn test_invalid_envelope() {
        let mut config = SamplerConfig::default();
        config.envelope.attack = 5.0;
        assert!(config.validate().is_err());

        let mut config = SamplerConfig::default();
        config.envelope.release = 0.01;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_octave_and_reverb() {
        let mut config = SamplerConfig::default();
        config.keyboard.octave = 3;
        assert!(config.validate().is_err());

        let mut config = SamplerConfig::default();
        config.effect.reverb_amount = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_generation() {
        let mut config = SamplerConfig::default();
        config.generation.num_steps = 5;
        assert!(config.validate().is_err());

        let mut config = SamplerConfig::default();
        config.generation.seed = -7;
        assert!(config.validate().is_err());
    }
}
