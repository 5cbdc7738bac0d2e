//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<SamplerConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {:?}", path))?;
    let config: SamplerConfig = serde_yaml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration, falling back to defaults when the file is missing
pub fn load_or_default(path: &Path) -> Result<SamplerConfig> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(SamplerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use std::io::Write;

    #[test]
    fn test_load_minimal_config() {
        let yaml = r#"
audio:
  sample_rate: 44100
  buffer_size: 512

master:
  volume: 0.7

envelope:
  attack: 0.05
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.master.volume, 0.7);
        assert_eq!(config.envelope.attack, 0.05);
        assert_eq!(config.envelope.release, 0.3);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"effect:\n  reverb_amount: 2.0\n").unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(&dir.path().join("missing.yaml")).unwrap();
        assert_eq!(config.audio.sample_rate, 44100);
    }

    #[test]
    fn test_example_config_is_valid() {
        let config: SamplerConfig =
            serde_yaml::from_str(include_str!("../../sampleboard.example.yaml")).unwrap();
        assert!(config.validate().is_ok());
    }
}
