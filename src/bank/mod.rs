//! SoundFont 2 bank export
//!
//! Turns the current sample into a single-preset, single-instrument bank.
//! The serializer is pure: the same sample and options always produce the
//! same bytes.

mod layout;
mod writer;

pub use layout::{encoded_len, MAX_SAMPLES};
pub use writer::{quantize, serialize, serialize_with};

use crate::sample::Sample;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Content type for exported banks
pub const MIME_TYPE: &str = "audio/x-soundfont";

/// File name offered for exported banks
pub const SUGGESTED_FILE_NAME: &str = "sample.sf2";

/// Smallest bank considered valid
pub const MIN_BANK_SIZE: usize = 1024;

/// Name written to the `INAM` chunk unless overridden
pub const DEFAULT_BANK_NAME: &str = "Sampleboard Sample";

/// Stored sample rates are clamped to this range
pub const SAMPLE_RATE_RANGE: (u32, u32) = (8000, 96000);

/// Byte order of numeric fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Standard RIFF
    #[default]
    Little,
    /// Layout produced by the legacy exporter
    Big,
}

/// Static metadata for a bank
#[derive(Debug, Clone, PartialEq)]
pub struct BankOptions {
    pub name: String,
    pub byte_order: ByteOrder,
}

impl Default for BankOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_BANK_NAME.to_string(),
            byte_order: ByteOrder::Little,
        }
    }
}

#[derive(Debug, Error)]
pub enum BankError {
    #[error("bank is {size} bytes, below the {minimum} byte minimum")]
    TooSmall { size: usize, minimum: usize },

    #[error("{samples} samples do not fit a 32-bit bank")]
    TooLong { samples: usize },

    #[error("wrote {written} bytes, expected {expected}")]
    SizeMismatch { expected: usize, written: usize },

    #[error("failed to write bank: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize `sample` and write it to `path`
///
/// Nothing touches the file system unless serialization succeeds.
pub fn write_bank(path: &Path, sample: &Sample, options: &BankOptions) -> Result<usize, BankError> {
    let bytes = serialize_with(sample, options)?;
    std::fs::write(path, &bytes)?;
    info!(
        path = %path.display(),
        bytes = bytes.len(),
        byte_order = ?options.byte_order,
        "exported bank"
    );
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_bank() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SUGGESTED_FILE_NAME);
        let sample = Sample::mono(44100, vec![0.25; 1000]).unwrap();

        let written = write_bank(&path, &sample, &BankOptions::default()).unwrap();
        assert_eq!(written, encoded_len(1000));

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, serialize(&sample).unwrap());
    }

    #[test]
    fn test_write_bank_rejected_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny.sf2");
        let sample = Sample::mono(44100, vec![0.5; 10]).unwrap();

        let err = write_bank(&path, &sample, &BankOptions::default()).unwrap_err();
        assert!(matches!(err, BankError::TooSmall { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_byte_order_parsing() {
        let order: ByteOrder = serde_yaml::from_str("big").unwrap();
        assert_eq!(order, ByteOrder::Big);
        assert_eq!(ByteOrder::default(), ByteOrder::Little);
    }
}
