//! Sampleboard - keyboard sample player
//!
//! Plays one sample across a 13-key computer keyboard layout with
//! polyphonic voices, a shared delay bus and SoundFont 2 export.

pub mod bank;
pub mod config;
pub mod engine;
pub mod generate;
pub mod sample;
pub mod synth;
pub mod viz;

pub use config::SamplerConfig;
pub use engine::Engine;
pub use sample::{Sample, SampleStore};
