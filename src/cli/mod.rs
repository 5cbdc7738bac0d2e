//! CLI interface for Sampleboard

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Play a sample from the computer keyboard and export it as a SoundFont
#[derive(Parser)]
#[command(name = "sampleboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play a sample live from the terminal keyboard
    Play {
        /// Configuration file path (defaults are used if it does not exist)
        #[arg(short, long, default_value = "sampleboard.yaml")]
        config: PathBuf,

        /// WAV file to play (a 440 Hz tone if omitted)
        #[arg(short, long)]
        sample: Option<PathBuf>,

        /// Where the `p` key exports the bank
        #[arg(long, default_value = "sample.sf2")]
        export_path: PathBuf,
    },

    /// Export a WAV file as a SoundFont 2 bank
    Export {
        /// Configuration file path
        #[arg(short, long, default_value = "sampleboard.yaml")]
        config: PathBuf,

        /// WAV file to export
        #[arg(short, long)]
        sample: PathBuf,

        /// Output file path
        #[arg(short, long, default_value = "sample.sf2")]
        output: PathBuf,

        /// Bank name (overrides the config)
        #[arg(short, long)]
        name: Option<String>,

        /// Write numeric fields big-endian, as the legacy exporter did
        #[arg(long)]
        big_endian: bool,
    },

    /// Generate a sample from a text prompt
    Generate {
        /// Configuration file path
        #[arg(short, long, default_value = "sampleboard.yaml")]
        config: PathBuf,

        /// What the sample should sound like
        #[arg(short, long)]
        prompt: String,

        /// Output WAV file path
        #[arg(short, long)]
        output: PathBuf,

        /// Render with the built-in synth instead of the remote service
        #[arg(long)]
        local: bool,

        /// Seed, -1 for random (overrides the config)
        #[arg(long, allow_hyphen_values = true)]
        seed: Option<i64>,

        /// Length in seconds (overrides the config)
        #[arg(short, long)]
        duration: Option<f32>,
    },

    /// Render a note pattern offline to a WAV file
    Bounce {
        /// Configuration file path
        #[arg(short, long, default_value = "sampleboard.yaml")]
        config: PathBuf,

        /// WAV file to play
        #[arg(short, long)]
        sample: PathBuf,

        /// Steps separated by spaces; letters in one step sound together, `-` rests
        #[arg(short, long)]
        notes: String,

        /// Length of each step in seconds
        #[arg(short = 'l', long, default_value = "0.5")]
        note_length: f64,

        /// Output WAV file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List available audio devices
    Devices,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "sampleboard.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
