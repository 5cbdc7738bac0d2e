//! Sampleboard - keyboard sample player with SoundFont export

use anyhow::{bail, Context, Result};
use clap::Parser;
use sampleboard::bank::{self, BankOptions, ByteOrder};
use sampleboard::config;
use sampleboard::engine::{self, Engine, Player};
use sampleboard::generate::{self, GenerationClient};
use sampleboard::sample::Sample;
use sampleboard::viz::{self, SampleBuffer};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

/// Samples kept for the waveform display
const VIZ_BUFFER_SIZE: usize = 8192;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config: config_path,
            sample,
            export_path,
        } => {
            let mut cfg = config::load_or_default(&config_path)?;

            // Render at whatever rate the device runs at
            cfg.audio.sample_rate = engine::default_output_rate(cfg.audio.device.as_deref())?;

            let mut engine = Engine::new(cfg);
            match sample {
                Some(sample) => {
                    engine
                        .load_sample(&sample)
                        .with_context(|| format!("failed to load sample {:?}", sample))?;
                }
                None => {
                    info!("no sample given, playing a 440 Hz tone");
                    engine.replace_sample(Sample::fallback_tone(engine.sample_rate())?);
                }
            }

            let engine = Arc::new(Mutex::new(engine));
            let buffer = Arc::new(Mutex::new(SampleBuffer::new(VIZ_BUFFER_SIZE)));

            let mut player = Player::new();
            player.start_with_viz(engine.clone(), Some(buffer.clone()))?;

            let result = viz::run_keyboard(engine.clone(), buffer, export_path);

            player.stop();
            if let Ok(mut engine) = engine.lock() {
                engine.shutdown();
            }
            result?;
        }

        Commands::Export {
            config: config_path,
            sample,
            output,
            name,
            big_endian,
        } => {
            let cfg = config::load_or_default(&config_path)?;
            let source = Sample::from_wav_file(&sample)
                .with_context(|| format!("failed to load sample {:?}", sample))?;

            let options = BankOptions {
                name: name.unwrap_or(cfg.export.name),
                byte_order: if big_endian { ByteOrder::Big } else { cfg.export.byte_order },
            };

            let bytes = bank::write_bank(&output, &source, &options)?;
            println!("Exported {:?} ({} bytes, {})", output, bytes, bank::MIME_TYPE);
        }

        Commands::Generate {
            config: config_path,
            prompt,
            output,
            local,
            seed,
            duration,
        } => {
            let mut cfg = config::load_or_default(&config_path)?;
            if let Some(seed) = seed {
                cfg.generation.seed = seed;
            }
            if let Some(duration) = duration {
                cfg.generation.duration = duration;
            }
            cfg.validate()?;

            if prompt.trim().is_empty() {
                bail!("prompt is required");
            }

            let sample = if local {
                let seed = u64::try_from(cfg.generation.seed).ok();
                generate::synthesize(&prompt, cfg.generation.duration as f64, seed)?
            } else {
                println!("Requesting sample from {}...", cfg.generation.endpoint);
                let client = GenerationClient::new(cfg.generation.clone())?;
                let rt = tokio::runtime::Runtime::new()?;
                rt.block_on(client.generate(&prompt))?
            };

            engine::recorder::write_sample_wav(&output, &sample)?;
            println!(
                "Saved {:.2}s sample to {:?}",
                sample.duration_secs(),
                output
            );
        }

        Commands::Bounce {
            config: config_path,
            sample,
            notes,
            note_length,
            output,
        } => {
            let cfg = config::load_or_default(&config_path)?;
            let mut engine = Engine::new(cfg);
            engine
                .load_sample(&sample)
                .with_context(|| format!("failed to load sample {:?}", sample))?;

            let frames = engine::recorder::bounce(&mut engine, &notes, note_length, &output)?;
            engine.shutdown();
            println!(
                "Bounced {:.2}s to {:?}",
                frames as f64 / engine.sample_rate() as f64,
                output
            );
        }

        Commands::Devices => {
            println!("Available output devices:\n");

            let default_rate = engine::default_output_rate(None).ok();
            if let Some(rate) = default_rate {
                println!("Default output runs at {} Hz\n", rate);
            }

            let devices = engine::list_output_devices();
            if devices.is_empty() {
                println!("  (none found)");
            }
            for (name, config) in devices {
                println!(
                    "  - {} ({} Hz, {} ch)",
                    name, config.sample_rate.0, config.channels
                );
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Buffer size: {} frames", cfg.audio.buffer_size);
                    println!("  Master volume: {:.0}%", cfg.master.volume * 100.0);
                    println!(
                        "  Envelope: attack {:.2}s, release {:.2}s",
                        cfg.envelope.attack, cfg.envelope.release
                    );
                    println!(
                        "  Delay: {:.2}s, reverb {:.0}%",
                        cfg.effect.delay_time,
                        cfg.effect.reverb_amount * 100.0
                    );
                    println!("  Octave: {:+}", cfg.keyboard.octave);
                    println!("  Generation endpoint: {}", cfg.generation.endpoint);
                    println!(
                        "  Export: \"{}\" ({:?} endian)",
                        cfg.export.name, cfg.export.byte_order
                    );
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let example_config = include_str!("../sampleboard.example.yaml");

            let path = Path::new("sampleboard.yaml");
            if path.exists() {
                println!("sampleboard.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created sampleboard.yaml with example configuration.");
            }
        }
    }

    Ok(())
}
