//! Audio engine for Sampleboard
//!
//! Owns the audio clock, the sample store, the voice scheduler and the
//! routing graph. Control calls and the render loop share one `Engine`
//! behind a mutex; every control call is anchored to the audio clock.

mod clock;
pub mod player;
pub mod recorder;
mod routing;
mod scheduler;

pub use clock::AudioClock;
pub use player::{default_output_rate, list_output_devices, Player};
pub use recorder::Recorder;
pub use routing::{DelayLine, RoutingGraph, VoiceSource, MAX_DELAY_SECS};
pub use scheduler::{NoteOn, VoiceScheduler, STEAL_FADE_SECS};

use crate::bank::{self, BankOptions};
use crate::config::SamplerConfig;
use crate::sample::{DecodeError, Sample, SampleStore};
use crate::synth::{clamp_octave, EnvelopeParams, Key};
use anyhow::{anyhow, bail, Result};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Frames between automation pruning passes
const PRUNE_INTERVAL: u64 = 4096;

/// The main audio engine
#[derive(Debug)]
pub struct Engine {
    config: SamplerConfig,
    clock: AudioClock,
    store: SampleStore,
    scheduler: VoiceScheduler,
    graph: RoutingGraph,
    octave: i8,
    running: bool,
}

impl Engine {
    /// Build the engine and its routing graph from configuration
    pub fn new(config: SamplerConfig) -> Self {
        let sample_rate = config.audio.sample_rate;
        let envelope = EnvelopeParams::new(config.envelope.attack, config.envelope.release);
        let graph = RoutingGraph::new(
            sample_rate,
            config.effect.delay_time,
            config.master.volume,
            config.effect.reverb_amount,
        );
        let octave = clamp_octave(config.keyboard.octave);

        debug!(sample_rate, delay_samples = graph.delay_samples(), "engine initialized");

        Self {
            clock: AudioClock::new(sample_rate),
            store: SampleStore::new(),
            scheduler: VoiceScheduler::new(sample_rate, envelope),
            graph,
            octave,
            running: true,
            config,
        }
    }

    /// Release everything and stop rendering
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }
        self.scheduler.clear(&mut self.graph);
        self.graph.reset();
        self.running = false;
        info!(frames = self.clock.frames(), "engine shut down");
    }

    /// Check if the engine is running
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Get the output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.clock.sample_rate()
    }

    /// Current audio-clock time in seconds
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn scheduler(&self) -> &VoiceScheduler {
        &self.scheduler
    }

    pub fn graph(&self) -> &RoutingGraph {
        &self.graph
    }

    // Sample store

    pub fn sample(&self) -> Option<Arc<Sample>> {
        self.store.current()
    }

    pub fn has_sample(&self) -> bool {
        self.store.has_sample()
    }

    /// Decode a WAV file into the store
    ///
    /// Voices already sounding keep the sample they started with.
    pub fn load_sample(&mut self, path: &Path) -> Result<Arc<Sample>, DecodeError> {
        self.store.load_wav(path)
    }

    pub fn replace_sample(&mut self, sample: Sample) -> Arc<Sample> {
        self.store.replace(sample)
    }

    // Key events

    /// Press a keyboard character; `None` if it is not part of the layout
    pub fn key_down(&mut self, c: char) -> Option<NoteOn> {
        Key::from_char(c).map(|key| self.note_on(key))
    }

    /// Release a keyboard character
    pub fn key_up(&mut self, c: char) -> bool {
        Key::from_char(c).is_some_and(|key| self.note_off(key))
    }

    pub fn note_on(&mut self, key: Key) -> NoteOn {
        let now = self.clock.now();
        let sample = self.store.current();
        self.scheduler
            .note_on(key, self.octave, sample, &mut self.graph, now)
    }

    pub fn note_off(&mut self, key: Key) -> bool {
        let now = self.clock.now();
        self.scheduler.note_off(key, now)
    }

    pub fn all_notes_off(&mut self) {
        let now = self.clock.now();
        self.scheduler.all_notes_off(now);
    }

    /// Keys currently held down
    pub fn active_keys(&self) -> Vec<Key> {
        self.scheduler.active_keys()
    }

    pub fn sounding_voices(&self) -> usize {
        self.scheduler.sounding_voices()
    }

    // Parameters

    pub fn envelope(&self) -> EnvelopeParams {
        self.scheduler.envelope()
    }

    /// Set the attack used by subsequent notes; clamped to range
    pub fn set_attack(&mut self, seconds: f64) {
        self.scheduler.envelope_mut().set_attack(seconds);
    }

    /// Set the release used by subsequent note-offs; clamped to range
    pub fn set_release(&mut self, seconds: f64) {
        self.scheduler.envelope_mut().set_release(seconds);
    }

    pub fn reverb_amount(&self) -> f32 {
        self.graph.reverb_amount()
    }

    pub fn set_reverb_amount(&mut self, amount: f32) {
        self.graph.set_reverb_amount(amount);
    }

    pub fn master_volume(&self) -> f32 {
        self.graph.master_gain()
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.graph.set_master_gain(volume);
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    /// Set the octave shift for subsequent notes; clamped to -2..=2
    pub fn set_octave(&mut self, octave: i8) {
        self.octave = clamp_octave(octave);
    }

    // Rendering

    /// Generate the next output sample
    pub fn process(&mut self) -> f32 {
        if !self.running {
            return 0.0;
        }

        let now = self.clock.now();
        let output = self.scheduler.render(&mut self.graph, now);
        self.clock.advance(1);

        let now = self.clock.now();
        self.scheduler.collect_finished(&mut self.graph, now);
        if self.clock.frames() % PRUNE_INTERVAL == 0 {
            self.scheduler.prune(now);
        }

        output
    }

    /// Fill a buffer with samples
    pub fn fill_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process();
        }
    }

    /// Render the next `seconds` of output
    pub fn render_seconds(&mut self, seconds: f64) -> Vec<f32> {
        let frames = self.clock.frames_for(seconds.max(0.0)) as usize;
        let mut buffer = vec![0.0; frames];
        self.fill_buffer(&mut buffer);
        buffer
    }

    // Export

    pub fn bank_options(&self) -> BankOptions {
        BankOptions {
            name: self.config.export.name.clone(),
            byte_order: self.config.export.byte_order,
        }
    }

    /// What an export needs: the current sample and the bank options
    pub fn export_snapshot(&self) -> Result<(Arc<Sample>, BankOptions)> {
        let Some(sample) = self.store.current() else {
            bail!("no sample loaded; nothing to export");
        };
        Ok((sample, self.bank_options()))
    }
}

/// Export the current sample of a shared engine as a SoundFont bank
///
/// The engine is locked only to take the snapshot. Serializing and writing
/// the file happen with the lock released, so the audio callback keeps
/// rendering.
pub fn export_bank(engine: &Mutex<Engine>, path: &Path) -> Result<usize> {
    let (sample, options) = engine
        .lock()
        .map_err(|_| anyhow!("engine lock poisoned"))?
        .export_snapshot()?;
    Ok(bank::write_bank(path, &sample, &options)?)
}
