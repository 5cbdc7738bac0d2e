//! Polyphonic voice scheduling
//!
//! Key events become scheduled gain automation anchored to the audio clock.
//! Voice cleanup is driven by the same clock: `collect_finished` runs after
//! every rendered frame and frees whatever reached its stop time.

use super::routing::RoutingGraph;
use crate::sample::Sample;
use crate::synth::{
    playback_rate, EnvelopeParams, GainParam, Key, PlaybackSource, Voice, VoiceId, VoicePool,
    MAX_VOICES,
};
use std::sync::Arc;
use tracing::debug;

/// Fade applied to a stolen voice, in seconds
pub const STEAL_FADE_SECS: f64 = 0.01;

/// What a note-on did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteOn {
    /// A voice started; `stolen` names the key evicted to make room
    Started { voice: VoiceId, stolen: Option<Key> },
    /// The key already has a voice
    AlreadyActive,
    /// Nothing to play
    NoSample,
}

/// Owns the voice pool and turns key events into scheduled voices
#[derive(Debug)]
pub struct VoiceScheduler {
    pool: VoicePool,
    envelope: EnvelopeParams,
    output_rate: u32,
    next_serial: u64,
}

impl VoiceScheduler {
    pub fn new(output_rate: u32, envelope: EnvelopeParams) -> Self {
        Self {
            pool: VoicePool::new(MAX_VOICES),
            envelope,
            output_rate,
            next_serial: 0,
        }
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn envelope(&self) -> EnvelopeParams {
        self.envelope
    }

    /// Envelope used by voices started or released from now on
    pub fn set_envelope(&mut self, envelope: EnvelopeParams) {
        self.envelope = envelope;
    }

    pub fn envelope_mut(&mut self) -> &mut EnvelopeParams {
        &mut self.envelope
    }

    /// Start a voice for `key`
    ///
    /// Evicts the oldest voice first when the pool is full; eviction and
    /// insertion happen inside this one call.
    pub fn note_on(
        &mut self,
        key: Key,
        octave: i8,
        sample: Option<Arc<Sample>>,
        graph: &mut RoutingGraph,
        now: f64,
    ) -> NoteOn {
        if self.pool.contains_key(key) {
            return NoteOn::AlreadyActive;
        }
        let Some(sample) = sample else {
            return NoteOn::NoSample;
        };

        let rate = playback_rate(key, octave);
        let source = PlaybackSource::new(sample, rate, self.output_rate);

        let mut gain = GainParam::new(0.0);
        gain.set_value_at_time(0.0, now);
        gain.linear_ramp_to_value_at_time(1.0, now + self.envelope.attack());

        let stolen = if self.pool.is_full() {
            self.steal_oldest(now)
        } else {
            None
        };

        let serial = self.next_serial;
        self.next_serial += 1;

        let voice = Voice::new(key, source, gain, now, serial);
        match self.pool.insert(voice) {
            Ok(id) => {
                graph.connect(id);
                debug!(key = %key, rate, now, "voice started");
                NoteOn::Started { voice: id, stolen }
            }
            // Unreachable: the key was checked and room was made above
            Err(_) => NoteOn::AlreadyActive,
        }
    }

    /// Release the held voice for `key`
    ///
    /// Returns false if the key had no held voice.
    pub fn note_off(&mut self, key: Key, now: f64) -> bool {
        let release = self.envelope.release();
        match self.pool.voice_for_mut(key) {
            Some(voice) if voice.is_held() => {
                voice.release(now, release);
                debug!(key = %key, release, now, "voice released");
                true
            }
            _ => false,
        }
    }

    /// Release every held voice
    pub fn all_notes_off(&mut self, now: f64) {
        for key in self.pool.keys() {
            self.note_off(key, now);
        }
    }

    /// Keys whose voices are still held down
    pub fn active_keys(&self) -> Vec<Key> {
        self.pool
            .keys()
            .into_iter()
            .filter(|&k| self.pool.voice_for(k).is_some_and(Voice::is_held))
            .collect()
    }

    /// Voices still producing sound, including released and stolen ones
    pub fn sounding_voices(&self) -> usize {
        self.pool.arena().len()
    }

    /// Render all connected voices through the graph for one frame
    pub fn render(&mut self, graph: &mut RoutingGraph, now: f64) -> f32 {
        graph.process(self.pool.arena_mut(), now)
    }

    /// Free voices whose scheduled stop time has passed
    pub fn collect_finished(&mut self, graph: &mut RoutingGraph, now: f64) -> usize {
        let mut freed = 0;
        // Bounded by the arena size; no allocation on this path
        loop {
            let next = self
                .pool
                .arena()
                .iter()
                .find(|(_, v)| v.is_finished(now))
                .map(|(id, _)| id);
            let Some(id) = next else { break };
            graph.disconnect(id);
            self.pool.free(id);
            freed += 1;
        }
        freed
    }

    /// Collapse automation that is already in the past
    pub fn prune(&mut self, now: f64) {
        for (_, voice) in self.pool.arena_mut().iter_mut() {
            voice.prune(now);
        }
    }

    /// Drop every voice immediately
    pub fn clear(&mut self, graph: &mut RoutingGraph) {
        let ids: Vec<VoiceId> = self.pool.arena().iter().map(|(id, _)| id).collect();
        for id in ids {
            graph.disconnect(id);
            self.pool.free(id);
        }
    }

    fn steal_oldest(&mut self, now: f64) -> Option<Key> {
        let (key, id) = self.pool.oldest()?;
        if let Some(voice) = self.pool.arena_mut().get_mut(id) {
            voice.steal(now, STEAL_FADE_SECS);
        }
        self.pool.detach(key);
        debug!(key = %key, max_voices = MAX_VOICES, "voice limit reached, stealing oldest");
        Some(key)
    }
}
