//! Voice storage
//!
//! Voices live in a slot arena addressed by generation-checked `VoiceId`s.
//! The pool is the key → voice index on top of it, bounded by `MAX_VOICES`.
//! A stolen voice leaves the pool at once but keeps its arena slot until its
//! fade has played out.

use super::keys::Key;
use super::voice::Voice;
use std::collections::HashMap;

/// Maximum number of voices in the pool
pub const MAX_VOICES: usize = 8;

/// Stable handle to a voice in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId {
    slot: u32,
    generation: u32,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    voice: Option<Voice>,
}

/// Slot arena owning every voice that is still producing sound
#[derive(Debug, Default)]
pub struct VoiceArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl VoiceArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, voice: Voice) -> VoiceId {
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.voice = Some(voice);
            return VoiceId {
                slot,
                generation: entry.generation,
            };
        }

        let slot = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            voice: Some(voice),
        });
        VoiceId { slot, generation: 0 }
    }

    pub fn get(&self, id: VoiceId) -> Option<&Voice> {
        self.slots
            .get(id.slot as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.voice.as_ref())
    }

    pub fn get_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.slots
            .get_mut(id.slot as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.voice.as_mut())
    }

    /// Free a slot; stale ids for it stop resolving
    pub fn remove(&mut self, id: VoiceId) -> Option<Voice> {
        let entry = self
            .slots
            .get_mut(id.slot as usize)
            .filter(|s| s.generation == id.generation)?;
        let voice = entry.voice.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.slot);
        Some(voice)
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (VoiceId, &Voice)> {
        self.slots.iter().enumerate().filter_map(|(slot, s)| {
            s.voice.as_ref().map(|v| {
                (
                    VoiceId {
                        slot: slot as u32,
                        generation: s.generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (VoiceId, &mut Voice)> {
        self.slots.iter_mut().enumerate().filter_map(|(slot, s)| {
            let generation = s.generation;
            s.voice.as_mut().map(|v| {
                (
                    VoiceId {
                        slot: slot as u32,
                        generation,
                    },
                    v,
                )
            })
        })
    }
}

/// Key → voice mapping with a hard size bound
#[derive(Debug)]
pub struct VoicePool {
    arena: VoiceArena,
    keys: HashMap<Key, VoiceId>,
    capacity: usize,
}

impl VoicePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            arena: VoiceArena::with_capacity(capacity * 2),
            keys: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Voices currently bound to keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.keys.len() >= self.capacity
    }

    pub fn contains_key(&self, key: Key) -> bool {
        self.keys.contains_key(&key)
    }

    pub fn id_for(&self, key: Key) -> Option<VoiceId> {
        self.keys.get(&key).copied()
    }

    pub fn voice_for(&self, key: Key) -> Option<&Voice> {
        self.id_for(key).and_then(|id| self.arena.get(id))
    }

    pub fn voice_for_mut(&mut self, key: Key) -> Option<&mut Voice> {
        let id = self.id_for(key)?;
        self.arena.get_mut(id)
    }

    /// Pool member with the smallest allocation order
    pub fn oldest(&self) -> Option<(Key, VoiceId)> {
        self.keys
            .iter()
            .filter_map(|(&key, &id)| self.arena.get(id).map(|v| (key, id, v.age_order())))
            .min_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(key, id, _)| (key, id))
    }

    /// Bind a new voice to its key
    ///
    /// Callers make room first; inserting into a full pool or over an
    /// existing key is refused and hands the voice back.
    pub fn insert(&mut self, voice: Voice) -> Result<VoiceId, Voice> {
        if self.is_full() || self.keys.contains_key(&voice.key()) {
            return Err(voice);
        }
        let key = voice.key();
        let id = self.arena.insert(voice);
        self.keys.insert(key, id);
        Ok(id)
    }

    /// Unbind a key, leaving the voice sounding in the arena
    pub fn detach(&mut self, key: Key) -> Option<VoiceId> {
        self.keys.remove(&key)
    }

    /// Free a voice entirely
    ///
    /// The key binding is dropped only if it still points at this voice.
    pub fn free(&mut self, id: VoiceId) -> Option<Voice> {
        let voice = self.arena.remove(id)?;
        if self.keys.get(&voice.key()) == Some(&id) {
            self.keys.remove(&voice.key());
        }
        Some(voice)
    }

    /// Keys bound in the pool, in layout order
    pub fn keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.keys.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn arena(&self) -> &VoiceArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut VoiceArena {
        &mut self.arena
    }
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new(MAX_VOICES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;
    use crate::synth::envelope::GainParam;
    use crate::synth::voice::PlaybackSource;
    use std::sync::Arc;

    fn voice(c: char, start: f64, serial: u64) -> Voice {
        let sample = Arc::new(Sample::mono(44100, vec![0.0; 16]).unwrap());
        let source = PlaybackSource::new(sample, 1.0, 44100);
        Voice::new(Key::from_char(c).unwrap(), source, GainParam::new(0.0), start, serial)
    }

    #[test]
    fn test_arena_reuses_slots_with_new_generation() {
        let mut arena = VoiceArena::default();
        let first = arena.insert(voice('a', 0.0, 0));
        arena.remove(first).unwrap();
        let second = arena.insert(voice('s', 0.0, 1));

        assert_ne!(first, second);
        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second).unwrap().key(), Key::from_char('s').unwrap());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_pool_refuses_duplicate_key() {
        let mut pool = VoicePool::default();
        pool.insert(voice('a', 0.0, 0)).unwrap();
        assert!(pool.insert(voice('a', 1.0, 1)).is_err());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_pool_refuses_when_full() {
        let mut pool = VoicePool::new(2);
        pool.insert(voice('a', 0.0, 0)).unwrap();
        pool.insert(voice('s', 0.0, 1)).unwrap();
        assert!(pool.is_full());
        assert!(pool.insert(voice('d', 0.0, 2)).is_err());
    }

    #[test]
    fn test_pool_oldest_uses_serial_for_ties() {
        let mut pool = VoicePool::default();
        pool.insert(voice('d', 0.5, 2)).unwrap();
        pool.insert(voice('s', 0.5, 1)).unwrap();
        pool.insert(voice('a', 0.7, 0)).unwrap();

        let (key, _) = pool.oldest().unwrap();
        assert_eq!(key, Key::from_char('s').unwrap());
    }

    #[test]
    fn test_detached_voice_stays_in_arena() {
        let mut pool = VoicePool::default();
        let id = pool.insert(voice('a', 0.0, 0)).unwrap();
        let key = Key::from_char('a').unwrap();

        assert_eq!(pool.detach(key), Some(id));
        assert!(!pool.contains_key(key));
        assert_eq!(pool.arena().len(), 1);

        // A new voice can take the key while the old one fades
        let new_id = pool.insert(voice('a', 1.0, 1)).unwrap();
        pool.free(id).unwrap();
        assert_eq!(pool.id_for(key), Some(new_id));
    }

    #[test]
    fn test_keys_sorted_by_layout() {
        let mut pool = VoicePool::default();
        pool.insert(voice('k', 0.0, 0)).unwrap();
        pool.insert(voice('a', 0.0, 1)).unwrap();
        pool.insert(voice('e', 0.0, 2)).unwrap();

        let labels: Vec<char> = pool.keys().into_iter().map(Key::label).collect();
        assert_eq!(labels, vec!['a', 'e', 'k']);
    }
}
