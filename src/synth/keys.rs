//! Computer-keyboard note layout and pitch math

use std::fmt;

/// Keys in semitone order: the home row plays white keys, the row above
/// plays black keys, spanning one octave plus a minor second.
pub const KEY_LAYOUT: [char; 13] = [
    'a', 'w', 's', 'e', 'd', 'f', 't', 'g', 'y', 'h', 'u', 'j', 'k',
];

/// Octave shift range
pub const OCTAVE_RANGE: (i8, i8) = (-2, 2);

/// One of the 13 playable keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(u8);

impl Key {
    /// Look up a key by the character it is bound to (case-insensitive)
    pub fn from_char(c: char) -> Option<Self> {
        let c = c.to_ascii_lowercase();
        KEY_LAYOUT
            .iter()
            .position(|&k| k == c)
            .map(|idx| Key(idx as u8))
    }

    /// Key with the given semitone offset (0..=12)
    pub fn from_offset(offset: u8) -> Option<Self> {
        ((offset as usize) < KEY_LAYOUT.len()).then_some(Key(offset))
    }

    /// All keys in layout order
    pub fn all() -> impl Iterator<Item = Key> {
        (0..KEY_LAYOUT.len() as u8).map(Key)
    }

    /// Semitones above the sample's root pitch
    pub fn semitone_offset(self) -> u8 {
        self.0
    }

    /// The character this key is bound to
    pub fn label(self) -> char {
        KEY_LAYOUT[self.0 as usize]
    }

    /// Whether this is a black key on a piano keyboard
    pub fn is_sharp(self) -> bool {
        matches!(self.0 % 12, 1 | 3 | 6 | 8 | 10)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label().to_ascii_uppercase())
    }
}

/// Clamp an octave shift to the supported range
pub fn clamp_octave(octave: i8) -> i8 {
    octave.clamp(OCTAVE_RANGE.0, OCTAVE_RANGE.1)
}

/// Resampling ratio for a key at an octave shift
///
/// `2^((offset + 12 * octave) / 12)`
pub fn playback_rate(key: Key, octave: i8) -> f64 {
    let semitones = key.semitone_offset() as f64 + 12.0 * octave as f64;
    2f64.powf(semitones / 12.0)
}
