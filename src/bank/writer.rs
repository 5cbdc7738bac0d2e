//! Single-pass bank encoder

use super::layout::{
    data_len, encoded_len, pad_len, sdta_list_size, BAG_RECORD, BANK_NAME_LEN, ENGINE_NAME_LEN,
    GEN_RECORD, INFO_LIST_SIZE, INST_RECORD, MAX_SAMPLES, MOD_RECORD, PDTA_LIST_SIZE,
    PHDR_RECORD, RECORD_NAME_LEN, SHDR_RECORD,
};
use super::{BankError, BankOptions, ByteOrder, MIN_BANK_SIZE, SAMPLE_RATE_RANGE};
use crate::sample::Sample;

/// Generator operator selecting the instrument of a preset zone
const GEN_INSTRUMENT: u16 = 41;
/// Generator operator selecting the sample of an instrument zone
const GEN_SAMPLE_ID: u16 = 53;
/// MIDI key the sample plays back unshifted
const ORIGINAL_PITCH: u8 = 60;
const MONO_SAMPLE: u16 = 1;

const ZONE_NAME: &str = "Sample";
const SOUND_ENGINE: &str = "EMU8000";

/// Quantize one sample to 16-bit PCM after applying `gain`
///
/// Rounds half up; non-finite input becomes silence.
pub fn quantize(sample: f32, gain: f32) -> i16 {
    let scaled = (sample * gain).clamp(-1.0, 1.0);
    let q = (scaled * 32767.0 + 0.5).floor();
    q.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Serialize with the default options
pub fn serialize(sample: &Sample) -> Result<Vec<u8>, BankError> {
    serialize_with(sample, &BankOptions::default())
}

/// Encode the first channel of `sample` as a SoundFont 2 bank
pub fn serialize_with(sample: &Sample, options: &BankOptions) -> Result<Vec<u8>, BankError> {
    let data = sample.channel(0).unwrap_or(&[]);
    let samples = data.len();
    if samples > MAX_SAMPLES {
        return Err(BankError::TooLong { samples });
    }

    let expected = encoded_len(samples);
    if expected < MIN_BANK_SIZE {
        return Err(BankError::TooSmall {
            size: expected,
            minimum: MIN_BANK_SIZE,
        });
    }

    let peak = data.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
    let gain = if peak > 0.0 { 1.0 / peak } else { 1.0 };
    let rate = sample
        .sample_rate()
        .clamp(SAMPLE_RATE_RANGE.0, SAMPLE_RATE_RANGE.1);

    let mut w = ChunkWriter::with_capacity(expected, options.byte_order);

    w.header(b"RIFF", expected - 8);
    w.tag(b"sfbk");

    w.list(b"INFO", INFO_LIST_SIZE);
    w.header(b"ifil", 4);
    w.u16(2);
    w.u16(1);
    w.header(b"isng", ENGINE_NAME_LEN);
    w.name(SOUND_ENGINE, ENGINE_NAME_LEN);
    w.header(b"INAM", BANK_NAME_LEN);
    w.name(&options.name, BANK_NAME_LEN);

    w.list(b"sdta", sdta_list_size(samples));
    w.header(b"smpl", data_len(samples));
    for &s in data {
        w.i16(quantize(s, gain));
    }
    w.zeros(pad_len(samples));

    w.list(b"pdta", PDTA_LIST_SIZE);

    w.header(b"phdr", 2 * PHDR_RECORD);
    w.preset_header(ZONE_NAME, 0);
    w.preset_header("EOP", 1);

    w.header(b"pbag", 2 * BAG_RECORD);
    w.bag(0, 0);
    w.bag(1, 0);

    w.header(b"pmod", MOD_RECORD);
    w.zeros(MOD_RECORD);

    w.header(b"pgen", 2 * GEN_RECORD);
    w.generator(GEN_INSTRUMENT, 0);
    w.zeros(GEN_RECORD);

    w.header(b"inst", 2 * INST_RECORD);
    w.name(ZONE_NAME, RECORD_NAME_LEN);
    w.u16(0);
    w.name("EOI", RECORD_NAME_LEN);
    w.u16(1);

    w.header(b"ibag", 2 * BAG_RECORD);
    w.bag(0, 0);
    w.bag(1, 0);

    w.header(b"imod", MOD_RECORD);
    w.zeros(MOD_RECORD);

    w.header(b"igen", 2 * GEN_RECORD);
    w.generator(GEN_SAMPLE_ID, 0);
    w.zeros(GEN_RECORD);

    w.header(b"shdr", 2 * SHDR_RECORD);
    w.name(ZONE_NAME, RECORD_NAME_LEN);
    w.u32(0);
    w.u32(samples as u32);
    w.u32(0);
    w.u32(samples as u32);
    w.u32(rate);
    w.u8(ORIGINAL_PITCH);
    w.u8(0); // pitch correction
    w.u16(0); // sample link
    w.u16(MONO_SAMPLE);
    w.name("EOS", RECORD_NAME_LEN);
    w.zeros(SHDR_RECORD - RECORD_NAME_LEN);

    let bytes = w.into_inner();
    if bytes.len() != expected {
        return Err(BankError::SizeMismatch {
            expected,
            written: bytes.len(),
        });
    }
    Ok(bytes)
}

/// Appends RIFF fields in a fixed byte order
struct ChunkWriter {
    buf: Vec<u8>,
    order: ByteOrder,
}

impl ChunkWriter {
    fn with_capacity(capacity: usize, order: ByteOrder) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            order,
        }
    }

    fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// FourCC tags are ASCII regardless of byte order
    fn tag(&mut self, tag: &[u8; 4]) {
        self.buf.extend_from_slice(tag);
    }

    fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn u16(&mut self, value: u16) {
        match self.order {
            ByteOrder::Little => self.buf.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::Big => self.buf.extend_from_slice(&value.to_be_bytes()),
        }
    }

    fn i16(&mut self, value: i16) {
        match self.order {
            ByteOrder::Little => self.buf.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::Big => self.buf.extend_from_slice(&value.to_be_bytes()),
        }
    }

    fn u32(&mut self, value: u32) {
        match self.order {
            ByteOrder::Little => self.buf.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::Big => self.buf.extend_from_slice(&value.to_be_bytes()),
        }
    }

    fn zeros(&mut self, count: usize) {
        self.buf.resize(self.buf.len() + count, 0);
    }

    // Sizes are bounded by MAX_SAMPLES before anything is written
    fn header(&mut self, tag: &[u8; 4], size: usize) {
        self.tag(tag);
        self.u32(size as u32);
    }

    fn list(&mut self, form: &[u8; 4], size: usize) {
        self.header(b"LIST", size);
        self.tag(form);
    }

    /// Fixed-width name, zero padded; keeps at least one terminating zero
    fn name(&mut self, name: &str, width: usize) {
        let bytes: Vec<u8> = name
            .chars()
            .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'_' })
            .take(width - 1)
            .collect();
        self.buf.extend_from_slice(&bytes);
        self.zeros(width - bytes.len());
    }

    fn preset_header(&mut self, name: &str, bag: u16) {
        self.name(name, RECORD_NAME_LEN);
        self.u16(0); // preset
        self.u16(0); // bank
        self.u16(bag);
        self.zeros(12); // library, genre, morphology
    }

    fn bag(&mut self, generator: u16, modulator: u16) {
        self.u16(generator);
        self.u16(modulator);
    }

    fn generator(&mut self, oper: u16, amount: u16) {
        self.u16(oper);
        self.u16(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Offset of the first sample word
    const SMPL_DATA: usize = 100;

    /// Last occurrence, so sample data can never shadow a hydra tag
    fn find_tag(bytes: &[u8], tag: &[u8; 4]) -> usize {
        bytes
            .windows(4)
            .rposition(|w| w == tag)
            .unwrap_or_else(|| panic!("missing {:?}", std::str::from_utf8(tag)))
    }

    fn le_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn le_u16(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes(bytes[at..at + 2].try_into().unwrap())
    }

    fn le_i16(bytes: &[u8], at: usize) -> i16 {
        i16::from_le_bytes(bytes[at..at + 2].try_into().unwrap())
    }

    fn tone(frames: usize, sample_rate: u32) -> Sample {
        let data = (0..frames)
            .map(|i| 0.5 * (i as f32 * 0.05).sin())
            .collect();
        Sample::mono(sample_rate, data).unwrap()
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(0.0, 1.0), 0);
        assert_eq!(quantize(1.0, 1.0), 32767);
        assert_eq!(quantize(-1.0, 1.0), -32767);
        assert_eq!(quantize(2.0, 1.0), 32767);
        assert_eq!(quantize(-3.0, 1.0), -32767);
        assert_eq!(quantize(0.25, 2.0), 16384);
        assert_eq!(quantize(f32::NAN, 1.0), 0);
    }

    #[test]
    fn test_serialize_is_deterministic() {
        let sample = tone(2000, 44100);
        assert_eq!(serialize(&sample).unwrap(), serialize(&sample).unwrap());
    }

    #[test]
    fn test_container_header() {
        let bytes = serialize(&tone(1000, 44100)).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(le_u32(&bytes, 4) as usize, bytes.len() - 8);
        assert_eq!(&bytes[8..12], b"sfbk");
        assert_eq!(&bytes[12..16], b"LIST");
        assert_eq!(le_u32(&bytes, 16), 60);
        assert_eq!(&bytes[20..24], b"INFO");
        assert_eq!(&bytes[24..28], b"ifil");
        assert_eq!(le_u16(&bytes, 32), 2);
        assert_eq!(le_u16(&bytes, 34), 1);
        assert_eq!(&bytes[44..52], b"EMU8000\0");
        assert_eq!(&bytes[60..78], crate::bank::DEFAULT_BANK_NAME.as_bytes());
        assert_eq!(&bytes[88..92], b"sdta");
        assert_eq!(&bytes[92..96], b"smpl");
        assert_eq!(le_u32(&bytes, 96), 2000);

        let pdta = find_tag(&bytes, b"pdta");
        assert_eq!(le_u32(&bytes, pdta - 4), 340);
    }

    #[test]
    fn test_length_matches_encoded_len() {
        for frames in [288, 289, 1000, 4410] {
            let bytes = serialize(&tone(frames, 44100)).unwrap();
            assert_eq!(bytes.len(), encoded_len(frames));
        }
    }

    #[test]
    fn test_normalizes_to_full_scale() {
        let mut data = vec![0.0; 500];
        data[0] = 0.5;
        data[1] = -0.25;
        data[2] = -0.5;
        let sample = Sample::mono(44100, data).unwrap();
        let bytes = serialize(&sample).unwrap();

        assert_eq!(le_i16(&bytes, SMPL_DATA), 32767);
        assert_eq!(le_i16(&bytes, SMPL_DATA + 2), -16383);
        assert_eq!(le_i16(&bytes, SMPL_DATA + 4), -32767);
        assert_eq!(le_i16(&bytes, SMPL_DATA + 6), 0);
    }

    #[test]
    fn test_uses_first_channel_only() {
        let sample = Sample::new(44100, vec![vec![0.1; 600], vec![0.9; 600]]).unwrap();
        let bytes = serialize(&sample).unwrap();

        assert_eq!(bytes.len(), encoded_len(600));
        // Peak comes from the first channel, so it normalizes to full scale
        assert_eq!(le_i16(&bytes, SMPL_DATA), 32767);
    }

    #[test]
    fn test_sample_rate_is_clamped() {
        let rate_of = |sample: &Sample| {
            let bytes = serialize(sample).unwrap();
            let record = find_tag(&bytes, b"shdr") + 8;
            le_u32(&bytes, record + 36)
        };

        assert_eq!(rate_of(&tone(1000, 192000)), 96000);
        assert_eq!(rate_of(&tone(1000, 4000)), 8000);
        assert_eq!(rate_of(&tone(1000, 22050)), 22050);
    }

    #[test]
    fn test_sample_header_record() {
        let bytes = serialize(&tone(1000, 44100)).unwrap();
        let shdr = find_tag(&bytes, b"shdr");
        assert_eq!(le_u32(&bytes, shdr + 4), 92);

        let record = shdr + 8;
        assert_eq!(&bytes[record..record + 7], b"Sample\0");
        assert_eq!(le_u32(&bytes, record + 20), 0);
        assert_eq!(le_u32(&bytes, record + 24), 1000);
        assert_eq!(le_u32(&bytes, record + 28), 0);
        assert_eq!(le_u32(&bytes, record + 32), 1000);
        assert_eq!(bytes[record + 40], 60);
        assert_eq!(bytes[record + 41], 0);
        assert_eq!(le_u16(&bytes, record + 42), 0);
        assert_eq!(le_u16(&bytes, record + 44), 1);

        let terminal = record + 46;
        assert_eq!(&bytes[terminal..terminal + 4], b"EOS\0");
        assert_eq!(terminal + 46, bytes.len());
    }

    #[test]
    fn test_generators_link_zones() {
        let bytes = serialize(&tone(1000, 44100)).unwrap();

        let pgen = find_tag(&bytes, b"pgen");
        assert_eq!(le_u16(&bytes, pgen + 8), 41);
        assert_eq!(le_u16(&bytes, pgen + 10), 0);

        let igen = find_tag(&bytes, b"igen");
        assert_eq!(le_u16(&bytes, igen + 8), 53);
        assert_eq!(le_u16(&bytes, igen + 10), 0);

        let phdr = find_tag(&bytes, b"phdr");
        assert_eq!(&bytes[phdr + 8 + 38..phdr + 8 + 41], b"EOP");
        assert_eq!(le_u16(&bytes, phdr + 8 + 38 + 24), 1);

        let inst = find_tag(&bytes, b"inst");
        assert_eq!(&bytes[inst + 8 + 22..inst + 8 + 25], b"EOI");
    }

    #[test]
    fn test_too_small_is_rejected() {
        let empty = Sample::mono(44100, vec![]).unwrap();
        assert!(matches!(
            serialize(&empty),
            Err(BankError::TooSmall { size: 448, minimum: 1024 })
        ));

        assert!(matches!(
            serialize(&tone(287, 44100)),
            Err(BankError::TooSmall { size: 1022, .. })
        ));
        assert_eq!(serialize(&tone(288, 44100)).unwrap().len(), 1024);
    }

    #[test]
    fn test_two_seconds_of_silence() {
        let sample = Sample::mono(44100, vec![0.0; 88200]).unwrap();
        let bytes = serialize(&sample).unwrap();

        assert_eq!(bytes.len(), 448 + 176400);
        assert_eq!(le_u32(&bytes, 96), 176400);
        assert!(bytes[SMPL_DATA..SMPL_DATA + 176400].iter().all(|&b| b == 0));
        assert_eq!(&bytes[SMPL_DATA + 176400 + 8..SMPL_DATA + 176400 + 12], b"pdta");
    }

    #[test]
    fn test_big_endian_layout() {
        let sample = tone(1000, 44100);
        let options = BankOptions {
            byte_order: ByteOrder::Big,
            ..BankOptions::default()
        };
        let big = serialize_with(&sample, &options).unwrap();
        let little = serialize(&sample).unwrap();

        assert_eq!(big.len(), little.len());
        assert_eq!(&big[0..4], b"RIFF");
        assert_eq!(&big[8..12], b"sfbk");
        let size = u32::from_be_bytes(big[4..8].try_into().unwrap());
        assert_eq!(size as usize, big.len() - 8);
        assert_eq!(u16::from_be_bytes(big[32..34].try_into().unwrap()), 2);

        // Same words, swapped bytes
        assert_ne!(little[SMPL_DATA + 2], little[SMPL_DATA + 3]);
        assert_eq!(big[SMPL_DATA + 2], little[SMPL_DATA + 3]);
        assert_eq!(big[SMPL_DATA + 3], little[SMPL_DATA + 2]);
    }

    #[test]
    fn test_long_names_are_truncated() {
        let options = BankOptions {
            name: "A very long bank name that overflows".to_string(),
            ..BankOptions::default()
        };
        let bytes = serialize_with(&tone(1000, 44100), &options).unwrap();

        assert_eq!(&bytes[60..79], b"A very long bank na");
        assert_eq!(bytes[79], 0);
        assert_eq!(&bytes[80..84], b"LIST");
    }
}
