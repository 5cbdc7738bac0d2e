//! Fixed sizes of the SoundFont container
//!
//! Everything except the sample data has a constant size, so the total
//! length of a bank is known before a single byte is written.

/// Preset header record
pub const PHDR_RECORD: usize = 38;
/// Preset/instrument bag record
pub const BAG_RECORD: usize = 4;
/// Modulator record
pub const MOD_RECORD: usize = 10;
/// Generator record
pub const GEN_RECORD: usize = 4;
/// Instrument header record
pub const INST_RECORD: usize = 22;
/// Sample header record
pub const SHDR_RECORD: usize = 46;

/// Width of the fixed name fields in preset, instrument and sample headers
pub const RECORD_NAME_LEN: usize = 20;
/// Width of the `isng` sound engine field
pub const ENGINE_NAME_LEN: usize = 8;
/// Width of the `INAM` bank name field
pub const BANK_NAME_LEN: usize = 20;

/// Chunk tag plus size field
pub const CHUNK_HEADER: usize = 8;

/// Payload of the `INFO` list, including its form type
pub const INFO_LIST_SIZE: usize = 4
    + (CHUNK_HEADER + 4)
    + (CHUNK_HEADER + ENGINE_NAME_LEN)
    + (CHUNK_HEADER + BANK_NAME_LEN);

/// Payload of the `pdta` list, including its form type
///
/// Each hydra list holds one real record plus its terminal record; the
/// modulator lists hold only the terminal.
pub const PDTA_LIST_SIZE: usize = 4
    + (CHUNK_HEADER + 2 * PHDR_RECORD)
    + (CHUNK_HEADER + 2 * BAG_RECORD)
    + (CHUNK_HEADER + MOD_RECORD)
    + (CHUNK_HEADER + 2 * GEN_RECORD)
    + (CHUNK_HEADER + 2 * INST_RECORD)
    + (CHUNK_HEADER + 2 * BAG_RECORD)
    + (CHUNK_HEADER + MOD_RECORD)
    + (CHUNK_HEADER + 2 * GEN_RECORD)
    + (CHUNK_HEADER + 2 * SHDR_RECORD);

/// `RIFF` header, `INFO` list and `pdta` list plus the `sdta`/`smpl` headers
pub const FIXED_OVERHEAD: usize = (CHUNK_HEADER + 4)
    + (CHUNK_HEADER + INFO_LIST_SIZE)
    + (CHUNK_HEADER + 4 + CHUNK_HEADER)
    + (CHUNK_HEADER + PDTA_LIST_SIZE);

/// Largest sample count whose bank still fits 32-bit chunk sizes
pub const MAX_SAMPLES: usize = (u32::MAX as usize - FIXED_OVERHEAD) / 2;

/// Bytes of 16-bit sample data for `samples` samples
pub fn data_len(samples: usize) -> usize {
    samples * 2
}

/// Zero byte appended to keep chunks word aligned
pub fn pad_len(samples: usize) -> usize {
    data_len(samples) % 2
}

/// Payload of the `sdta` list, including its form type
pub fn sdta_list_size(samples: usize) -> usize {
    4 + CHUNK_HEADER + data_len(samples) + pad_len(samples)
}

/// Exact size of the encoded bank for `samples` samples
pub fn encoded_len(samples: usize) -> usize {
    FIXED_OVERHEAD + data_len(samples) + pad_len(samples)
}
