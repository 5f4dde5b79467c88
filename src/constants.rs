//! WSPR protocol constants.
//!
//! The fixed tables here are the protocol: the 162-bit sync vector, the
//! 162-entry interleave permutation and the power correction table are
//! shared by every conforming station. Changing any of them breaks
//! interoperability.

/// Audio sample rate consumed and produced by the core, in Hz.
pub const SAMPLE_RATE: f64 = 12_000.0;

/// Number of channel symbols in one transmission.
pub const SYMBOL_COUNT: usize = 162;

/// PCM samples per channel symbol at 12 kHz.
pub const SAMPLES_PER_SYMBOL: usize = 8192;

/// Symbol duration in seconds (8192 / 12000 ≈ 683 ms).
pub const SYMBOL_PERIOD: f64 = SAMPLES_PER_SYMBOL as f64 / SAMPLE_RATE;

/// Duration of the full 162-symbol transmission in seconds (≈110.6 s).
pub const TX_SECONDS: f64 = SYMBOL_COUNT as f64 * SYMBOL_PERIOD;

/// Audio-band centre frequency of the transmission, in Hz.
pub const CENTER_FREQ: f64 = 1500.0;

/// 4-FSK tone spacing in Hz (12000 / 8192).
pub const TONE_SPACING: f64 = SAMPLE_RATE / SAMPLES_PER_SYMBOL as f64;

/// Number of FSK tones.
pub const TONE_COUNT: usize = 4;

/// Half of the search band around the centre frequency, in Hz.
pub const BAND_HALF_WIDTH: f64 = 150.0;

/// Peak amplitude of synthesised PCM: a quarter of 16-bit full scale,
/// leaving headroom for downstream mixing.
pub const TX_AMPLITUDE: f64 = 4095.0;

/// Information bits in the payload (28 callsign + 22 grid/power).
pub const PAYLOAD_BITS: usize = 50;

/// Zero bits appended to flush the convolutional encoder (constraint
/// length 32 ⇒ 31 tail bits).
pub const TAIL_BITS: usize = 31;

/// The 162-bit synchronisation vector. One bit per symbol position, carried
/// in the low bit of each transmitted symbol.
pub const SYNC_VECTOR: [u8; SYMBOL_COUNT] = [
    1, 1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1, 0, 1, 1, 1, 1,
    0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 1, 0, 0, 0, 0, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1,
    0, 1, 0, 0, 0, 1, 1, 0, 1, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 0, 1, 0,
    0, 1, 0, 1, 1, 0, 0, 0, 1, 1, 0, 1, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 1,
    0, 0, 1, 1, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 1, 0,
    1, 0, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 1, 0, 0, 0, 1, 1, 0, 0, 0,
];

/// Interleave permutation. The k-th bit of the convolutional output stream
/// lands at symbol position `INTERLEAVE_ORDER[k]`. The table is the
/// bit-reversed byte sequence 0..255 filtered to values below 162.
pub const INTERLEAVE_ORDER: [u8; SYMBOL_COUNT] = [
    0, 128, 64, 32, 160, 96, 16, 144, 80, 48, 112, 8, 136, 72, 40, 104, 24, 152,
    88, 56, 120, 4, 132, 68, 36, 100, 20, 148, 84, 52, 116, 12, 140, 76, 44, 108,
    28, 156, 92, 60, 124, 2, 130, 66, 34, 98, 18, 146, 82, 50, 114, 10, 138, 74,
    42, 106, 26, 154, 90, 58, 122, 6, 134, 70, 38, 102, 22, 150, 86, 54, 118, 14,
    142, 78, 46, 110, 30, 158, 94, 62, 126, 1, 129, 65, 33, 161, 97, 17, 145, 81,
    49, 113, 9, 137, 73, 41, 105, 25, 153, 89, 57, 121, 5, 133, 69, 37, 101, 21,
    149, 85, 53, 117, 13, 141, 77, 45, 109, 29, 157, 93, 61, 125, 3, 131, 67, 35,
    99, 19, 147, 83, 51, 115, 11, 139, 75, 43, 107, 27, 155, 91, 59, 123, 7, 135,
    71, 39, 103, 23, 151, 87, 55, 119, 15, 143, 79, 47, 111, 31, 159, 95, 63, 127,
];

/// Power correction table indexed by `power_dbm % 10`. Adding the entry
/// snaps an arbitrary 0–60 dBm value to the nearest legal WSPR power
/// (final digit 0, 3 or 7).
pub const POWER_CORRECTION: [i32; 10] = [0, -1, 1, 0, -1, 2, 1, 0, -1, 1];
