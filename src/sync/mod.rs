//! Decoder-side signal processing.
//!
//! The 12 kHz capture is mixed down to a 375 Hz complex baseband centred on
//! 1500 Hz, where one WSPR symbol is exactly 256 samples and the tone
//! spacing is exactly one 256-point DFT bin. All search and demodulation
//! runs at this rate.
//!
//! **Pipeline**:
//! 1. `downsample` — FFT band selection, 12 kHz real → 375 Hz complex
//! 2. `spectra` — 512-point Hann spectrogram at half-symbol hops
//! 3. `candidate` — power peaks scored by sync-vector correlation
//! 4. `extract` — fine time/frequency/drift sync and soft symbols
//!
//! **Grid geometry**: 0.7324 Hz bins (half the tone spacing), 341 ms hops
//! (half a symbol), identical to a 16384-point transform of the original
//! audio.

pub mod candidate;
pub mod downsample;
pub mod extract;
pub mod fft;
pub mod spectra;

pub use candidate::{find_candidates, Candidate};
pub use downsample::baseband;
pub use extract::{demodulate, refine, soft_symbols, FineSync};
pub use spectra::{spectrogram, Spectrogram};

/// Baseband sample rate in Hz.
pub const BASEBAND_RATE: f64 = 375.0;

/// Baseband samples per symbol (8192 / 32).
pub const BB_SYMBOL_SAMPLES: usize = 256;

/// Spectrogram hop: half a symbol.
pub const BB_STEP: usize = 128;

/// Spectrogram FFT length: two symbols.
pub const SPECTRA_FFT: usize = 512;

/// Spectrogram bin width in Hz (half the tone spacing).
pub const BIN_WIDTH: f64 = BASEBAND_RATE / SPECTRA_FFT as f64;

/// Forward FFT length for the band-select downsampler.
pub const DOWNSAMPLE_FFT: usize = 1 << 21;

/// FFT bin of the 1500 Hz band centre (1500 / (12000 / 2^21)).
pub const CENTER_BIN: usize = 262_144;

/// Baseband buffer length: `DOWNSAMPLE_FFT / 32` samples at 375 Hz.
pub const BB_LEN: usize = 65_536;

/// Decode window: 114 s of audio.
pub const WINDOW_SAMPLES: usize = 1_368_000;

/// One complete transmission: 162 · 8192 samples, the minimum input the
/// decoder accepts.
pub const TX_SAMPLES: usize = 1_327_104;

/// Number of spectrogram frames covering the window.
pub const FRAME_COUNT: usize = (WINDOW_SAMPLES / 32 - SPECTRA_FFT) / BB_STEP;

/// Candidate time-lag search range in half-symbol steps (−1.0 .. +2.0 s).
pub const LAG_MIN: i32 = -3;
pub const LAG_MAX: i32 = 6;

/// Total frequency excursion searched over the transmission, in Hz.
pub const DRIFT_MAX: f64 = 4.0;

/// Drift search step in Hz.
pub const DRIFT_STEP: f64 = 0.5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseband_geometry_is_exact() {
        // Symbol and tone geometry must stay integer at baseband.
        assert_eq!(crate::constants::SAMPLES_PER_SYMBOL / 32, BB_SYMBOL_SAMPLES);
        let bin = BASEBAND_RATE / BB_SYMBOL_SAMPLES as f64;
        assert!((bin - crate::constants::TONE_SPACING).abs() < 1e-12);
        assert!((BIN_WIDTH * 2.0 - crate::constants::TONE_SPACING).abs() < 1e-12);
    }

    #[test]
    fn center_bin_is_exact() {
        let df = 12_000.0 / DOWNSAMPLE_FFT as f64;
        assert!((CENTER_BIN as f64 * df - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn frame_count_covers_the_window() {
        assert_eq!(FRAME_COUNT, 329);
        let last_sample = (FRAME_COUNT - 1) * BB_STEP + SPECTRA_FFT;
        assert!(last_sample <= WINDOW_SAMPLES / 32 + 2);
        assert!(last_sample <= BB_LEN);
    }
}
