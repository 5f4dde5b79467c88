//! Multi-signal WSPR decoder.
//!
//! Drives the full decode pipeline over a 114-second capture: band-select
//! downsampling, spectrogram, candidate search, per-candidate fine sync,
//! soft-symbol extraction and Fano decoding, then validation, SNR
//! estimation, ordering and de-duplication.

use rustfft::num_complex::Complex;
use snafu::Snafu;
use tracing::{debug, info};

use crate::constants::{SYMBOL_COUNT, TONE_SPACING, TX_SECONDS};
use crate::fec::{self, FanoConfig};
use crate::message::{self, HashCache};
use crate::symbol::symbols_from_payload;
use crate::sync::{self, Candidate, Spectrogram};

/// Decoded WSPR transmission with channel measurements.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    /// SNR referenced to a 2500 Hz noise bandwidth, in dB.
    pub snr_db: f32,
    /// Tone-0 frequency relative to the 1500 Hz band centre, in Hz.
    pub freq_offset_hz: f32,
    /// Signal start relative to the window start, in seconds.
    pub time_offset_s: f32,
    /// Linear frequency drift, in Hz/s.
    pub drift_hz_s: f32,
    /// Absolute frequency label derived from the dial setting, in MHz.
    pub freq_mhz: f64,
    /// Printable message text.
    pub message: String,
    /// Station callsign (`<...>` when a hash reference is unresolved).
    pub callsign: String,
    /// Grid locator; empty for compound-callsign messages.
    pub grid: String,
    /// Power in dBm.
    pub power_dbm: i32,
    /// Sync correlation of the accepted candidate.
    pub sync_score: f32,
}

/// Configuration for the decoder.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Lower search bound relative to the band centre (Hz).
    pub freq_min: f64,
    /// Upper search bound relative to the band centre (Hz).
    pub freq_max: f64,
    /// Smoothed-spectrum factor over the noise floor a peak must clear.
    pub peak_threshold: f32,
    /// Minimum normalised sync correlation for a candidate.
    pub sync_threshold: f32,
    /// Maximum candidates to carry into fine sync.
    pub max_candidates: usize,
    /// Maximum Hamming distance between the re-encoded decode and the hard
    /// symbol decisions.
    pub reencode_max_distance: usize,
    /// Sequential-decoder tuning.
    pub fano: FanoConfig,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            freq_min: -150.0,
            freq_max: 150.0,
            peak_threshold: 1.15,
            sync_threshold: 0.12,
            max_candidates: 200,
            reencode_max_distance: 40,
            fano: FanoConfig::default(),
        }
    }
}

/// Decode failures. An empty result list is not a failure — audio with no
/// recoverable signal decodes to nothing.
#[derive(Debug, Snafu)]
pub enum DecodeError {
    /// Capture shorter than one full transmission
    #[snafu(display("insufficient audio: {samples} samples, need at least {required}"))]
    InsufficientData { samples: usize, required: usize },

    /// A DSP stage failed; indicates a bug rather than bad input
    #[snafu(display("decoder internal failure: {detail}"))]
    Internal { detail: String },
}

/// Decode every WSPR transmission in a PCM capture.
///
/// `pcm` is raw little-endian 16-bit mono at 12 kHz, at least one full
/// transmission long; the first 114 s are used and shorter-than-window
/// input is zero-padded. `dial_mhz` only labels results. Successful Type 1
/// decodes are recorded in `cache`; Type 3 hash references are resolved
/// through it.
///
/// Results are sorted by sync score descending, then frequency ascending,
/// with duplicate (callsign, grid, power, snr) tuples removed.
pub fn decode(
    pcm: &[u8],
    dial_mhz: f64,
    lsb: bool,
    cache: &mut dyn HashCache,
    config: &DecoderConfig,
) -> Result<Vec<DecodedMessage>, DecodeError> {
    let samples = pcm.len() / 2;
    if pcm.len() % 2 != 0 || samples < sync::TX_SAMPLES {
        return Err(DecodeError::InsufficientData { samples, required: sync::TX_SAMPLES });
    }

    let audio: Vec<f32> = pcm
        .chunks_exact(2)
        .take(sync::WINDOW_SAMPLES)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect();

    let mut bb = sync::baseband(&audio).map_err(|detail| DecodeError::Internal { detail })?;
    if lsb {
        // Conjugating the baseband mirrors the spectrum about the band
        // centre, turning an LSB transmission into the USB layout the rest
        // of the pipeline expects.
        for s in bb.iter_mut() {
            *s = s.conj();
        }
    }

    let spec = sync::spectrogram(&bb).map_err(|detail| DecodeError::Internal { detail })?;
    let candidates = sync::find_candidates(
        &spec,
        config.freq_min,
        config.freq_max,
        config.peak_threshold,
        config.sync_threshold,
        config.max_candidates,
    );
    debug!(count = candidates.len(), "candidate search complete");

    let noise_floor = band_noise_floor(&spec, config);
    let metric_table = fec::metric_table(&config.fano);

    let mut results: Vec<DecodedMessage> = Vec::new();
    for cand in &candidates {
        match decode_candidate(&bb, &spec, cand, noise_floor, &metric_table, cache, config, lsb, dial_mhz)
        {
            Some(m) => {
                info!(text = %m.message, freq = m.freq_offset_hz, snr = m.snr_db, "decoded");
                results.push(m);
            }
            None => debug!(bin = cand.bin, score = cand.sync_score, "candidate abandoned"),
        }
    }

    results.sort_by(|a, b| {
        b.sync_score
            .total_cmp(&a.sync_score)
            .then_with(|| a.freq_offset_hz.total_cmp(&b.freq_offset_hz))
    });

    let mut unique: Vec<DecodedMessage> = Vec::new();
    for r in results {
        let snr_key = (r.snr_db * 10.0).round() as i32;
        let dup = unique.iter().any(|u| {
            u.callsign == r.callsign
                && u.grid == r.grid
                && u.power_dbm == r.power_dbm
                && (u.snr_db * 10.0).round() as i32 == snr_key
        });
        if !dup {
            unique.push(r);
        }
    }
    Ok(unique)
}

/// 30th-percentile power of the averaged band spectrum.
fn band_noise_floor(spec: &Spectrogram, config: &DecoderConfig) -> f32 {
    let center = (sync::SPECTRA_FFT / 2) as i32;
    let lo = (center + (config.freq_min / sync::BIN_WIDTH).ceil() as i32).max(0) as usize;
    let hi =
        (center + (config.freq_max / sync::BIN_WIDTH).floor() as i32).min(sync::SPECTRA_FFT as i32 - 1) as usize;
    let mut band: Vec<f32> = spec.avg[lo..=hi].to_vec();
    band.sort_by(|a, b| a.total_cmp(b));
    band[band.len() * 3 / 10]
}

/// SNR in the 2500 Hz reference bandwidth, from the averaged-spectrum peak
/// over the noise floor. The −27.55 dB term folds together the four-bin
/// tone duty cycle and the Hann bin noise bandwidth against 2500 Hz.
fn estimate_snr(spec: &Spectrogram, center_bin: i32, noise_floor: f32) -> f32 {
    let peak = [-3i32, -1, 1, 3]
        .iter()
        .map(|&o| {
            let b = center_bin + o;
            if (0..sync::SPECTRA_FFT as i32).contains(&b) {
                spec.avg[b as usize]
            } else {
                0.0
            }
        })
        .fold(0.0f32, f32::max);
    let ratio = if noise_floor > 0.0 {
        (peak / noise_floor - 1.0).max(1e-4)
    } else {
        1e4
    };
    (10.0 * (ratio as f64).log10() - 27.55).clamp(-35.0, 45.0) as f32
}

#[allow(clippy::too_many_arguments)]
fn decode_candidate(
    bb: &[Complex<f32>],
    spec: &Spectrogram,
    cand: &Candidate,
    noise_floor: f32,
    metric_table: &[[i32; 256]; 2],
    cache: &mut dyn HashCache,
    config: &DecoderConfig,
    lsb: bool,
    dial_mhz: f64,
) -> Option<DecodedMessage> {
    let fine = sync::refine(bb, cand);
    let (powers, _) = sync::demodulate(bb, fine.freq, fine.start, fine.drift);
    let soft = sync::soft_symbols(&powers);
    let stream = fec::deinterleave(&soft);

    let outcome = fec::decode(&stream, metric_table, &config.fano)?;
    debug!(cycles = outcome.cycles, "sequential decode finished");

    // The recovered payload must re-encode to something close to what was
    // demodulated, and must parse as a legal message.
    let re_encoded = symbols_from_payload(outcome.payload);
    let distance = (0..SYMBOL_COUNT)
        .filter(|&i| (soft[i] >= 128) != (re_encoded[i] >> 1 == 1))
        .count();
    if distance > config.reencode_max_distance {
        debug!(distance, "re-encode check failed");
        return None;
    }

    let unpacked = message::unpack_payload(outcome.payload, cache).ok()?;

    let center_bin =
        (sync::SPECTRA_FFT / 2) as i32 + (fine.freq / sync::BIN_WIDTH).round() as i32;
    let snr_db = estimate_snr(spec, center_bin, noise_floor);

    // Reported frequency is the tone-0 offset; LSB spectra were mirrored,
    // so the sign flips back and drift follows.
    let (freq_offset, drift) = if lsb {
        (-fine.freq - 1.5 * TONE_SPACING, -fine.drift)
    } else {
        (fine.freq - 1.5 * TONE_SPACING, fine.drift)
    };

    Some(DecodedMessage {
        snr_db,
        freq_offset_hz: freq_offset as f32,
        time_offset_s: fine.start as f32 / sync::BASEBAND_RATE as f32,
        drift_hz_s: (drift / TX_SECONDS) as f32,
        freq_mhz: dial_mhz + (1500.0 + freq_offset) / 1e6,
        message: unpacked.message,
        callsign: unpacked.callsign,
        grid: unpacked.grid,
        power_dbm: unpacked.power_dbm,
        sync_score: fine.score,
    })
}
