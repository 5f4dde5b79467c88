//! Candidate detection: power peaks scored by sync-vector correlation.
//!
//! Candidate frequencies come from local maxima of the averaged spectrum —
//! not from the correlation itself, whose ±2-bin sidelobes would otherwise
//! outrank a half-bin-misaligned true peak on clean signals. Each peak is
//! then scored over a (frequency ±2 bins, time lag, drift) grid by summing
//! the power difference between the sync-expected tone pair and the other
//! pair across all 162 symbol times.

use crate::constants::{SYMBOL_COUNT, SYMBOL_PERIOD, SYNC_VECTOR, TX_SECONDS};

use super::spectra::Spectrogram;
use super::{BIN_WIDTH, DRIFT_MAX, DRIFT_STEP, LAG_MAX, LAG_MIN, SPECTRA_FFT};

/// One detection, ready for fine synchronisation.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    /// Shifted spectrogram bin of the tone-cluster centre.
    pub bin: usize,
    /// Time lag in half-symbol steps.
    pub lag: i32,
    /// Total frequency excursion across the transmission, in Hz.
    pub drift: f64,
    /// Normalised sync correlation in 0..~1.
    pub sync_score: f32,
}

/// Per-symbol bin shift for a linear drift across the transmission.
fn drift_shift(drift: f64, symbol: usize) -> i32 {
    let t = (symbol as f64 + 0.5) * SYMBOL_PERIOD;
    let frac = (t - TX_SECONDS / 2.0) / TX_SECONDS;
    (drift * frac / BIN_WIDTH).round() as i32
}

/// Sync correlation at one (frequency, lag, drift) point.
///
/// Tones sit at centre ±1 and ±3 bins; symbols with the sync bit set use
/// the odd tones. The score is the sync-weighted pair difference normalised
/// by the total power the template touches.
pub fn sync_score(spec: &Spectrogram, bin: usize, lag: i32, drift: f64) -> f32 {
    let mut num = 0.0f64;
    let mut den = 0.0f64;
    for i in 0..SYMBOL_COUNT {
        let frame = lag + 2 * i as i32;
        let mm = bin as i32 + drift_shift(drift, i);
        let p0 = spec.at(frame, mm - 3) as f64;
        let p1 = spec.at(frame, mm - 1) as f64;
        let p2 = spec.at(frame, mm + 1) as f64;
        let p3 = spec.at(frame, mm + 3) as f64;
        let sign = if SYNC_VECTOR[i] == 1 { 1.0 } else { -1.0 };
        num += sign * ((p1 + p3) - (p0 + p2));
        den += p0 + p1 + p2 + p3;
    }
    if den > 0.0 {
        (num / den) as f32
    } else {
        0.0
    }
}

/// Search the band for candidates.
///
/// `freq_min`/`freq_max` bound the search relative to the band centre;
/// `peak_threshold` is the smoothed-spectrum factor over the noise floor a
/// peak must clear; `sync_threshold` gates the correlation score.
pub fn find_candidates(
    spec: &Spectrogram,
    freq_min: f64,
    freq_max: f64,
    peak_threshold: f32,
    sync_threshold: f32,
    max_candidates: usize,
) -> Vec<Candidate> {
    let center = (SPECTRA_FFT / 2) as i32;
    let mmin = (center + (freq_min / BIN_WIDTH).ceil() as i32).max(4) as usize;
    let mmax = (center + (freq_max / BIN_WIDTH).floor() as i32).min(SPECTRA_FFT as i32 - 5) as usize;
    if mmin >= mmax {
        return Vec::new();
    }

    // Lightly smoothed band spectrum and its 30th-percentile noise floor.
    let mut smooth = vec![0.0f32; SPECTRA_FFT];
    for m in 1..SPECTRA_FFT - 1 {
        smooth[m] = (spec.avg[m - 1] + spec.avg[m] + spec.avg[m + 1]) / 3.0;
    }
    let mut band: Vec<f32> = smooth[mmin..=mmax].to_vec();
    band.sort_by(|a, b| a.total_cmp(b));
    let floor = band[band.len() * 3 / 10];
    if floor <= 0.0 {
        return Vec::new();
    }

    let mut peaks: Vec<(f32, usize)> = (mmin..=mmax)
        .filter(|&m| {
            smooth[m] > smooth[m - 1] && smooth[m] >= smooth[m + 1] && smooth[m] / floor > peak_threshold
        })
        .map(|m| (smooth[m], m))
        .collect();
    peaks.sort_by(|a, b| b.0.total_cmp(&a.0));
    peaks.truncate(300);

    let drift_steps = (DRIFT_MAX / DRIFT_STEP).round() as i32;
    let mut found: Vec<Candidate> = Vec::new();
    for &(_, m) in &peaks {
        let mut best: Option<Candidate> = None;
        for mm in m.saturating_sub(2)..=(m + 2).min(SPECTRA_FFT - 4) {
            for lag in LAG_MIN..=LAG_MAX {
                for d in -drift_steps..=drift_steps {
                    let drift = d as f64 * DRIFT_STEP;
                    let score = sync_score(spec, mm, lag, drift);
                    if best.map_or(true, |b| score > b.sync_score) {
                        best = Some(Candidate { bin: mm, lag, drift, sync_score: score });
                    }
                }
            }
        }
        if let Some(c) = best {
            if c.sync_score >= sync_threshold {
                found.push(c);
            }
        }
    }

    found.sort_by(|a, b| {
        b.sync_score
            .total_cmp(&a.sync_score)
            .then_with(|| {
                let da = (a.bin as i32 - center).abs();
                let db = (b.bin as i32 - center).abs();
                da.cmp(&db)
            })
    });

    // Suppress duplicates of the same tone cluster.
    let mut out: Vec<Candidate> = Vec::new();
    for c in found {
        if out.iter().all(|k| (k.bin as i32 - c.bin as i32).abs() > 4) {
            out.push(c);
        }
    }
    out.truncate(max_candidates);
    out
}
