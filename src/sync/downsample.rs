//! Band-select downsampler: 12 kHz real audio to 375 Hz complex baseband.
//!
//! The window is zero-padded into a 2^21-point transform; the 65536 bins
//! centred on 1500 Hz (±187.5 Hz) are gathered and inverse-transformed,
//! yielding the analytic signal at 1/32 of the input rate with the band
//! centre at 0 Hz. Baseband sample `n` sits at time `n / 375` seconds from
//! the start of the window, so symbol boundaries stay sample-aligned.

use rustfft::num_complex::Complex;

use super::fft::{fft_forward, fft_inverse};
use super::{BB_LEN, CENTER_BIN, DOWNSAMPLE_FFT, WINDOW_SAMPLES};

/// Mix the capture down to complex baseband.
///
/// `samples` holds normalised audio; at most the first 114 s are used and
/// shorter input is treated as zero-padded.
pub fn baseband(samples: &[f32]) -> Result<Vec<Complex<f32>>, String> {
    if samples.is_empty() {
        return Err("empty capture".to_string());
    }

    let used = samples.len().min(WINDOW_SAMPLES);
    let mut spectrum = vec![Complex::new(0.0f32, 0.0); DOWNSAMPLE_FFT];
    for (slot, &s) in spectrum.iter_mut().zip(samples[..used].iter()) {
        slot.re = s;
    }
    fft_forward(&mut spectrum)?;

    // Gather the ±187.5 Hz band around 1500 Hz into a 65536-point inverse
    // transform. Positive baseband offsets come from bins above the centre,
    // negative offsets from below.
    let half = BB_LEN / 2;
    let mut band = vec![Complex::new(0.0f32, 0.0); BB_LEN];
    for (j, slot) in band.iter_mut().enumerate() {
        let offset = if j < half { j as i64 } else { j as i64 - BB_LEN as i64 };
        let bin = CENTER_BIN as i64 + offset;
        *slot = spectrum[bin as usize];
    }
    fft_inverse(&mut band)?;
    Ok(band)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::BASEBAND_RATE;

    #[test]
    fn rejects_empty_input() {
        assert!(baseband(&[]).is_err());
    }

    #[test]
    fn tone_above_center_lands_at_positive_offset() {
        // 1510 Hz should appear at +10 Hz in baseband.
        let samples: Vec<f32> = (0..WINDOW_SAMPLES)
            .map(|n| (2.0 * std::f64::consts::PI * 1510.0 * n as f64 / 12_000.0).sin() as f32)
            .collect();
        let bb = baseband(&samples).unwrap();
        assert_eq!(bb.len(), BB_LEN);

        // Measure frequency over one second with a 375-point DFT.
        let n = 375usize;
        let mut best = (0usize, 0.0f64);
        for k in 0..n {
            let f = if k < n / 2 { k as f64 } else { k as f64 - n as f64 };
            let mut acc = Complex::new(0.0f64, 0.0);
            for (i, s) in bb[1000..1000 + n].iter().enumerate() {
                let ph = -2.0 * std::f64::consts::PI * f * i as f64 / BASEBAND_RATE;
                acc += Complex::new(s.re as f64, s.im as f64)
                    * Complex::new(ph.cos(), ph.sin());
            }
            let p = acc.norm_sqr();
            if p > best.1 {
                best = (k, p);
            }
        }
        let freq = if best.0 < n / 2 { best.0 as f64 } else { best.0 as f64 - n as f64 };
        assert!((freq - 10.0).abs() <= 1.0, "found {} Hz", freq);
    }

    #[test]
    fn silence_stays_silent() {
        let bb = baseband(&vec![0.0f32; 120_000]).unwrap();
        let power: f32 = bb.iter().map(|c| c.norm_sqr()).sum();
        assert!(power < 1e-12);
    }
}
