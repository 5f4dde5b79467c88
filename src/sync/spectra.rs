//! Power spectrogram of the baseband signal.
//!
//! 512-point Hann-windowed FFTs every 128 baseband samples. Rows are
//! fftshifted so bin `m` sits at `(m − 256) · 0.7324` Hz relative to the
//! band centre; the time axis advances half a symbol per frame.

use rustfft::num_complex::Complex;

use super::fft::fft_forward;
use super::{BB_STEP, FRAME_COUNT, SPECTRA_FFT};

/// Time–frequency power grid plus its time-averaged spectrum.
pub struct Spectrogram {
    /// `power[frame][bin]`, bins fftshifted.
    pub power: Vec<Vec<f32>>,
    /// Mean power per bin across all frames.
    pub avg: Vec<f32>,
}

impl Spectrogram {
    /// Power at (frame, shifted bin), zero outside the grid.
    #[inline]
    pub fn at(&self, frame: i32, bin: i32) -> f32 {
        if frame < 0 || bin < 0 {
            return 0.0;
        }
        match self.power.get(frame as usize) {
            Some(row) => row.get(bin as usize).copied().unwrap_or(0.0),
            None => 0.0,
        }
    }

    pub fn frames(&self) -> usize {
        self.power.len()
    }
}

/// Compute the spectrogram of a baseband buffer.
pub fn spectrogram(bb: &[Complex<f32>]) -> Result<Spectrogram, String> {
    if bb.len() < SPECTRA_FFT {
        return Err(format!(
            "baseband too short: {} samples (need {})",
            bb.len(),
            SPECTRA_FFT
        ));
    }

    let hann: Vec<f32> = (0..SPECTRA_FFT)
        .map(|i| {
            let x = std::f32::consts::PI * i as f32 / SPECTRA_FFT as f32;
            let s = x.sin();
            s * s
        })
        .collect();

    let frames = FRAME_COUNT.min((bb.len() - SPECTRA_FFT) / BB_STEP + 1);
    let mut power = Vec::with_capacity(frames);
    let mut avg = vec![0.0f32; SPECTRA_FFT];
    let mut work = vec![Complex::new(0.0f32, 0.0); SPECTRA_FFT];

    for j in 0..frames {
        let start = j * BB_STEP;
        for (i, slot) in work.iter_mut().enumerate() {
            *slot = bb[start + i] * hann[i];
        }
        fft_forward(&mut work)?;

        let mut row = vec![0.0f32; SPECTRA_FFT];
        for (m, slot) in row.iter_mut().enumerate() {
            // Shift so negative offsets come first.
            let k = (m + SPECTRA_FFT / 2) % SPECTRA_FFT;
            *slot = work[k].norm_sqr();
        }
        for (a, &p) in avg.iter_mut().zip(row.iter()) {
            *a += p;
        }
        power.push(row);
    }

    let scale = 1.0 / frames as f32;
    for a in avg.iter_mut() {
        *a *= scale;
    }
    Ok(Spectrogram { power, avg })
}
