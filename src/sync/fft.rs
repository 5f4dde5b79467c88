//! FFT helpers backed by RustFFT with cached plans.
//!
//! The decoder runs the same two transform sizes on every call (the 2^21
//! band-select and the 512-point spectrogram), so plans are built once and
//! shared behind a mutex.

use once_cell::sync::Lazy;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

static FORWARD_PLANS: Lazy<Mutex<HashMap<usize, Arc<dyn Fft<f32>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

static INVERSE_PLANS: Lazy<Mutex<HashMap<usize, Arc<dyn Fft<f32>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn forward_plan(n: usize) -> Arc<dyn Fft<f32>> {
    let mut cache = FORWARD_PLANS.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(plan) = cache.get(&n) {
        return Arc::clone(plan);
    }
    let plan = FftPlanner::new().plan_fft_forward(n);
    cache.insert(n, Arc::clone(&plan));
    plan
}

fn inverse_plan(n: usize) -> Arc<dyn Fft<f32>> {
    let mut cache = INVERSE_PLANS.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(plan) = cache.get(&n) {
        return Arc::clone(plan);
    }
    let plan = FftPlanner::new().plan_fft_inverse(n);
    cache.insert(n, Arc::clone(&plan));
    plan
}

/// In-place forward FFT.
pub fn fft_forward(buffer: &mut [Complex<f32>]) -> Result<(), String> {
    if buffer.is_empty() {
        return Err("empty FFT buffer".to_string());
    }
    forward_plan(buffer.len()).process(buffer);
    Ok(())
}

/// In-place inverse FFT, scaled by 1/n.
pub fn fft_inverse(buffer: &mut [Complex<f32>]) -> Result<(), String> {
    if buffer.is_empty() {
        return Err("empty FFT buffer".to_string());
    }
    let n = buffer.len();
    inverse_plan(n).process(buffer);
    let scale = 1.0 / n as f32;
    for v in buffer.iter_mut() {
        *v *= scale;
    }
    Ok(())
}
