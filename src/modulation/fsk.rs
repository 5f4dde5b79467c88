//! 4-FSK waveform synthesis.
//!
//! Tone `s` of symbol `i` is rendered as `amp·sin(2π·f·n/12000)` with
//! `f = 1500 + offset + s·Δ`, 8192 samples per symbol. The oscillator
//! phase restarts at each symbol boundary; the discontinuity at the chosen
//! spacing is small enough that decoders are unaffected.

use crate::constants::{
    CENTER_FREQ, SAMPLES_PER_SYMBOL, SAMPLE_RATE, SYMBOL_COUNT, TONE_SPACING, TX_AMPLITUDE,
};

/// Tone index actually transmitted for a symbol. LSB operation mirrors the
/// spectrum, so the tone order reverses.
#[inline]
fn tx_tone(symbol: u8, lsb: bool) -> u8 {
    if lsb {
        3 - symbol
    } else {
        symbol
    }
}

/// Render channel symbols into 16-bit PCM samples at 12 kHz.
pub fn waveform(symbols: &[u8; SYMBOL_COUNT], offset_hz: i32, lsb: bool) -> Vec<i16> {
    let mut samples = Vec::with_capacity(SYMBOL_COUNT * SAMPLES_PER_SYMBOL);
    for &symbol in symbols.iter() {
        let tone = tx_tone(symbol, lsb);
        let freq = CENTER_FREQ + offset_hz as f64 + tone as f64 * TONE_SPACING;
        let w = 2.0 * std::f64::consts::PI * freq / SAMPLE_RATE;
        for n in 0..SAMPLES_PER_SYMBOL {
            samples.push((TX_AMPLITUDE * libm::sin(w * n as f64)).round() as i16);
        }
    }
    samples
}

/// Little-endian byte form of a sample buffer.
pub fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    bytes
}

/// Tone frequencies in centihertz, for hardware transmitters that key an
/// oscillator instead of playing audio. The caller-supplied offset enters
/// as exactly `offset_hz · 100`.
pub fn tone_frequencies(
    symbols: &[u8; SYMBOL_COUNT],
    offset_hz: i32,
    lsb: bool,
) -> [i64; SYMBOL_COUNT] {
    let mut freqs = [0i64; SYMBOL_COUNT];
    for (f, &symbol) in freqs.iter_mut().zip(symbols.iter()) {
        let tone = tx_tone(symbol, lsb);
        let base = (CENTER_FREQ + tone as f64 * TONE_SPACING) * 100.0;
        *f = base.round() as i64 + offset_hz as i64 * 100;
    }
    freqs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::symbol::channel_symbols;

    fn symbols() -> [u8; SYMBOL_COUNT] {
        channel_symbols(&Message::new("K1JT", "FN20", 37).unwrap())
    }

    #[test]
    fn sample_count_and_peak() {
        let samples = waveform(&symbols(), 0, false);
        assert_eq!(samples.len(), SYMBOL_COUNT * SAMPLES_PER_SYMBOL);
        let peak = samples.iter().map(|&s| (s as i32).abs()).max().unwrap();
        assert!(peak <= 4095, "peak {}", peak);
        assert!(peak > 4000, "peak {}", peak);
    }

    #[test]
    fn first_nonzero_sample_is_bounded() {
        let samples = waveform(&symbols(), 0, false);
        let first = samples.iter().find(|&&s| s != 0).copied().unwrap();
        assert!(first.unsigned_abs() <= 4095);
    }

    #[test]
    fn dc_offset_below_one_lsb() {
        let samples = waveform(&symbols(), 0, false);
        let sum: i64 = samples.iter().map(|&s| s as i64).sum();
        let mean = sum as f64 / samples.len() as f64;
        assert!(mean.abs() < 1.0, "dc {}", mean);
    }

    #[test]
    fn pcm_bytes_are_little_endian() {
        let bytes = pcm_bytes(&[0x0102, -2]);
        assert_eq!(bytes, [0x02, 0x01, 0xfe, 0xff]);
    }

    #[test]
    fn tone_frequencies_reference() {
        let mut syms = [0u8; SYMBOL_COUNT];
        syms[1] = 1;
        syms[2] = 2;
        syms[3] = 3;
        let f = tone_frequencies(&syms, 0, false);
        assert_eq!(f[0], 150_000);
        assert_eq!(f[1], 150_146);
        assert_eq!(f[2], 150_293);
        assert_eq!(f[3], 150_439);
    }

    #[test]
    fn offset_shifts_every_tone_exactly() {
        let syms = symbols();
        let base = tone_frequencies(&syms, 0, false);
        let shifted = tone_frequencies(&syms, 1000, false);
        for i in 0..SYMBOL_COUNT {
            assert_eq!(shifted[i] - base[i], 100_000);
        }
    }

    #[test]
    fn lsb_mirrors_the_tones() {
        let syms = symbols();
        let usb = tone_frequencies(&syms, 0, false);
        let lsb = tone_frequencies(&syms, 0, true);
        for i in 0..SYMBOL_COUNT {
            let mirrored = (3 - syms[i]) as f64 * TONE_SPACING + CENTER_FREQ;
            assert_eq!(lsb[i], (mirrored * 100.0).round() as i64);
            // USB and LSB tones are reflections around the band centre, so
            // each pair sums to tone 0 + tone 3.
            assert_eq!(usb[i] + lsb[i], 300_439);
        }
    }
}
