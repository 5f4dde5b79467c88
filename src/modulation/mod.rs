//! Encode-side entry points: message text to symbols, frequencies, or PCM.

pub mod fsk;

use crate::constants::SYMBOL_COUNT;
use crate::message::{Message, MessageError};
use crate::symbol::channel_symbols;

pub use fsk::{pcm_bytes, tone_frequencies, waveform};

/// Encode a station report into little-endian 16-bit PCM at 12 kHz.
/// The buffer is exactly 2·162·8192 bytes (≈110.6 s).
pub fn encode(
    callsign: &str,
    grid: &str,
    power_dbm: i32,
    offset_hz: i32,
    lsb: bool,
) -> Result<Vec<u8>, MessageError> {
    Ok(pcm_bytes(&encode_to_samples(callsign, grid, power_dbm, offset_hz, lsb)?))
}

/// Encode a station report into i16 samples at 12 kHz.
pub fn encode_to_samples(
    callsign: &str,
    grid: &str,
    power_dbm: i32,
    offset_hz: i32,
    lsb: bool,
) -> Result<Vec<i16>, MessageError> {
    let message = Message::new(callsign, grid, power_dbm)?;
    Ok(waveform(&channel_symbols(&message), offset_hz, lsb))
}

/// Encode a station report into its 162 channel symbols (USB tone order).
pub fn encode_to_symbols(
    callsign: &str,
    grid: &str,
    power_dbm: i32,
) -> Result<[u8; SYMBOL_COUNT], MessageError> {
    let message = Message::new(callsign, grid, power_dbm)?;
    Ok(channel_symbols(&message))
}

/// Encode a station report into 162 tone frequencies in centihertz.
pub fn encode_to_frequencies(
    callsign: &str,
    grid: &str,
    power_dbm: i32,
    offset_hz: i32,
    lsb: bool,
) -> Result<[i64; SYMBOL_COUNT], MessageError> {
    let message = Message::new(callsign, grid, power_dbm)?;
    Ok(tone_frequencies(&channel_symbols(&message), offset_hz, lsb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_produces_the_contract_length() {
        let pcm = encode("Q0QQQ", "FN20", 30, 0, false).unwrap();
        assert_eq!(pcm.len(), 2_654_208);
    }

    #[test]
    fn encode_rejects_invalid_messages() {
        assert!(encode("ABC", "FN20", 30, 0, false).is_err());
        assert!(encode("K1JT", "XX99", 30, 0, false).is_err());
        assert!(encode("K1JT", "FN20", 99, 0, false).is_err());
    }

    #[test]
    fn lsb_symbols_are_usb_complement() {
        let syms = encode_to_symbols("W1ABC", "FN20", 30).unwrap();
        let usb = tone_frequencies(&syms, 0, false);
        let lsb = tone_frequencies(&syms, 0, true);
        for i in 0..SYMBOL_COUNT {
            let flipped = 3 - syms[i];
            let expect =
                ((crate::constants::CENTER_FREQ + flipped as f64 * crate::constants::TONE_SPACING)
                    * 100.0)
                    .round() as i64;
            assert_eq!(lsb[i], expect);
            assert_ne!(usb[i], lsb[i]); // no symbol maps to itself under 3−s
        }
    }
}
