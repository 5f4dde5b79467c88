//! Channel-symbol assembly.
//!
//! `symbol[i] = 2·parity[i] + sync[i]`: the interleaved convolutional
//! stream rides in the high bit of each symbol, the fixed sync vector in
//! the low bit. Every symbol is one of the four FSK tones.

use crate::constants::{SYMBOL_COUNT, SYNC_VECTOR};
use crate::fec;
use crate::message::Message;

/// Channel symbols for a message.
pub fn channel_symbols(message: &Message) -> [u8; SYMBOL_COUNT] {
    symbols_from_packed(&message.pack())
}

/// Channel symbols from the 88-bit packed buffer.
pub fn symbols_from_packed(packed: &[u8; 11]) -> [u8; SYMBOL_COUNT] {
    let stream = fec::encode(packed);
    let data = fec::interleave(&stream);
    let mut symbols = [0u8; SYMBOL_COUNT];
    for i in 0..SYMBOL_COUNT {
        symbols[i] = 2 * data[i] + SYNC_VECTOR[i];
    }
    symbols
}

/// Channel symbols straight from a 50-bit payload. The decoder re-encodes
/// recovered payloads through this to vet a candidate decode.
pub fn symbols_from_payload(payload: u64) -> [u8; SYMBOL_COUNT] {
    symbols_from_packed(&crate::message::payload_to_bytes(payload))
}
