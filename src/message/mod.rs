//! WSPR message packing and unpacking.
//!
//! A Type 1 message is (callsign, 4-character grid, power). It packs into a
//! 50-bit payload: 28 callsign bits followed by 22 grid+power bits. The
//! decoder additionally understands Type 2 (compound callsign, no grid) and
//! Type 3 (hashed callsign + 6-character grid) payloads.

pub mod callsign;
pub mod grid;
pub mod hash_cache;
pub mod power;

use bitvec::prelude::*;
use snafu::Snafu;
use std::fmt;

use crate::constants::{PAYLOAD_BITS, TAIL_BITS};
pub use callsign::callsign_hash;
pub use grid::{grid_distance_km, latlon_to_grid, GridError};
pub use hash_cache::{CallsignHashCache, HashCache, UNRESOLVED_CALLSIGN};
pub use power::snap_power;

/// Rejections from the Type 1 message grammar (§ error taxonomy:
/// *invalid input*).
#[derive(Debug, Snafu, PartialEq)]
pub enum MessageError {
    /// Callsign is empty or longer than six characters
    #[snafu(display("callsign length {len} outside 1..=6"))]
    InvalidCallsignLength { len: usize },

    /// No digit in the second or third callsign position
    #[snafu(display("callsign must carry a digit in position 1 or 2"))]
    MissingCallsignDigit,

    /// Character outside the packing alphabets
    #[snafu(display("invalid callsign character '{ch}'"))]
    InvalidCallsignChar { ch: char },

    /// 28-bit field does not decode to a callsign
    #[snafu(display("packed callsign value {value} out of range"))]
    CallsignOutOfRange { value: u32 },

    /// Grid is not two A–R letters followed by two digits
    #[snafu(display("invalid grid locator '{grid}'"))]
    InvalidGrid { grid: String },

    /// 15-bit field does not decode to a grid
    #[snafu(display("packed grid value {value} out of range"))]
    GridOutOfRange { value: u32 },

    /// Power outside 0..=60 dBm
    #[snafu(display("power {power} dBm outside 0..=60"))]
    PowerOutOfRange { power: i32 },

    /// Payload does not classify as a known message type
    #[snafu(display("payload does not decode to a valid message"))]
    InvalidPayload,
}

/// A validated Type 1 station report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    callsign: String,
    grid: String,
    power_dbm: i32,
}

impl Message {
    /// Validate and build a message. Power is snapped to the nearest legal
    /// WSPR level; callsign and grid are upper-cased.
    pub fn new(callsign: &str, grid: &str, power_dbm: i32) -> Result<Self, MessageError> {
        // Packing doubles as grammar validation.
        callsign::pack_callsign(callsign)?;
        grid::pack_grid(grid)?;
        if !(0..=60).contains(&power_dbm) {
            return Err(MessageError::PowerOutOfRange { power: power_dbm });
        }
        Ok(Self {
            callsign: callsign.trim().to_uppercase(),
            grid: grid.trim().to_uppercase(),
            power_dbm: power::snap_power(power_dbm),
        })
    }

    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    pub fn grid(&self) -> &str {
        &self.grid
    }

    /// Power after snapping, in dBm.
    pub fn power_dbm(&self) -> i32 {
        self.power_dbm
    }

    /// The 50-bit payload: callsign(28) ‖ grid+power(22).
    pub fn payload(&self) -> u64 {
        let n1 = callsign::pack_callsign(&self.callsign).expect("validated at construction");
        let m = grid::pack_grid(&self.grid).expect("validated at construction");
        let n2 = 128 * m as u64 + (self.power_dbm + 64) as u64;
        ((n1 as u64) << 22) | n2
    }

    /// The 88-bit encoder input buffer: 50 payload bits left-aligned,
    /// followed by the 31-bit flush tail and 7 unused zero bits.
    pub fn pack(&self) -> [u8; 11] {
        payload_to_bytes(self.payload())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.callsign, self.grid, self.power_dbm)
    }
}

/// Left-align a 50-bit payload into the 11-byte encoder buffer.
pub fn payload_to_bytes(payload: u64) -> [u8; 11] {
    let mut bytes = [0u8; 11];
    let bits = bytes.view_bits_mut::<Msb0>();
    for i in 0..PAYLOAD_BITS {
        bits.set(i, (payload >> (PAYLOAD_BITS - 1 - i)) & 1 == 1);
    }
    // Remaining 38 bits stay zero: 31 flush the encoder, 7 pad the buffer.
    debug_assert_eq!(PAYLOAD_BITS + TAIL_BITS + 7, 88);
    bytes
}

/// A message recovered from a 50-bit payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedMessage {
    /// Printable form: `"CALL GRID POWER"`, `"PFX/CALL POWER"`, or
    /// `"<CALL> GRID6 POWER"`.
    pub message: String,
    /// Station callsign; [`UNRESOLVED_CALLSIGN`] when a hash reference
    /// cannot be resolved.
    pub callsign: String,
    /// Grid locator; empty for Type 2 messages.
    pub grid: String,
    /// Power in dBm.
    pub power_dbm: i32,
}

/// Decode a 50-bit payload into message text, classifying Type 1/2/3 by the
/// trailing 22-bit field. Successful Type 1 decodes record the callsign in
/// `cache`; Type 3 decodes consult it.
pub fn unpack_payload(
    payload: u64,
    cache: &mut dyn HashCache,
) -> Result<UnpackedMessage, MessageError> {
    let n1 = (payload >> 22) as u32;
    let n2 = (payload & 0x3f_ffff) as u32;
    let ntype = (n2 & 127) as i32 - 64;
    let ng = n2 >> 7;

    if (0..=62).contains(&ntype) {
        match ntype % 10 {
            0 | 3 | 7 => unpack_type1(n1, ng, ntype, cache),
            nu => unpack_type2(n1, ng, ntype, nu),
        }
    } else {
        unpack_type3(n1, ng, ntype, cache)
    }
}

fn unpack_type1(
    n1: u32,
    ng: u32,
    ntype: i32,
    cache: &mut dyn HashCache,
) -> Result<UnpackedMessage, MessageError> {
    let call = callsign::unpack_callsign(n1)?;
    if call.is_empty() {
        return Err(MessageError::InvalidPayload);
    }
    let grid = grid::unpack_grid(ng)?;
    cache.insert(callsign_hash(&call), &call);
    Ok(UnpackedMessage {
        message: format!("{} {} {}", call, grid, ntype),
        callsign: call,
        grid,
        power_dbm: ntype,
    })
}

fn unpack_type2(n1: u32, ng: u32, ntype: i32, nu: i32) -> Result<UnpackedMessage, MessageError> {
    let mut nadd = nu;
    if nu > 3 {
        nadd = nu - 3;
    }
    if nu > 7 {
        nadd = nu - 7;
    }
    let n3 = ng + 32_768 * (nadd as u32 - 1);
    let base = callsign::unpack_callsign(n1)?;
    if base.is_empty() {
        return Err(MessageError::InvalidPayload);
    }
    let power = ntype - nadd;
    if !power::is_legal_power(power) {
        return Err(MessageError::InvalidPayload);
    }

    let compound = if n3 < 60_000 {
        // Up to three prefix characters, base 37.
        let mut v = n3;
        let mut pfx = [' '; 3];
        for slot in pfx.iter_mut().rev() {
            *slot = match v % 37 {
                d @ 0..=9 => (b'0' + d as u8) as char,
                l @ 10..=35 => (b'A' + (l - 10) as u8) as char,
                _ => ' ',
            };
            v /= 37;
        }
        let pfx: String = pfx.iter().collect::<String>().trim().to_string();
        if pfx.is_empty() {
            return Err(MessageError::InvalidPayload);
        }
        format!("{}/{}", pfx, base)
    } else {
        let nc = n3 - 60_000;
        let sfx = match nc {
            0..=9 => nc.to_string(),
            10..=35 => ((b'A' + (nc - 10) as u8) as char).to_string(),
            36..=124 => format!("{}", nc - 26),
            _ => return Err(MessageError::InvalidPayload),
        };
        format!("{}/{}", base, sfx)
    };

    Ok(UnpackedMessage {
        message: format!("{} {}", compound, power),
        callsign: compound,
        grid: String::new(),
        power_dbm: power,
    })
}

fn unpack_type3(
    n1: u32,
    ng: u32,
    ntype: i32,
    cache: &mut dyn HashCache,
) -> Result<UnpackedMessage, MessageError> {
    let power = -(ntype + 1);
    if !power::is_legal_power(power) {
        return Err(MessageError::InvalidPayload);
    }

    // The 6-character grid travels through the callsign field, rotated one
    // position so it satisfies the digit-slot constraint.
    let slots = callsign::unpack_callsign_slots(n1)?;
    let grid6: String = [slots[5], slots[0], slots[1], slots[2], slots[3], slots[4]]
        .iter()
        .collect();
    let g: Vec<char> = grid6.chars().collect();
    let field_ok = ('A'..='R').contains(&g[0]) && ('A'..='R').contains(&g[1]);
    let square_ok = g[2].is_ascii_digit() && g[3].is_ascii_digit();
    let sub_ok = ('A'..='X').contains(&g[4]) && ('A'..='X').contains(&g[5]);
    if !(field_ok && square_ok && sub_ok) {
        return Err(MessageError::InvalidPayload);
    }

    let call = cache
        .lookup(ng as u16)
        .map(|c| c.to_string())
        .unwrap_or_else(|| UNRESOLVED_CALLSIGN.to_string());
    let display = if call == UNRESOLVED_CALLSIGN {
        call.clone()
    } else {
        format!("<{}>", call)
    };

    Ok(UnpackedMessage {
        message: format!("{} {} {}", display, grid6, power),
        callsign: call,
        grid: grid6,
        power_dbm: power,
    })
}
