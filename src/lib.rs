pub mod constants;
pub mod decoder;
pub mod fec;
pub mod message;
pub mod modulation;
pub mod symbol;
pub mod sync;
pub mod tracing_init;

pub use decoder::{decode, DecodeError, DecodedMessage, DecoderConfig};
pub use message::{
    callsign_hash, grid_distance_km, latlon_to_grid, CallsignHashCache, GridError, HashCache,
    Message, MessageError,
};
pub use modulation::{encode, encode_to_frequencies, encode_to_samples, encode_to_symbols};
