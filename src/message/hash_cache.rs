//! Callsign hash cache for resolving hashed callsigns.
//!
//! Type 3 messages carry a 15-bit hash instead of the callsign text. The
//! decoder records every callsign recovered from a Type 1 decode and
//! consults the cache when a later message references a hash. The cache is
//! the only long-lived decoder state; everything else is per-call.
//!
//! The cache is always passed in explicitly so callers can supply an
//! in-memory map (the default), a persistent store, or a test stub.

use std::collections::HashMap;

use crate::message::callsign::callsign_hash;

/// Placeholder text for a hash with no known callsign.
pub const UNRESOLVED_CALLSIGN: &str = "<...>";

/// Resolution interface the decoder works against.
pub trait HashCache {
    /// Look up the callsign last seen under `hash`.
    fn lookup(&self, hash: u16) -> Option<&str>;

    /// Record `callsign` under `hash`, replacing any earlier entry.
    fn insert(&mut self, hash: u16, callsign: &str);
}

/// In-memory hash cache. Entries never expire within a run; a later decode
/// of a colliding callsign replaces the earlier entry.
#[derive(Debug, Clone, Default)]
pub struct CallsignHashCache {
    entries: HashMap<u16, String>,
}

impl CallsignHashCache {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Convenience: hash `callsign` and record it.
    pub fn insert_callsign(&mut self, callsign: &str) {
        self.insert(callsign_hash(callsign), callsign);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HashCache for CallsignHashCache {
    fn lookup(&self, hash: u16) -> Option<&str> {
        self.entries.get(&hash).map(|s| s.as_str())
    }

    fn insert(&mut self, hash: u16, callsign: &str) {
        self.entries.insert(hash, callsign.to_string());
    }
}
