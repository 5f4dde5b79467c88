//! Channel coding: convolutional encoder, interleaver, Fano decoder.

pub mod convolutional;
pub mod fano;
pub mod interleave;

pub use convolutional::{encode, encode_payload};
pub use fano::{decode, metric_table, FanoConfig, FanoOutcome};
pub use interleave::{deinterleave, interleave};
