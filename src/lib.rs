//! Decoding core for a polychrome 2-D matrix barcode symbology.
//!
//! Given an already-sampled [`matrix::Matrix`] of module colors, this crate
//! classifies modules into color indices, recovers the master/slave
//! metadata block, rebuilds the data map, and runs the payload pipeline
//! (demask, deinterleave, LDPC, text demultiplex) to produce a
//! [`symbol::DecodedSymbol`].

pub mod bit_reader;
pub mod classifier;
pub mod data_map;
pub mod error;
pub mod geometry;
pub mod interleave;
pub mod ldpc;
pub mod mask;
pub mod matrix;
pub mod metadata;
pub mod palette;
pub mod payload;
pub mod symbol;
pub mod text;
mod util;

pub use error::{Error, Result};
pub use symbol::{decode_master, decode_slave, DecodedSymbol, HostPosition};
