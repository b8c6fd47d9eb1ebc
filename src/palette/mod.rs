//! Color palette model and reconstruction.

pub mod model;
pub mod reconstruct;

pub use model::{variability_vector, PaletteThresholds};
pub use reconstruct::{deinterleave_palette, interpolate_palette};

use crate::error::{Error, Result};

/// A decoded color palette: `color_count` entries, each 3 consecutive
/// bytes (R, G, B), stored flat as `decoder.c` does.
#[derive(Clone, Debug)]
pub struct Palette {
    color_count: u32,
    entries: Vec<u8>,
}

impl Palette {
    pub fn from_entries(color_count: u32, entries: Vec<u8>) -> Result<Self> {
        if entries.len() != color_count as usize * 3 {
            return Err(Error::InvalidColorCount(color_count as u8));
        }
        Ok(Palette {
            color_count,
            entries,
        })
    }

    pub fn color_count(&self) -> u32 {
        self.color_count
    }

    pub fn rgb(&self, index: usize) -> (u8, u8, u8) {
        let base = index * 3;
        (
            self.entries[base],
            self.entries[base + 1],
            self.entries[base + 2],
        )
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.entries
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.entries
    }
}
