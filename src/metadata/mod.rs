//! Metadata block: side version, color count, mask, error-correction
//! parameters and, for slave symbols, where they dock onto their host.

pub mod master;
pub mod scanner;
pub mod slave;

use crate::data_map::DataMap;
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::palette::{deinterleave_palette, interpolate_palette, Palette};

/// Which edge of the host symbol a slave symbol is docked to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HostPosition {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl HostPosition {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(HostPosition::North),
            1 => Ok(HostPosition::East),
            2 => Ok(HostPosition::South),
            3 => Ok(HostPosition::West),
            _ => Err(Error::InvalidMaskType(value)),
        }
    }
}

/// Which of the 4 edges a slave symbol occupies, as a bitmap: bit `i` set
/// means edge `i` (in `HostPosition` order) is docked.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct DockedMask(u8);

impl DockedMask {
    pub fn new(bits: u8) -> Self {
        DockedMask(bits & 0x0F)
    }

    pub fn is_docked(self, position: HostPosition) -> bool {
        self.0 & (1 << position as u8) != 0
    }

    pub fn set(&mut self, position: HostPosition) {
        self.0 |= 1 << position as u8;
    }

    pub fn raw(self) -> u8 {
        self.0
    }
}

/// Error-correction level: LDPC column/row weight.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ecl {
    pub wc: u32,
    pub wr: u32,
}

impl Ecl {
    pub fn new(wc: u32, wr: u32) -> Result<Self> {
        if wc == 0 || wc >= wr {
            return Err(Error::InvalidEcl(wc, wr));
        }
        Ok(Ecl { wc, wr })
    }
}

/// Fully parsed metadata for one symbol.
#[derive(Clone, Debug)]
pub struct Metadata {
    /// Color-count selector: side size `2^(Nc+1)` colors, `Nc` in `0..=7`.
    pub nc: u8,
    pub side_version_x: u8,
    pub side_version_y: u8,
    pub mask_type: crate::mask::MaskType,
    pub ecl: Ecl,
    pub docked_position: DockedMask,
}

impl Metadata {
    pub fn color_count(&self) -> Result<u32> {
        if self.nc > 7 {
            return Err(Error::InvalidColorCount(self.nc));
        }
        Ok(1u32 << (self.nc + 1))
    }
}

/// Mirrors a palette-0 sampling position into its palette-1 counterpart,
/// matching the master-orientation policy in [`crate::geometry::palette_half`]:
/// wide symbols mirror left/right, tall or square symbols mirror top/bottom.
pub(crate) fn mirror_palette_position(x: i32, y: i32, width: usize, height: usize) -> (i32, i32) {
    if width > height {
        (width as i32 - 1 - x, y)
    } else {
        (x, height as i32 - 1 - y)
    }
}

/// Reads a `width`-bit big-endian field out of `bits` starting at `*offset`,
/// advancing `*offset` past it. Shared by the master/slave field parsers,
/// which both work over an already LDPC-decoded information-bit slice
/// rather than a [`crate::bit_reader::BitCursor`] (no truncation handling
/// is needed: every field width here is fixed by the parts' declared
/// lengths, not discovered mid-read).
pub(crate) fn read_field(bits: &[u8], offset: &mut usize, width: usize) -> u32 {
    let mut value = 0u32;
    for &bit in &bits[*offset..*offset + width] {
        value = (value << 1) | bit as u32;
    }
    *offset += width;
    value
}

/// Extends the metadata-phase palette pair (each already carrying the first
/// `entries[i].len()/3` entries) up to `color_count` entries and, for
/// `color_count` requiring it, deinterleaves or interpolates them into
/// their final form. Shared by master and slave metadata decode, which
/// differ only in which position table supplies entries past the initial
/// metadata-phase read.
pub(crate) fn finish_palette(
    matrix: &Matrix,
    data_map: &mut DataMap,
    color_count: u32,
    mut entries: [Vec<u8>; 2],
    position_for: impl Fn(usize) -> (i32, i32),
) -> Result<(Palette, Palette)> {
    let width = matrix.width();
    let height = matrix.height();
    let already_read = entries[0].len() / 3;
    let physical_count = (color_count as usize).min(64);

    for i in already_read..physical_count {
        let (x0, y0) = position_for(i);
        let (x1, y1) = mirror_palette_position(x0, y0, width, height);
        for (half, (x, y)) in [(0usize, (x0, y0)), (1usize, (x1, y1))] {
            data_map.mark(x, y);
            let rgb = if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
                matrix.pixel(x as usize, y as usize)
            } else {
                crate::matrix::Rgb::default()
            };
            entries[half].extend_from_slice(&[rgb.r, rgb.g, rgb.b]);
        }
    }

    if matches!(color_count, 16 | 32 | 64) {
        let mut combined = entries[0].clone();
        combined.extend_from_slice(&entries[1]);
        deinterleave_palette(&mut combined, color_count as usize, color_count);
        let (a, b) = combined.split_at(color_count as usize * 3);
        entries[0] = a.to_vec();
        entries[1] = b.to_vec();
    } else if matches!(color_count, 128 | 256) {
        let mut combined = vec![0u8; color_count as usize * 3 * 2];
        combined[..entries[0].len()].copy_from_slice(&entries[0]);
        let second_half = color_count as usize * 3;
        combined[second_half..second_half + entries[1].len()].copy_from_slice(&entries[1]);
        // The 64 physically-read anchor entries are still in interleaved
        // byte order; deinterleave them in place before interpolating the
        // remaining entries from them, matching decoder.c's
        // `deinterleavePalette(..., MIN(color_number, 64))` running ahead
        // of `interpolatePalette` whenever color_number > 64.
        deinterleave_palette(&mut combined, color_count as usize, 64);
        interpolate_palette(&mut combined, color_count as usize);
        let (a, b) = combined.split_at(color_count as usize * 3);
        entries[0] = a.to_vec();
        entries[1] = b.to_vec();
    }

    entries[0].truncate(color_count as usize * 3);
    entries[1].truncate(color_count as usize * 3);
    let [e0, e1] = entries;
    let palette0 = Palette::from_entries(color_count, e0)?;
    let palette1 = Palette::from_entries(color_count, e1)?;
    Ok((palette0, palette1))
}
