//! The 8 JAB mask patterns.
//!
//! Each pattern XORs a position-dependent value into a module's color
//! index. XOR is its own inverse, so `apply` is used both to remove the
//! mask that was applied at encode time and, in tests, to verify that
//! applying the same pattern twice is the identity.

use crate::error::{Error, Result};

/// Selects which of the 8 positional formulas `apply` uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MaskType(u8);

impl MaskType {
    pub fn new(value: u8) -> Result<Self> {
        if value > 7 {
            return Err(Error::InvalidMaskType(value));
        }
        Ok(MaskType(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// The per-module XOR term for mask `pattern` at `(x, y)`, reduced into
/// `0..color_count` so XOR-ing it into any valid color index produces
/// another valid color index.
fn mask_term(pattern: u8, x: usize, y: usize, color_count: u32) -> u32 {
    let (x, y) = (x as u32, y as u32);
    let raw = match pattern {
        0 => x.wrapping_add(y),
        1 => x,
        2 => y,
        3 => x.wrapping_add(y) / 3,
        4 => (x / 3).wrapping_add(y / 3),
        5 => (x.wrapping_mul(y)) % 3 + (x.wrapping_add(y)),
        6 => ((x.wrapping_mul(y)) % 3).wrapping_add((x.wrapping_mul(y)) % 5),
        7 => ((x.wrapping_add(y)) % 3).wrapping_add((x.wrapping_mul(y)) % 5),
        _ => unreachable!("MaskType guarantees pattern <= 7"),
    };
    raw % color_count
}

/// Applies (or un-applies, since it is self-inverse) `mask` to every
/// non-data-map cell's color index in `color_indices`, a row-major grid of
/// `width x height` indices each in `0..color_count`.
pub fn apply(
    color_indices: &mut [u8],
    data_map: &[u8],
    width: usize,
    height: usize,
    mask: MaskType,
    color_count: u32,
) {
    debug_assert_eq!(color_indices.len(), width * height);
    debug_assert_eq!(data_map.len(), width * height);
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            if data_map[i] != 0 {
                continue;
            }
            let term = mask_term(mask.value(), x, y, color_count);
            color_indices[i] = (color_indices[i] as u32 ^ term) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applying_twice_is_identity() {
        let width = 5;
        let height = 5;
        let data_map = vec![0u8; width * height];
        let original: Vec<u8> = (0..(width * height) as u32).map(|i| (i % 4) as u8).collect();
        for pattern in 0..8u8 {
            let mask = MaskType::new(pattern).unwrap();
            let mut data = original.clone();
            apply(&mut data, &data_map, width, height, mask, 4);
            apply(&mut data, &data_map, width, height, mask, 4);
            assert_eq!(data, original, "pattern {pattern} was not self-inverse");
        }
    }

    #[test]
    fn data_map_cells_are_untouched() {
        let width = 3;
        let height = 3;
        let mut data_map = vec![0u8; width * height];
        data_map[4] = 1;
        let original = vec![2u8; width * height];
        let mut data = original.clone();
        let mask = MaskType::new(3).unwrap();
        apply(&mut data, &data_map, width, height, mask, 4);
        assert_eq!(data[4], original[4]);
    }

    #[test]
    fn rejects_out_of_range_pattern() {
        assert!(MaskType::new(8).is_err());
    }
}
