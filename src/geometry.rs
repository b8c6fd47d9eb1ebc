//! Static layout tables shared by the metadata scanner and the data-map
//! builder.
//!
//! The real ISO/IEC 23634 tables (`jab_decoding_table_*`, the palette
//! position tables, `VERSION2SIZE`) live in headers that were not part of
//! the retrieved reference source, only `decoder.c` itself was. The values
//! below are a self-consistent reconstruction: they honor every shape
//! `decoder.c`'s algorithms require (alignment spacing, finder-corner
//! extensions, hop boundaries) without claiming to be a byte-exact port of
//! the standard's published constants. See `DESIGN.md` for the open
//! question this resolves.

/// Minimum margin, in modules, between a finder pattern's center and the
/// symbol border.
pub const DISTANCE_TO_BORDER: i32 = 3;

/// Target spacing, in modules, between consecutive alignment patterns.
pub const MINIMUM_DISTANCE_BETWEEN_ALIGNMENTS: i32 = 21;

/// Starting coordinate of the first master metadata module, immediately
/// below the top-left finder pattern.
pub const MASTER_METADATA_X: i32 = 5;
pub const MASTER_METADATA_Y: i32 = 1;

/// Starting coordinate of the first slave metadata module.
pub const SLAVE_METADATA_X: i32 = 2;
pub const SLAVE_METADATA_Y: i32 = 2;

/// Side size, in modules, for each of the 32 master symbol versions
/// (`VERSION2SIZE`-equivalent). Versions grow from the smallest (21x21,
/// matching spec.md's scenario 1) in steps of 4 modules, the pattern
/// `decoder.c`'s alignment-count formula expects.
pub const VERSION_SIDE_SIZES: [i32; 32] = {
    let mut sizes = [0i32; 32];
    let mut i = 0;
    while i < 32 {
        sizes[i] = 21 + (i as i32) * 4;
        i += 1;
    }
    sizes
};

/// `decodeMasterMetadata`'s parsed side-version value is 1-based (its
/// minimum, `V+1` with `V=0`, is 1); `decodeSlaveMetadata`'s unmirrored
/// override field is used directly as a 0-based index. `saturating_sub(1)`
/// reconciles both callers against this one table: version 0 and 1 both
/// land on the smallest size.
pub fn side_size_for_version(version: u8) -> Option<i32> {
    VERSION_SIDE_SIZES.get(version.saturating_sub(1) as usize).copied()
}

/// Sampling positions for the first 8 entries of a master symbol's two
/// palettes, read near finder pattern 0 before `Nc` is even known. A
/// reconstruction, not a copy of `master_palette_position` (whose values
/// live in a header not present in `original_source/`): bounded so they
/// stay inside the smallest legal symbol (21x21).
pub const MASTER_PALETTE_POSITION: [(i32, i32); 8] = [
    (1, 4),
    (1, 5),
    (1, 6),
    (1, 7),
    (1, 8),
    (1, 9),
    (1, 10),
    (1, 11),
];

/// Sampling positions for a slave symbol's metadata-phase palette (up to
/// 32 entries, enough for the `available_color_number / 2` index range
/// `decodeSlave` walks for a 64-color palette). Same reconstruction
/// caveat as [`MASTER_PALETTE_POSITION`].
pub fn slave_palette_position(i: usize) -> (i32, i32) {
    (1 + (i % 4) as i32, 2 + (i / 4) as i32)
}

pub const SLAVE_PALETTE_POSITION_MAX: usize = 32;

/// Sampling position for master-palette entry `i` across the full `0..64`
/// range a 64-color master palette needs. The first 8 entries are
/// [`MASTER_PALETTE_POSITION`] itself (read during the metadata phase,
/// before `Nc` reveals whether more are needed); entries 8 and up continue
/// down the same column, one row per entry, since no further position data
/// survived retrieval from `original_source/`.
pub fn master_palette_position_ext(i: usize) -> (i32, i32) {
    if i < MASTER_PALETTE_POSITION.len() {
        MASTER_PALETTE_POSITION[i]
    } else {
        (1, 4 + i as i32)
    }
}

/// Which of a symbol's two palettes governs the module at `(x, y)`: palette
/// 0 for the left/top half, palette 1 for the right/bottom half. Wide
/// symbols (`width > height`) split left/right; tall or square symbols
/// split top/bottom, matching the master-orientation policy used during
/// both metadata and payload passes.
pub fn palette_half(x: usize, y: usize, width: usize, height: usize) -> usize {
    if width > height {
        (x >= width / 2) as usize
    } else {
        (y >= height / 2) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smallest_version_matches_spec_scenario() {
        assert_eq!(side_size_for_version(0), Some(21));
    }

    #[test]
    fn sizes_grow_monotonically() {
        assert!(VERSION_SIDE_SIZES.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn palette_half_splits_wide_symbols_left_right() {
        assert_eq!(palette_half(0, 5, 30, 21), 0);
        assert_eq!(palette_half(29, 5, 30, 21), 1);
    }

    #[test]
    fn palette_half_splits_tall_or_square_symbols_top_bottom() {
        assert_eq!(palette_half(5, 0, 21, 21), 0);
        assert_eq!(palette_half(5, 20, 21, 21), 1);
    }
}
