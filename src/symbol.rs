//! Top-level orchestration: ties metadata decode, data-map construction and
//! the payload pipeline together into a [`DecodedSymbol`]. Ported from the
//! `decodeMaster`/`decodeSlave` entry points.

use crate::data_map::{DataMap, SymbolKind};
use crate::error::Result;
use crate::matrix::Matrix;
use crate::metadata::master::decode_master_metadata;
use crate::metadata::slave::decode_slave_metadata;
use crate::metadata::Metadata;
pub use crate::metadata::HostPosition;
use crate::palette::Palette;
use crate::payload::decode_payload;
use crate::text;

/// A fully decoded symbol: its reconstructed palettes, parsed metadata, and
/// the final text-demultiplexed byte string.
#[derive(Clone, Debug)]
pub struct DecodedSymbol {
    pub palettes: [Palette; 2],
    pub metadata: Metadata,
    pub side_size: (usize, usize),
    pub metadata_module_number: usize,
    pub data: Vec<u8>,
}

/// Decodes `matrix` as a master symbol: scans its metadata, builds the
/// data map, then runs the payload pipeline and text demultiplexer over
/// whatever's left.
pub fn decode_master(matrix: &Matrix) -> Result<DecodedSymbol> {
    let mut data_map = DataMap::new(matrix.width(), matrix.height());
    let (metadata, palette0, palette1, metadata_module_number) =
        decode_master_metadata(matrix, &mut data_map)?;
    data_map.fill_alignment_patterns(SymbolKind::Master);
    let bits = decode_payload(matrix, &data_map, [&palette0, &palette1], &metadata)?;
    let data = text::decode(&bits)?;
    Ok(DecodedSymbol {
        palettes: [palette0, palette1],
        side_size: (matrix.width(), matrix.height()),
        metadata_module_number,
        metadata,
        data,
    })
}

/// Decodes `matrix` as a slave symbol docked to `host` at `host_position`,
/// inheriting any metadata field its own header leaves unset.
pub fn decode_slave(
    matrix: &Matrix,
    host: &DecodedSymbol,
    host_position: HostPosition,
) -> Result<DecodedSymbol> {
    let mut data_map = DataMap::new(matrix.width(), matrix.height());
    let (metadata, palette0, palette1, metadata_module_number) =
        decode_slave_metadata(matrix, &mut data_map, &host.metadata, host_position)?;
    data_map.fill_alignment_patterns(SymbolKind::Slave);
    let bits = decode_payload(matrix, &data_map, [&palette0, &palette1], &metadata)?;
    let data = text::decode(&bits)?;
    Ok(DecodedSymbol {
        palettes: [palette0, palette1],
        side_size: (matrix.width(), matrix.height()),
        metadata_module_number,
        metadata,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Rgb;

    #[test]
    fn decode_master_rejects_a_matrix_too_small_for_any_metadata() {
        // A 1x1 matrix can't hold even the 6-module metadata part 1 hop
        // sequence without running entirely out of bounds; the decoder
        // must return an error rather than panic.
        let matrix = Matrix::from_pixels(1, 1, 24, vec![Rgb::default()]).unwrap();
        assert!(decode_master(&matrix).is_err());
    }
}
