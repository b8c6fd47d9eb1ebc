//! The payload pipeline: gathers every unreserved module, reverses the
//! mask, unpacks bits, reverses the interleave, and LDPC-decodes the
//! result into the information-bit stream the text demultiplexer reads.
//! Ported from `readData`/`decodeData`'s caller in `decodeMaster`.

use crate::classifier::decode_module;
use crate::data_map::DataMap;
use crate::error::{Phase, Result};
use crate::geometry::palette_half;
use crate::interleave::deinterleave;
use crate::ldpc::LdpcCode;
use crate::mask;
use crate::matrix::Matrix;
use crate::metadata::Metadata;
use crate::palette::{get_palette_threshold, Palette};

/// Decodes the payload region of `matrix` into its `Pn` information bits.
/// `palettes` is the symbol's two reconstructed palettes, selected per
/// module by [`palette_half`]; both master and slave symbols carry two.
pub fn decode_payload(
    matrix: &Matrix,
    data_map: &DataMap,
    palettes: [&Palette; 2],
    metadata: &Metadata,
) -> Result<Vec<u8>> {
    let width = matrix.width();
    let height = matrix.height();
    let color_count = metadata.color_count()?;
    let bits_per_module = color_count.ilog2() as usize;

    let thresholds = [
        get_palette_threshold(palettes[0].as_bytes(), color_count)?,
        get_palette_threshold(palettes[1].as_bytes(), color_count)?,
    ];

    let mut color_indices = vec![0u8; width * height];
    // Reliabilities aren't masked (the mask only whitens color indices),
    // so they're gathered straight into per-bit LLR order, one entry per
    // bit per module, in the same column-major order the gather loop
    // below walks the grid in.
    let mut reliabilities = Vec::with_capacity(width * height * bits_per_module);
    let mut gathered_bits = Vec::with_capacity(width * height * bits_per_module);

    for x in 0..width {
        for y in 0..height {
            if data_map.is_reserved(x, y) {
                continue;
            }
            let half = palette_half(x, y, width, height);
            let t = &thresholds[half];
            let pixel = matrix.pixel(x, y);
            let mut probabilities = [0.0f32; 8];
            let index = decode_module(
                palettes[half].as_bytes(),
                color_count,
                &t.thresholds,
                &t.reference_points,
                (pixel.r, pixel.g, pixel.b),
                &mut probabilities[..bits_per_module],
            )?;
            color_indices[y * width + x] = index;

            for bit_pos in 0..bits_per_module {
                let bit = (index >> (bits_per_module - 1 - bit_pos)) & 1;
                gathered_bits.push(bit);
                let confidence = probabilities[bit_pos];
                reliabilities.push(if bit == 0 { confidence } else { -confidence });
            }
        }
    }

    mask::apply(
        &mut color_indices,
        data_map.as_slice(),
        width,
        height,
        metadata.mask_type,
        color_count,
    );

    // Re-walk the same column-major order to pull the now-demasked bits
    // back out, overwriting the pre-mask values gathered above.
    let mut cursor = 0usize;
    for x in 0..width {
        for y in 0..height {
            if data_map.is_reserved(x, y) {
                continue;
            }
            let index = color_indices[y * width + x];
            for bit_pos in 0..bits_per_module {
                gathered_bits[cursor + bit_pos] = (index >> (bits_per_module - 1 - bit_pos)) & 1;
            }
            cursor += bits_per_module;
        }
    }

    let wc = metadata.ecl.wc;
    let wr = metadata.ecl.wr;
    let total_bits = gathered_bits.len();
    let pg = (total_bits / wr as usize) * wr as usize;

    let mut bits = gathered_bits[..pg].to_vec();
    let mut rel = reliabilities[..pg].to_vec();
    deinterleave(&mut bits, &mut rel, wr as usize);

    let code = LdpcCode::build(wc, wr, pg)?;
    let pn = pg * (wr - wc) as usize / wr as usize;
    let info = match code.decode_soft(&rel, Phase::Payload) {
        Ok((decoded, info_bits)) => {
            debug_assert_eq!(info_bits, pn);
            decoded
        }
        Err(_) => {
            let mut hard = bits.clone();
            code.decode_hard(&mut hard, Phase::Payload)?;
            hard
        }
    };

    Ok(info[..pn].to_vec())
}
