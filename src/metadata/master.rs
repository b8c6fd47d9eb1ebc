//! Master metadata decode: the three-part, LDPC-protected header at a
//! master symbol's top-left corner, ported from `decodeMasterMetadata`.

use crate::classifier::{decode_module, decode_module_hd};
use crate::data_map::DataMap;
use crate::error::{Error, Phase, Result};
use crate::geometry::{
    master_palette_position_ext, palette_half, side_size_for_version, MASTER_METADATA_X,
    MASTER_METADATA_Y, MASTER_PALETTE_POSITION,
};
use crate::ldpc::LdpcCode;
use crate::mask::MaskType;
use crate::matrix::Matrix;
use crate::metadata::scanner::MasterMetadataHop;
use crate::metadata::{finish_palette, mirror_palette_position, read_field, Ecl, Metadata};
use crate::palette::{get_palette_threshold, Palette, PaletteThresholds};

/// Decodes the master metadata block out of `matrix`, marking every module
/// it samples (metadata hops and palette cells alike) as reserved in
/// `data_map`. Returns the parsed metadata, the symbol's two reconstructed
/// palettes, and the number of modules the metadata scan consumed.
pub fn decode_master_metadata(
    matrix: &Matrix,
    data_map: &mut DataMap,
) -> Result<(Metadata, Palette, Palette, usize)> {
    let width = matrix.width();
    let height = matrix.height();
    let mut hop = MasterMetadataHop::new(
        width as i32,
        height as i32,
        MASTER_METADATA_X,
        MASTER_METADATA_Y,
    );

    // Part 1: 6 modules, one bit each (2-color, no palette), carrying Nc.
    let mut part1_bits = Vec::with_capacity(6);
    let mut pos = hop.position();
    for i in 0..6 {
        if i > 0 {
            pos = hop.next().expect("MasterMetadataHop never terminates");
        }
        data_map.mark(pos.0, pos.1);
        let bit = sample_hd_bit(matrix, pos);
        part1_bits.push(bit);
    }
    let part1_code = LdpcCode::build_metadata(6)?;
    let part1_info_len = part1_code.decode_hard(&mut part1_bits, Phase::MasterMetadataPart1)?;
    let mut offset = 0;
    let nc = read_field(&part1_bits, &mut offset, part1_info_len.min(3)) as u8;
    let color_count = 1u32 << (nc + 1);
    let mut modules_used = 6usize;

    // Metadata-phase palette: the first 8 entries of each half, sampled
    // directly (not LDPC-protected) near finder 0.
    let meta_color_count = color_count.min(8);
    let mut entries0 = Vec::with_capacity(24);
    let mut entries1 = Vec::with_capacity(24);
    for &(x0, y0) in MASTER_PALETTE_POSITION.iter() {
        let (x1, y1) = mirror_palette_position(x0, y0, width, height);
        data_map.mark(x0, y0);
        data_map.mark(x1, y1);
        push_rgb(matrix, width, height, x0, y0, &mut entries0);
        push_rgb(matrix, width, height, x1, y1, &mut entries1);
    }
    entries0.truncate(meta_color_count as usize * 3);
    entries1.truncate(meta_color_count as usize * 3);
    let thresholds = [
        get_palette_threshold(&entries0, meta_color_count)?,
        get_palette_threshold(&entries1, meta_color_count)?,
    ];
    let bits_per_module = meta_color_count.ilog2() as usize;

    // Part 2: fixed 18-bit codeword carrying SS, VF, mask_type, SF.
    let mut bits: Vec<u8> = Vec::new();
    let mut reliabilities: Vec<f32> = Vec::new();
    modules_used += gather_soft_bits(
        &mut hop,
        matrix,
        data_map,
        [&entries0, &entries1],
        meta_color_count,
        &thresholds,
        bits_per_module,
        &mut bits,
        &mut reliabilities,
        18,
    );
    let part2_code = LdpcCode::build_metadata(18)?;
    let mut part2_codeword = bits[..18].to_vec();
    let part2_info_len =
        part2_code.decode_hard(&mut part2_codeword, Phase::MasterMetadataPart2)?;
    bits.drain(0..18);
    reliabilities.drain(0..18);

    debug_assert!(part2_info_len >= 7);
    let mut offset = 0;
    let ss = read_field(&part2_codeword, &mut offset, 1);
    let vf = read_field(&part2_codeword, &mut offset, 2);
    let mask_raw = read_field(&part2_codeword, &mut offset, 3);
    let sf = read_field(&part2_codeword, &mut offset, 1);
    let mask_type = MaskType::new(mask_raw as u8)?;

    // Part 3: variable-length, carrying side version(s), (wc, wr) and,
    // when `sf` is set, the docked-neighbor bitmap. `SS == 0` is the
    // square-symbol case (one shared side version); `SS == 1` is the
    // rectangle case (independent x/y versions), matching
    // `decodeMasterMetadata`'s `V_length`/`E_length` derivation.
    let is_square = ss == 0;
    let v_length = if is_square {
        if vf == 0 { 2 } else { vf as usize + 1 }
    } else {
        vf as usize * 2 + 4
    };
    let e_length = vf as usize * 2 + 10;
    let s_length = if sf == 1 { 4usize } else { 0usize };
    let info3_len = v_length + e_length + s_length;
    let n3 = 2 * info3_len;

    modules_used += gather_soft_bits(
        &mut hop,
        matrix,
        data_map,
        [&entries0, &entries1],
        meta_color_count,
        &thresholds,
        bits_per_module,
        &mut bits,
        &mut reliabilities,
        n3,
    );
    let part3_code = LdpcCode::build_metadata(n3)?;
    let mut part3_codeword = bits[..n3].to_vec();
    part3_code.decode_hard(&mut part3_codeword, Phase::MasterMetadataPart3)?;

    let mut offset = 0;
    let (side_version_x, side_version_y) = if is_square {
        let v = read_field(&part3_codeword, &mut offset, v_length);
        let side_version = if vf == 0 { v + 1 } else { (1u32 << (vf + 1)) + v + 1 };
        (side_version as u8, side_version as u8)
    } else {
        let half = v_length / 2;
        let vx = read_field(&part3_codeword, &mut offset, half) + 1;
        let vy = read_field(&part3_codeword, &mut offset, half) + 1;
        (vx as u8, vy as u8)
    };
    let e_half = e_length / 2;
    let wc = read_field(&part3_codeword, &mut offset, e_half) + 3;
    let wr = read_field(&part3_codeword, &mut offset, e_half) + 4;
    let ecl = Ecl::new(wc, wr)?;
    let docked_position = if s_length == 4 {
        crate::metadata::DockedMask::new(read_field(&part3_codeword, &mut offset, 4) as u8)
    } else {
        crate::metadata::DockedMask::default()
    };

    let side_size_x = side_size_for_version(side_version_x)
        .ok_or(Error::SizeMismatch(width, height, 0, 0))?;
    let side_size_y = side_size_for_version(side_version_y)
        .ok_or(Error::SizeMismatch(width, height, 0, 0))?;
    if width != side_size_x as usize || height != side_size_y as usize {
        return Err(Error::SizeMismatch(
            width,
            height,
            side_size_x as usize,
            side_size_y as usize,
        ));
    }

    let metadata = Metadata {
        nc,
        side_version_x,
        side_version_y,
        mask_type,
        ecl,
        docked_position,
    };

    let (palette0, palette1) = finish_palette(
        matrix,
        data_map,
        color_count,
        [entries0, entries1],
        master_palette_position_ext,
    )?;

    Ok((metadata, palette0, palette1, modules_used))
}

fn sample_hd_bit(matrix: &Matrix, pos: (i32, i32)) -> u8 {
    if pos.0 < 0 || pos.1 < 0 || pos.0 as usize >= matrix.width() || pos.1 as usize >= matrix.height()
    {
        return 0;
    }
    let p = matrix.pixel(pos.0 as usize, pos.1 as usize);
    decode_module_hd(None, p.r, p.g, p.b)
}

fn push_rgb(matrix: &Matrix, width: usize, height: usize, x: i32, y: i32, out: &mut Vec<u8>) {
    if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
        out.extend_from_slice(&[0, 0, 0]);
        return;
    }
    let p = matrix.pixel(x as usize, y as usize);
    out.extend_from_slice(&[p.r, p.g, p.b]);
}

/// Gathers hop-sequence modules, each classified against the metadata-phase
/// palette, until at least `target_len` bits have accumulated in `bits`;
/// a module's bit count rarely divides `target_len` evenly, so the last
/// module read may push a few bits past it — those spill into the next
/// part's `bits`, matching the "overflow bits spill" behavior spec.md
/// documents. Returns the number of modules sampled.
#[allow(clippy::too_many_arguments)]
fn gather_soft_bits(
    hop: &mut MasterMetadataHop,
    matrix: &Matrix,
    data_map: &mut DataMap,
    palettes: [&[u8]; 2],
    color_count: u32,
    thresholds: &[PaletteThresholds; 2],
    bits_per_module: usize,
    bits: &mut Vec<u8>,
    reliabilities: &mut Vec<f32>,
    target_len: usize,
) -> usize {
    let width = matrix.width();
    let height = matrix.height();
    let mut modules = 0usize;
    while bits.len() < target_len {
        let (x, y) = hop.next().expect("MasterMetadataHop never terminates");
        modules += 1;
        data_map.mark(x, y);
        if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
            bits.extend(std::iter::repeat(0).take(bits_per_module));
            reliabilities.extend(std::iter::repeat(0.0).take(bits_per_module));
            continue;
        }
        let half = palette_half(x as usize, y as usize, width, height);
        let pixel = matrix.pixel(x as usize, y as usize);
        let mut probabilities = [0.0f32; 8];
        let index = match decode_module(
            palettes[half],
            color_count,
            &thresholds[half].thresholds,
            &thresholds[half].reference_points,
            (pixel.r, pixel.g, pixel.b),
            &mut probabilities[..bits_per_module],
        ) {
            Ok(i) => i,
            Err(_) => 0,
        };
        for bit_pos in 0..bits_per_module {
            let bit = (index >> (bits_per_module - 1 - bit_pos)) & 1;
            bits.push(bit);
            let confidence = probabilities[bit_pos];
            reliabilities.push(if bit == 0 { confidence } else { -confidence });
        }
    }
    modules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Rgb;

    #[test]
    fn rejects_a_size_mismatched_matrix() {
        // A matrix whose dimensions can never correspond to the decoded
        // side-version pair (here: a 1x1 matrix) must fail cleanly rather
        // than panic on out-of-bounds sampling.
        let matrix = Matrix::from_pixels(1, 1, 24, vec![Rgb::default()]).unwrap();
        let mut data_map = DataMap::new(1, 1);
        let result = decode_master_metadata(&matrix, &mut data_map);
        assert!(result.is_err());
    }
}
