//! Slave metadata decode: a docked symbol's header, which only transmits
//! fields that differ from its host. Ported from `decodeSlaveMetadata`.

use crate::classifier::{decode_module, decode_module_hd};
use crate::data_map::DataMap;
use crate::error::{Error, Phase, Result};
use crate::geometry::{
    palette_half, side_size_for_version, slave_palette_position, SLAVE_METADATA_X,
    SLAVE_METADATA_Y,
};
use crate::ldpc::LdpcCode;
use crate::matrix::Matrix;
use crate::metadata::scanner::SlaveMetadataHop;
use crate::metadata::{finish_palette, mirror_palette_position, read_field, DockedMask, Ecl};
use crate::metadata::{HostPosition, Metadata};
use crate::palette::{get_palette_threshold, Palette, PaletteThresholds};

/// Decodes a slave symbol's metadata block, inheriting any field its own
/// header doesn't override from `host`. Returns the parsed metadata, the
/// slave's two reconstructed palettes, and the number of modules the
/// metadata scan consumed.
pub fn decode_slave_metadata(
    matrix: &Matrix,
    data_map: &mut DataMap,
    host: &Metadata,
    host_position: HostPosition,
) -> Result<(Metadata, Palette, Palette, usize)> {
    let width = matrix.width();
    let height = matrix.height();
    let mut hop = SlaveMetadataHop::new(SLAVE_METADATA_X, SLAVE_METADATA_Y);

    // Part 1: 6 modules, one bit each, carrying the SS/SE/SF override
    // flags (side version, error-correction, docked bitmap respectively).
    let mut part1_bits = Vec::with_capacity(6);
    let mut pos = (SLAVE_METADATA_X, SLAVE_METADATA_Y);
    for i in 0..6 {
        if i > 0 {
            pos = hop.next().expect("SlaveMetadataHop never terminates");
        }
        data_map.mark(pos.0, pos.1);
        part1_bits.push(sample_hd_bit(matrix, pos));
    }
    let part1_code = LdpcCode::build_metadata(6)?;
    part1_code.decode_hard(&mut part1_bits, Phase::SlaveMetadataPart1)?;
    let mut offset = 0;
    let ss = read_field(&part1_bits, &mut offset, 1);
    let se = read_field(&part1_bits, &mut offset, 1);
    let sf = read_field(&part1_bits, &mut offset, 1);
    let mut modules_used = 6usize;

    let color_count = host.color_count()?;
    let meta_color_count = color_count.min(8);
    let mut entries0 = Vec::with_capacity(24);
    let mut entries1 = Vec::with_capacity(24);
    for i in 0..8usize {
        let (x0, y0) = slave_palette_position(i);
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

    // Part 2 carries the fields SS/SF flag as overridden: V (side version,
    // 5 bits) when `ss` is set, then S (docked bitmap, 3 bits) when `sf`
    // is set. Its length is 0 (no modules read at all) unless at least one
    // of those flags is set, per `decodeSlaveMetadata`'s `part2_bit_length`
    // accumulation.
    let v_info = if ss == 1 { 5usize } else { 0 };
    let s_info = if sf == 1 { 3usize } else { 0 };
    let info2_len = v_info + s_info;
    let n2 = 2 * info2_len;

    let mut bits: Vec<u8> = Vec::new();
    let mut reliabilities: Vec<f32> = Vec::new();
    let mut side_version_x = host.side_version_x;
    let mut side_version_y = host.side_version_y;
    let mut docked_position = DockedMask::default();
    // Part 3's E (ecl) field width depends on whichever VF is in scope: the
    // host's, if this slave doesn't override its side version, or the
    // slave's own newly-read one otherwise. `decodeSlaveMetadata` computes
    // it from the host's VF before part 2 is even read when `ss` is unset,
    // and from the freshly parsed side version afterward when `ss` is set.
    let mut e_info = if se == 1 && ss == 0 {
        version_family(host.side_version_x, host.side_version_y) as usize * 2 + 10
    } else {
        0
    };

    if n2 > 0 {
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
            n2,
        );
        let part2_code = LdpcCode::build_metadata(n2)?;
        let mut part2_codeword = bits[..n2].to_vec();
        part2_code.decode_hard(&mut part2_codeword, Phase::SlaveMetadataPart2)?;
        bits.drain(0..n2);
        reliabilities.drain(0..n2);

        let mut offset = 0;
        if v_info == 5 {
            let v = read_field(&part2_codeword, &mut offset, 5) as u8;
            match host_position {
                HostPosition::South | HostPosition::West => {
                    side_version_y = host.side_version_y;
                    side_version_x = v;
                }
                HostPosition::North | HostPosition::East => {
                    side_version_x = host.side_version_x;
                    side_version_y = v;
                }
            }
            if se == 1 {
                e_info = version_family(side_version_x, side_version_y) as usize * 2 + 10;
            }
        }
        if s_info == 3 {
            let mut raw = 0u8;
            for i in 0..4u8 {
                if i != host_position as u8 {
                    let bit = read_field(&part2_codeword, &mut offset, 1) as u8;
                    raw |= bit << (3 - i);
                }
            }
            docked_position = DockedMask::new(raw);
        }
    }

    let n3 = 2 * e_info;
    let ecl = if n3 > 0 {
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
        part3_code.decode_hard(&mut part3_codeword, Phase::SlaveMetadataPart3)?;

        let mut offset = 0;
        let half = e_info / 2;
        let wc = read_field(&part3_codeword, &mut offset, half) + 3;
        let wr = read_field(&part3_codeword, &mut offset, half) + 4;
        Ecl::new(wc, wr)?
    } else {
        host.ecl
    };

    let side_size_x =
        side_size_for_version(side_version_x).ok_or(Error::SizeMismatch(width, height, 0, 0))?;
    let side_size_y =
        side_size_for_version(side_version_y).ok_or(Error::SizeMismatch(width, height, 0, 0))?;
    if width != side_size_x as usize || height != side_size_y as usize {
        return Err(Error::SizeMismatch(
            width,
            height,
            side_size_x as usize,
            side_size_y as usize,
        ));
    }

    let metadata = Metadata {
        nc: host.nc,
        side_version_x,
        side_version_y,
        mask_type: host.mask_type,
        ecl,
        docked_position,
    };

    let (palette0, palette1) = finish_palette(
        matrix,
        data_map,
        color_count,
        [entries0, entries1],
        slave_palette_position,
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

/// Buckets a side-version pair into the same `VF` quantization
/// `decodeSlaveMetadata` uses to size the `E` field: families of 4, 8, 16
/// and 32.
fn version_family(side_version_x: u8, side_version_y: u8) -> u8 {
    let sv_max = side_version_x.max(side_version_y);
    if sv_max <= 4 {
        0
    } else if sv_max <= 8 {
        1
    } else if sv_max <= 16 {
        2
    } else {
        3
    }
}

fn push_rgb(matrix: &Matrix, width: usize, height: usize, x: i32, y: i32, out: &mut Vec<u8>) {
    if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
        out.extend_from_slice(&[0, 0, 0]);
        return;
    }
    let p = matrix.pixel(x as usize, y as usize);
    out.extend_from_slice(&[p.r, p.g, p.b]);
}

#[allow(clippy::too_many_arguments)]
fn gather_soft_bits(
    hop: &mut SlaveMetadataHop,
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
        let (x, y) = hop.next().expect("SlaveMetadataHop never terminates");
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
    use crate::mask::MaskType;
    use crate::matrix::Rgb;

    #[test]
    fn ss_se_sf_all_unset_skips_part2_and_part3_entirely() {
        // Spec scenario: SS=SE=SF=0 means a slave inherits side version,
        // ecl and docked bitmap wholesale, with parts 2 and 3 contributing
        // zero modules to the scan (part2_bit_length/part3_bit_length both
        // stay 0 in `decodeSlaveMetadata`).
        let side = 21usize;
        let mut matrix = Matrix::from_pixels(side, side, 24, vec![Rgb::default(); side * side]).unwrap();

        let part1_code = LdpcCode::build_metadata(6).unwrap();
        let codeword = part1_code.encode(&[0, 0, 0]); // ss=0, se=0, sf=0

        let mut hop = SlaveMetadataHop::new(SLAVE_METADATA_X, SLAVE_METADATA_Y);
        let mut pos = (SLAVE_METADATA_X, SLAVE_METADATA_Y);
        for (i, &bit) in codeword.iter().enumerate() {
            if i > 0 {
                pos = hop.next().unwrap();
            }
            let rgb = if bit == 0 { Rgb::new(0, 0, 0) } else { Rgb::new(255, 255, 255) };
            matrix.set_pixel(pos.0 as usize, pos.1 as usize, rgb);
        }

        let mut data_map = DataMap::new(side, side);
        let host = Metadata {
            nc: 1,
            side_version_x: 0,
            side_version_y: 0,
            mask_type: MaskType::new(0).unwrap(),
            ecl: Ecl::new(3, 4).unwrap(),
            docked_position: DockedMask::default(),
        };

        let (metadata, _palette0, _palette1, modules_used) =
            decode_slave_metadata(&matrix, &mut data_map, &host, HostPosition::North).unwrap();

        assert_eq!(modules_used, 6, "n2=n3=0 must consume no modules beyond part 1");
        assert_eq!(metadata.side_version_x, host.side_version_x);
        assert_eq!(metadata.side_version_y, host.side_version_y);
        assert_eq!(metadata.ecl, host.ecl);
        assert_eq!(metadata.docked_position, host.docked_position);
    }

    #[test]
    fn rejects_a_size_mismatched_matrix() {
        let matrix = Matrix::from_pixels(1, 1, 24, vec![Rgb::default()]).unwrap();
        let mut data_map = DataMap::new(1, 1);
        let host = Metadata {
            nc: 1,
            side_version_x: 0,
            side_version_y: 0,
            mask_type: MaskType::new(0).unwrap(),
            ecl: Ecl::new(3, 4).unwrap(),
            docked_position: DockedMask::default(),
        };
        let result = decode_slave_metadata(&matrix, &mut data_map, &host, HostPosition::North);
        assert!(result.is_err());
    }
}
