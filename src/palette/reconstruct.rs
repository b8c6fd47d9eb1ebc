//! Reconstructs a full palette from the subset actually transmitted in the
//! symbol. Large palettes only carry enough unique colors to derive the
//! rest by interleaved byte shuffles (K in {16,32,64}) or block
//! interpolation (K in {128,256}); ported from `deinterleavePalette`,
//! `interpolatePalette` and `copyAndInterpolateSubblockFrom16To32`.

/// Deinterleaves the two reference-point blocks (each `palette_size * 3`
/// bytes) inside `palette` in place, for `available_color_number` in
/// `{16, 32, 64}`. A no-op for any other value, matching `decoder.c`'s
/// early `break`.
pub fn deinterleave_palette(palette: &mut [u8], palette_size: usize, available_color_number: u32) {
    if !matches!(available_color_number, 16 | 32 | 64) {
        return;
    }
    let tmp = palette.to_vec();
    for i in 0..2usize {
        let offset = palette_size * 3 * i;
        match available_color_number {
            16 => {
                palette[offset + 12..offset + 36].copy_from_slice(&tmp[offset + 24..offset + 48]);
                palette[offset + 36..offset + 48].copy_from_slice(&tmp[offset + 12..offset + 24]);
            }
            32 => {
                palette[offset + 6..offset + 18].copy_from_slice(&tmp[offset + 24..offset + 36]);
                palette[offset + 18..offset + 24].copy_from_slice(&tmp[offset + 6..offset + 12]);

                palette[offset + 24..offset + 72].copy_from_slice(&tmp[offset + 36..offset + 84]);

                palette[offset + 72..offset + 78].copy_from_slice(&tmp[offset + 12..offset + 18]);
                palette[offset + 78..offset + 90].copy_from_slice(&tmp[offset + 84..offset + 96]);
                palette[offset + 90..offset + 96].copy_from_slice(&tmp[offset + 18..offset + 24]);
            }
            64 => {
                palette[offset + 3..offset + 9].copy_from_slice(&tmp[offset + 24..offset + 30]);
                palette[offset + 9..offset + 12].copy_from_slice(&tmp[offset + 3..offset + 6]);
                palette[offset + 12..offset + 36].copy_from_slice(&tmp[offset + 30..offset + 54]);
                palette[offset + 36..offset + 39].copy_from_slice(&tmp[offset + 6..offset + 9]);
                palette[offset + 39..offset + 45].copy_from_slice(&tmp[offset + 54..offset + 60]);
                palette[offset + 45..offset + 48].copy_from_slice(&tmp[offset + 9..offset + 12]);

                palette[offset + 48..offset + 144].copy_from_slice(&tmp[offset + 60..offset + 156]);

                palette[offset + 144..offset + 147].copy_from_slice(&tmp[offset + 12..offset + 15]);
                palette[offset + 147..offset + 153].copy_from_slice(&tmp[offset + 156..offset + 162]);
                palette[offset + 153..offset + 156].copy_from_slice(&tmp[offset + 15..offset + 18]);
                palette[offset + 156..offset + 180].copy_from_slice(&tmp[offset + 162..offset + 186]);
                palette[offset + 180..offset + 183].copy_from_slice(&tmp[offset + 18..offset + 21]);
                palette[offset + 183..offset + 189].copy_from_slice(&tmp[offset + 186..offset + 192]);
                palette[offset + 189..offset + 192].copy_from_slice(&tmp[offset + 21..offset + 24]);
            }
            _ => unreachable!(),
        }
    }
}

fn interpolate(a: u8, b: u8) -> u8 {
    ((a as u32 + b as u32) / 2) as u8
}

fn interpolate3(a: u8, weight_a: u32, b: u8, weight_b: u32) -> u8 {
    ((a as u32 * weight_a + b as u32 * weight_b) / (weight_a + weight_b)) as u8
}

/// Copies a 16-color sub-block into a 32-color block and interpolates it,
/// ported from `copyAndInterpolateSubblockFrom16To32`.
fn copy_and_interpolate_subblock_16_to_32(palette: &mut [u8], dst_offset: usize, src_offset: usize) {
    let src = palette[src_offset..src_offset + 48].to_vec();
    palette[dst_offset..dst_offset + 12].copy_from_slice(&src[0..12]);
    palette[dst_offset + 24..dst_offset + 36].copy_from_slice(&src[12..24]);
    palette[dst_offset + 60..dst_offset + 72].copy_from_slice(&src[24..36]);
    palette[dst_offset + 84..dst_offset + 96].copy_from_slice(&src[36..48]);

    for j in 0..12 {
        palette[dst_offset + 12 + j] =
            interpolate(palette[dst_offset + j], palette[dst_offset + 24 + j]);
    }
    for j in 0..12 {
        palette[dst_offset + 36 + j] =
            interpolate3(palette[dst_offset + 24 + j], 2, palette[dst_offset + 60 + j], 1);
        palette[dst_offset + 48 + j] =
            interpolate3(palette[dst_offset + j], 1, palette[dst_offset + 60 + j], 2);
    }
    for j in 0..12 {
        palette[dst_offset + 72 + j] =
            interpolate(palette[dst_offset + 60 + j], palette[dst_offset + 84 + j]);
    }
}

/// Interpolates a 64-color palette up to `color_number` (128 or 256)
/// colors in place, ported from `interpolatePalette`.
pub fn interpolate_palette(palette: &mut [u8], color_number: usize) {
    for i in 0..2usize {
        let offset = color_number * 3 * i;
        match color_number {
            128 => {
                palette.copy_within(offset + 144..offset + 192, offset + 336);
                palette.copy_within(offset + 96..offset + 144, offset + 240);
                palette.copy_within(offset + 48..offset + 96, offset + 96);

                for j in 0..48 {
                    palette[offset + 48 + j] =
                        interpolate(palette[offset + j], palette[offset + 96 + j]);
                }
                for j in 0..48 {
                    palette[offset + 144 + j] =
                        interpolate3(palette[offset + 96 + j], 2, palette[offset + 240 + j], 1);
                    palette[offset + 192 + j] =
                        interpolate3(palette[offset + 96 + j], 1, palette[offset + 240 + j], 2);
                }
                for j in 0..48 {
                    palette[offset + 288 + j] =
                        interpolate(palette[offset + 240 + j], palette[offset + 336 + j]);
                }
            }
            256 => {
                copy_and_interpolate_subblock_16_to_32(palette, offset + 672, offset + 144);
                copy_and_interpolate_subblock_16_to_32(palette, offset + 480, offset + 96);
                copy_and_interpolate_subblock_16_to_32(palette, offset + 192, offset + 48);
                copy_and_interpolate_subblock_16_to_32(palette, offset, offset);

                for j in 0..96 {
                    palette[offset + 96 + j] =
                        interpolate(palette[offset + j], palette[offset + 192 + j]);
                }
                for j in 0..96 {
                    palette[offset + 288 + j] =
                        interpolate3(palette[offset + 192 + j], 2, palette[offset + 480 + j], 1);
                    palette[offset + 384 + j] =
                        interpolate3(palette[offset + 192 + j], 1, palette[offset + 480 + j], 2);
                }
                for j in 0..96 {
                    palette[offset + 576 + j] =
                        interpolate(palette[offset + 480 + j], palette[offset + 672 + j]);
                }
            }
            _ => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deinterleave_noop_for_unsupported_count() {
        let mut palette = vec![1u8; 48];
        let before = palette.clone();
        deinterleave_palette(&mut palette, 8, 8);
        assert_eq!(palette, before);
    }

    #[test]
    fn deinterleave_16_preserves_length() {
        let mut palette: Vec<u8> = (0..96u8).collect();
        deinterleave_palette(&mut palette, 16, 16);
        assert_eq!(palette.len(), 96);
    }

    #[test]
    fn interpolate_128_fills_whole_block() {
        let mut palette = vec![0u8; 128 * 3 * 2];
        for (i, v) in palette.iter_mut().enumerate().take(48) {
            *v = (i % 256) as u8;
        }
        for (i, v) in palette.iter_mut().enumerate().skip(96).take(48) {
            *v = ((i * 2) % 256) as u8;
        }
        interpolate_palette(&mut palette, 128);
        assert_ne!(&palette[144..192], &[0u8; 48][..]);
    }
}
