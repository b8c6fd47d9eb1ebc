//! Whole-symbol integration tests: a handful of spec.md's worked
//! end-to-end examples, built pixel by pixel from directly-encoded LDPC
//! codewords and carried through metadata decode, payload decode and text
//! demultiplexing exactly as a real capture would be.
//!
//! Fixture construction only ever uses the crate's own public decode
//! entry points (`decode_master_metadata` to get back an authoritative
//! `DataMap`/palette, then `LdpcCode`/`interleave`/`mask::apply` run
//! forward) rather than replicating the encoder side by hand, so these
//! stay correct if any of those internals' reconstructed geometry ever
//! changes.

use jabcode::data_map::{DataMap, SymbolKind};
use jabcode::decode_master;
use jabcode::geometry::{MASTER_METADATA_X, MASTER_METADATA_Y, MASTER_PALETTE_POSITION};
use jabcode::interleave::interleave;
use jabcode::ldpc::LdpcCode;
use jabcode::mask;
use jabcode::matrix::{Matrix, Rgb};
use jabcode::metadata::master::decode_master_metadata;
use jabcode::metadata::scanner::MasterMetadataHop;

const SIDE: usize = 21;

/// A palette whose entries sit at the corners of the RGB cube, ordered so
/// each entry's index is its (R, G, B) threshold bits read MSB-first —
/// exactly what `get_palette_threshold`/`decode_module` expect for 4 and
/// 8 colors.
fn corner_palette(color_count: u32) -> Vec<(u8, u8, u8)> {
    match color_count {
        4 => vec![(0, 0, 0), (0, 255, 0), (255, 0, 0), (255, 255, 0)],
        8 => vec![
            (0, 0, 0),
            (0, 0, 255),
            (0, 255, 0),
            (0, 255, 255),
            (255, 0, 0),
            (255, 0, 255),
            (255, 255, 0),
            (255, 255, 255),
        ],
        other => panic!("no corner palette fixture for {other} colors"),
    }
}

/// `mirror_palette_position` for a square symbol always takes the
/// top/bottom branch.
fn mirror(x: i32, y: i32) -> (i32, i32) {
    (x, SIDE as i32 - 1 - y)
}

fn paint_palette(matrix: &mut Matrix, palette: &[(u8, u8, u8)]) {
    for (i, &(r, g, b)) in palette.iter().enumerate() {
        let (x0, y0) = MASTER_PALETTE_POSITION[i];
        let (x1, y1) = mirror(x0, y0);
        matrix.set_pixel(x0 as usize, y0 as usize, Rgb::new(r, g, b));
        matrix.set_pixel(x1 as usize, y1 as usize, Rgb::new(r, g, b));
    }
}

/// Paints a hard-decision (2-color) codeword along the hop sequence,
/// starting at `start` for the first bit and calling `hop.next()` for
/// every bit after it, matching `decode_master_metadata`'s part-1 loop.
fn paint_hd_bits(matrix: &mut Matrix, hop: &mut MasterMetadataHop, start: (i32, i32), bits: &[u8]) {
    let mut pos = start;
    for (i, &bit) in bits.iter().enumerate() {
        if i > 0 {
            pos = hop.next().unwrap();
        }
        let rgb = if bit == 0 { Rgb::new(0, 0, 0) } else { Rgb::new(255, 255, 255) };
        matrix.set_pixel(pos.0 as usize, pos.1 as usize, rgb);
    }
}

/// Paints a palette-classified codeword, one hop module per
/// `bits_per_module`-wide MSB-first chunk, matching `gather_soft_bits`.
fn paint_soft_bits(
    matrix: &mut Matrix,
    hop: &mut MasterMetadataHop,
    palette: &[(u8, u8, u8)],
    bits_per_module: usize,
    bits: &[u8],
) {
    for chunk in bits.chunks(bits_per_module) {
        let pos = hop.next().unwrap();
        let mut index = 0usize;
        for &bit in chunk {
            index = (index << 1) | bit as usize;
        }
        let (r, g, b) = palette[index];
        matrix.set_pixel(pos.0 as usize, pos.1 as usize, Rgb::new(r, g, b));
    }
}

/// Appends `value` to `bits`, most-significant bit first, `width` bits wide.
fn push_field(bits: &mut Vec<u8>, value: u32, width: usize) {
    for i in (0..width).rev() {
        bits.push(((value >> i) & 1) as u8);
    }
}

/// Builds a 21x21 master symbol whose metadata decodes to `color_count`
/// colors, mask `mask_value` and ecl `(wc, wr)`, and whose payload carries
/// `message_bits` zero-padded out to the symbol's full information
/// capacity. `message_bits` must already end with an explicit
/// end-of-message marker (Lower mode's value=31/sub=3, the only genuine
/// one `decodeData` has), since the padding is never read as anything but
/// message content otherwise.
fn build_master_symbol(color_count: u32, mask_value: u8, wc: u32, wr: u32, message_bits: &[u8]) -> Matrix {
    let palette = corner_palette(color_count);
    let bits_per_module = color_count.ilog2() as usize;
    let nc = (color_count.ilog2() - 1) as u8;

    let mut matrix = Matrix::from_pixels(SIDE, SIDE, 24, vec![Rgb::default(); SIDE * SIDE]).unwrap();
    paint_palette(&mut matrix, &palette);

    let mut hop = MasterMetadataHop::new(SIDE as i32, SIDE as i32, MASTER_METADATA_X, MASTER_METADATA_Y);

    let mut info1 = Vec::new();
    push_field(&mut info1, nc as u32, 3);
    let codeword1 = LdpcCode::build_metadata(6).unwrap().encode(&info1);
    paint_hd_bits(&mut matrix, &mut hop, (MASTER_METADATA_X, MASTER_METADATA_Y), &codeword1);

    // ss=0 (one shared, square side version), vf=0 (the smallest V_length/
    // E_length: 2 and 10 info bits respectively), sf=1 (docked-neighbor
    // nibble present).
    let mut info2 = Vec::new();
    push_field(&mut info2, 0, 1); // ss
    push_field(&mut info2, 0, 2); // vf
    push_field(&mut info2, mask_value as u32, 3);
    push_field(&mut info2, 1, 1); // sf
    push_field(&mut info2, 0, 2); // unused padding up to 9 info bits
    let codeword2 = LdpcCode::build_metadata(18).unwrap().encode(&info2);
    paint_soft_bits(&mut matrix, &mut hop, &palette, bits_per_module, &codeword2);

    let mut info3 = Vec::new();
    push_field(&mut info3, 0, 2); // V=0 -> side_version = V+1 = 1 -> side size 21
    push_field(&mut info3, wc - 3, 5);
    push_field(&mut info3, wr - 4, 5);
    push_field(&mut info3, 0, 4); // docked_position
    let codeword3 = LdpcCode::build_metadata(32).unwrap().encode(&info3);
    paint_soft_bits(&mut matrix, &mut hop, &palette, bits_per_module, &codeword3);

    let mut data_map = DataMap::new(SIDE, SIDE);
    let (metadata, palette0, _palette1, _modules_used) =
        decode_master_metadata(&matrix, &mut data_map).expect("constructed metadata must decode cleanly");
    assert_eq!(metadata.color_count().unwrap(), color_count);
    assert_eq!(metadata.mask_type.value(), mask_value);
    assert_eq!((metadata.ecl.wc, metadata.ecl.wr), (wc, wr));
    data_map.fill_alignment_patterns(SymbolKind::Master);

    let non_reserved = (0..SIDE)
        .flat_map(|x| (0..SIDE).map(move |y| (x, y)))
        .filter(|&(x, y)| !data_map.is_reserved(x, y))
        .count();
    let total_bits = non_reserved * bits_per_module;
    let pg = (total_bits / wr as usize) * wr as usize;
    let pn = pg * (wr - wc) as usize / wr as usize;
    assert!(
        message_bits.len() <= pn,
        "message ({} bits) must fit the symbol's {pn}-bit capacity",
        message_bits.len(),
    );

    let mut info = vec![0u8; pn];
    info[..message_bits.len()].copy_from_slice(message_bits);

    let code = LdpcCode::build(wc, wr, pg).unwrap();
    let mut codeword = code.encode(&info);
    interleave(&mut codeword, wr as usize);

    let mut color_indices = vec![0u8; SIDE * SIDE];
    let mut cursor = 0usize;
    for x in 0..SIDE {
        for y in 0..SIDE {
            if data_map.is_reserved(x, y) {
                continue;
            }
            let mut index = 0usize;
            for &bit in &codeword[cursor..cursor + bits_per_module] {
                index = (index << 1) | bit as usize;
            }
            color_indices[y * SIDE + x] = index as u8;
            cursor += bits_per_module;
        }
    }

    mask::apply(&mut color_indices, data_map.as_slice(), SIDE, SIDE, metadata.mask_type, color_count);

    for x in 0..SIDE {
        for y in 0..SIDE {
            if data_map.is_reserved(x, y) {
                continue;
            }
            let (r, g, b) = palette0.rgb(color_indices[y * SIDE + x] as usize);
            matrix.set_pixel(x, y, Rgb::new(r, g, b));
        }
    }

    matrix
}

fn text_bits(values: &[(u32, usize)]) -> Vec<u8> {
    let mut bits = Vec::new();
    for &(value, width) in values {
        for i in (0..width).rev() {
            bits.push(((value >> i) & 1) as u8);
        }
    }
    bits
}

#[test]
fn scenario1_hello_upper_mode_master_symbol_decodes() {
    // 21x21 master, K=4, mask=0, ecl=(3,4), "HELLO" in Upper mode, then a
    // shift to Lower (value 28) purely to reach Lower's value=31/sub=3
    // end-of-message trigger.
    let mut bits = text_bits(&[(8, 5), (5, 5), (12, 5), (12, 5), (15, 5)]);
    bits.extend(text_bits(&[(28, 5), (31, 5), (3, 2)]));

    let matrix = build_master_symbol(4, 0, 3, 4, &bits);
    let decoded = decode_master(&matrix).unwrap();
    assert_eq!(decoded.data, vec![72, 69, 76, 76, 79]);
}

#[test]
fn scenario2_ab1_upper_lower_numeric_master_symbol_decodes() {
    // 21x21 master, K=8, mask=3, "Ab1" across Upper/Lower/Numeric: 'A' in
    // Upper (value 1), Upper's value 28 persistently switches to Lower,
    // 'b' in Lower (value 2), Lower's value 29 persistently switches to
    // Numeric, '1' in Numeric (value 1), then Numeric's value=15/sub=3
    // persistently switches to Lower purely to reach its end-of-message
    // trigger.
    let mut bits = text_bits(&[(1, 5), (28, 5), (2, 5), (29, 5), (1, 4)]);
    bits.extend(text_bits(&[(15, 4), (3, 2)])); // Numeric -> Lower
    bits.extend(text_bits(&[(31, 5), (3, 2)])); // Lower end of message

    let matrix = build_master_symbol(8, 3, 3, 4, &bits);
    let decoded = decode_master(&matrix).unwrap();
    assert_eq!(decoded.data, vec![b'A', b'b', b'1']);
}

#[test]
fn scenario5_byte_mode_length_prefixed_run_decodes() {
    // Upper's value 31/sub 0 switches to Byte; length prefix 3, payload
    // 0x414243; Byte reverts to Upper, which shifts to Lower (value 28)
    // purely to reach Lower's end-of-message trigger.
    let mut bits = text_bits(&[(31, 5), (0, 2), (3, 4)]);
    bits.extend(text_bits(&[(0x41, 8), (0x42, 8), (0x43, 8)]));
    bits.extend(text_bits(&[(28, 5), (31, 5), (3, 2)]));

    let matrix = build_master_symbol(4, 0, 3, 4, &bits);
    let decoded = decode_master(&matrix).unwrap();
    assert_eq!(decoded.data, vec![0x41, 0x42, 0x43]);
}
