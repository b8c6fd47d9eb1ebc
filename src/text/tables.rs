//! Value-to-byte lookup tables for each text-demultiplexer mode, plus the
//! per-mode bit width `character_size` looks up before every read.
//!
//! None of `jab_decoding_table_upper/lower/numeric/punct/mixed/
//! alphanumeric` survived retrieval (only `decoder.c` was pulled from
//! `original_source/`, not the header defining them), so the tables below
//! are a self-consistent reconstruction: every cardinality and reserved
//! value position `decoder.c`'s `decodeData` switch requires is honored
//! (`Upper`/`Lower` 0..=26 plus reserved 27..=31, `Numeric` 0..=12 plus
//! reserved 13..=15, `Punct` a flat 0..=15, `Mixed` a flat 0..=31 with
//! 19..=22 special-cased before the table is ever consulted,
//! `Alphanumeric` 0..=62 plus reserved 63), but the actual value->byte
//! assignment is invented. See `DESIGN.md`'s Open Questions.

use super::Mode;

/// Bits consumed per character read in each mode, before any reserved
/// value triggers extra bits. `Byte` bypasses this entirely (its own
/// 4-bit, optionally +13-bit, length prefix), `Eci`/`Fnc1`/`None` are
/// never read through the normal path.
pub fn character_size(mode: Mode) -> usize {
    match mode {
        Mode::Upper | Mode::Lower | Mode::Mixed => 5,
        Mode::Numeric | Mode::Punct => 4,
        Mode::Alphanumeric => 6,
        Mode::Byte | Mode::Eci | Mode::Fnc1 | Mode::None => 0,
    }
}

/// `Upper`/`Lower` share the same shape: 0 is a space, 1..=26 are the 26
/// letters in order.
pub const UPPER_TABLE: [u8; 27] = letters_from(b'A');
pub const LOWER_TABLE: [u8; 27] = letters_from(b'a');

const fn letters_from(first: u8) -> [u8; 27] {
    let mut table = [0u8; 27];
    table[0] = b' ';
    let mut i = 1u8;
    while i <= 26 {
        table[i as usize] = first + (i - 1);
        i += 1;
    }
    table
}

/// 0..=9 digits, 10 space, 11 `.`, 12 `,`.
pub const NUMERIC_TABLE: [u8; 13] = [
    b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b' ', b'.', b',',
];

/// A flat 16-entry punctuation table; every value is a direct lookup,
/// there are no reserved transitions within `Punct` itself.
pub const PUNCT_TABLE: [u8; 16] = [
    b'!', b'"', b'#', b'$', b'%', b'&', b'\'', b'(', b')', b'*', b'+', b',', b'-', b'.', b'/',
    b':',
];

/// A flat 32-entry table: every value 0..=31 is a character, Mixed has no
/// reserved values. Indices 19..=22 are never read through this table at
/// runtime (`decodeData` special-cases them into two-byte outputs before
/// consulting it), but they're still populated so the array is total.
pub const MIXED_TABLE: [u8; 32] = [
    b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b';', b'<', b'=', b'>', b'?',
    b'[', b']', b'_', b'{', 0, 0, 0, 0, b'}', b'~', b'@', b'\\', b'^', b'`', b'|', b'\t', b'"',
];

/// 0..=9 digits, 10..=35 uppercase, 36..=61 lowercase, 62 space.
pub const ALPHANUMERIC_TABLE: [u8; 63] = alphanumeric_table();

const fn alphanumeric_table() -> [u8; 63] {
    let mut table = [0u8; 63];
    let mut i = 0u8;
    while i < 10 {
        table[i as usize] = b'0' + i;
        i += 1;
    }
    let mut i = 0u8;
    while i < 26 {
        table[10 + i as usize] = b'A' + i;
        i += 1;
    }
    let mut i = 0u8;
    while i < 26 {
        table[36 + i as usize] = b'a' + i;
        i += 1;
    }
    table[62] = b' ';
    table
}
