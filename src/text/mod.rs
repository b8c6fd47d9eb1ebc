//! The text demultiplexer: a stateful, mode-switching reader that turns
//! the `Pn` information bits the payload pipeline recovers into output
//! bytes, ported from `decodeData`/`readData`.

pub mod tables;

use crate::bit_reader::BitCursor;
use crate::error::{Error, Result};
use tables::character_size;

/// One state of the character decoder. `None` is `decodeData`'s initial
/// `pre_mode`: no transient shift is pending yet.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Upper,
    Lower,
    Numeric,
    Punct,
    Mixed,
    Alphanumeric,
    Byte,
    Eci,
    Fnc1,
    None,
}

/// Decodes `bits` (one `u8` per bit, as produced by the payload pipeline's
/// LDPC decode) into the output byte string. Starts in [`Mode::Upper`]
/// with no pending transient shift, matching `decodeData`'s initial state.
pub fn decode(bits: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = BitCursor::new(bits);
    let mut output = Vec::new();
    let mut mode = Mode::Upper;
    // `None` until a mode sets a transient shift (Punct, or a Byte/Mixed
    // detour reached from Upper/Lower/Numeric/Alphanumeric); a literal
    // character read in the shifted-to mode reverts to it, but it is only
    // cleared back to `None` by a persistent mode switch. This mirrors
    // `decodeData` exactly: `pre_mode` is never reset just for having been
    // consulted once.
    let mut pre_mode = Mode::None;

    loop {
        if cursor.is_exhausted() {
            break;
        }

        if mode == Mode::Eci || mode == Mode::Fnc1 {
            // Reserved: not decoded, the remaining stream is simply
            // consumed and decoding stops here.
            break;
        }
        if mode == Mode::None {
            unreachable!("decode never enters Mode::None");
        }

        if mode == Mode::Byte {
            let Ok(prefix) = cursor.read(4) else {
                return Err(Error::TextTruncated(mode));
            };
            let count = if prefix == 0 {
                let Ok(extended) = cursor.read(13) else {
                    return Err(Error::TextTruncated(mode));
                };
                extended as usize + 16
            } else {
                prefix as usize
            };
            for _ in 0..count {
                let Ok(byte) = cursor.read(8) else {
                    return Err(Error::TextTruncated(mode));
                };
                output.push(byte as u8);
            }
            mode = pre_mode;
            continue;
        }

        let size = character_size(mode);
        let value = match cursor.read(size) {
            Ok(v) => v,
            Err(_) => break,
        };

        match mode {
            Mode::Upper => {
                if value <= 26 {
                    output.push(tables::UPPER_TABLE[value as usize]);
                    if pre_mode != Mode::None {
                        mode = pre_mode;
                    }
                } else {
                    match value {
                        27 => {
                            mode = Mode::Punct;
                            pre_mode = Mode::Upper;
                        }
                        28 => {
                            mode = Mode::Lower;
                            pre_mode = Mode::None;
                        }
                        29 => {
                            mode = Mode::Numeric;
                            pre_mode = Mode::None;
                        }
                        30 => {
                            mode = Mode::Alphanumeric;
                            pre_mode = Mode::None;
                        }
                        31 => {
                            let Ok(sub) = cursor.read(2) else {
                                break;
                            };
                            match sub {
                                0 => {
                                    mode = Mode::Byte;
                                    pre_mode = Mode::Upper;
                                }
                                1 => {
                                    mode = Mode::Mixed;
                                    pre_mode = Mode::Upper;
                                }
                                2 => {
                                    mode = Mode::Eci;
                                    pre_mode = Mode::None;
                                }
                                _ => {
                                    mode = Mode::Fnc1;
                                    pre_mode = Mode::None;
                                }
                            }
                        }
                        _ => unreachable!("5-bit value is fully covered by 0..=31"),
                    }
                }
            }
            Mode::Lower => {
                if value <= 26 {
                    output.push(tables::LOWER_TABLE[value as usize]);
                    if pre_mode != Mode::None {
                        mode = pre_mode;
                    }
                } else {
                    match value {
                        27 => {
                            mode = Mode::Punct;
                            pre_mode = Mode::Lower;
                        }
                        28 => {
                            mode = Mode::Upper;
                            pre_mode = Mode::Lower;
                        }
                        29 => {
                            mode = Mode::Numeric;
                            pre_mode = Mode::None;
                        }
                        30 => {
                            mode = Mode::Alphanumeric;
                            pre_mode = Mode::None;
                        }
                        31 => {
                            let Ok(sub) = cursor.read(2) else {
                                break;
                            };
                            match sub {
                                0 => {
                                    mode = Mode::Byte;
                                    pre_mode = Mode::Lower;
                                }
                                1 => {
                                    mode = Mode::Mixed;
                                    pre_mode = Mode::Lower;
                                }
                                2 => {
                                    mode = Mode::Upper;
                                    pre_mode = Mode::None;
                                }
                                _ => break, // value=31, sub=3: end of message.
                            }
                        }
                        _ => unreachable!("5-bit value is fully covered by 0..=31"),
                    }
                }
            }
            Mode::Numeric => {
                if value <= 12 {
                    output.push(tables::NUMERIC_TABLE[value as usize]);
                    if pre_mode != Mode::None {
                        mode = pre_mode;
                    }
                } else {
                    match value {
                        13 => {
                            mode = Mode::Punct;
                            pre_mode = Mode::Numeric;
                        }
                        14 => {
                            mode = Mode::Upper;
                            pre_mode = Mode::None;
                        }
                        15 => {
                            let Ok(sub) = cursor.read(2) else {
                                break;
                            };
                            match sub {
                                0 => {
                                    mode = Mode::Byte;
                                    pre_mode = Mode::Numeric;
                                }
                                1 => {
                                    mode = Mode::Mixed;
                                    pre_mode = Mode::Numeric;
                                }
                                2 => {
                                    mode = Mode::Upper;
                                    pre_mode = Mode::Numeric;
                                }
                                _ => {
                                    mode = Mode::Lower;
                                    pre_mode = Mode::None;
                                }
                            }
                        }
                        _ => unreachable!("4-bit value is fully covered by 0..=15"),
                    }
                }
            }
            Mode::Punct => {
                // A flat table with no reserved values: every 4-bit value
                // decodes directly. Punct is only ever entered via a
                // transient shift, so the mode unconditionally reverts to
                // `pre_mode` once this character is read.
                output.push(tables::PUNCT_TABLE[value as usize]);
                mode = pre_mode;
            }
            Mode::Mixed => {
                match value {
                    19 => output.extend_from_slice(&[10, 13]),
                    20 => output.extend_from_slice(&[b',', b' ']),
                    21 => output.extend_from_slice(&[b'.', b' ']),
                    22 => output.extend_from_slice(&[b':', b' ']),
                    _ => output.push(tables::MIXED_TABLE[value as usize]),
                }
                // Mixed has no reserved values: every 5-bit value is a
                // character, and the mode always reverts after one.
                mode = pre_mode;
            }
            Mode::Alphanumeric => {
                if value <= 62 {
                    output.push(tables::ALPHANUMERIC_TABLE[value as usize]);
                    if pre_mode != Mode::None {
                        mode = pre_mode;
                    }
                } else {
                    let Ok(sub) = cursor.read(2) else {
                        break;
                    };
                    match sub {
                        0 => {
                            mode = Mode::Byte;
                            pre_mode = Mode::Alphanumeric;
                        }
                        1 => {
                            mode = Mode::Mixed;
                            pre_mode = Mode::Alphanumeric;
                        }
                        2 => {
                            mode = Mode::Punct;
                            pre_mode = Mode::Alphanumeric;
                        }
                        _ => {
                            mode = Mode::Upper;
                            pre_mode = Mode::None;
                        }
                    }
                }
            }
            Mode::Byte | Mode::Eci | Mode::Fnc1 | Mode::None => unreachable!("handled above"),
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_from_values(values: &[(u32, usize)]) -> Vec<u8> {
        let mut out = Vec::new();
        for &(value, width) in values {
            for i in (0..width).rev() {
                out.push(((value >> i) & 1) as u8);
            }
        }
        out
    }

    #[test]
    fn decodes_hello_in_upper_mode() {
        // H=8 E=5 L=12 L=12 O=15, each 5 bits, default mode Upper.
        let bits = bits_from_values(&[(8, 5), (5, 5), (12, 5), (12, 5), (15, 5)]);
        let decoded = decode(&bits).unwrap();
        assert_eq!(decoded, vec![72, 69, 76, 76, 79]);
    }

    #[test]
    fn decodes_ab1_across_upper_lower_numeric() {
        // 'A' in Upper (value 1), switch to Lower (28), 'b' in Lower
        // (value 2), switch to Numeric (29), '1' in Numeric (value 1).
        let bits = bits_from_values(&[(1, 5), (28, 5), (2, 5), (29, 5), (1, 4)]);
        let decoded = decode(&bits).unwrap();
        assert_eq!(decoded, vec![b'A', b'b', b'1']);
    }

    #[test]
    fn mixed_mode_value_19_emits_crlf_bytes() {
        // Upper's value 31/sub 1 switches to Mixed; Mixed's value 19.
        let bits = bits_from_values(&[(31, 5), (1, 2), (19, 5)]);
        let decoded = decode(&bits).unwrap();
        assert_eq!(decoded, vec![10, 13]);
    }

    #[test]
    fn byte_mode_reads_length_prefixed_run() {
        // Upper's value 31/sub 0 switches to Byte; length prefix 3, then 3
        // literal bytes 0x41 0x42 0x43.
        let mut bits = bits_from_values(&[(31, 5), (0, 2), (3, 4)]);
        bits.extend(bits_from_values(&[(0x41, 8), (0x42, 8), (0x43, 8)]));
        let decoded = decode(&bits).unwrap();
        assert_eq!(decoded, vec![0x41, 0x42, 0x43]);
    }

    #[test]
    fn byte_mode_zero_prefix_uses_extended_length() {
        let mut bits = bits_from_values(&[(31, 5), (0, 2), (0, 4), (0, 13)]);
        bits.extend(std::iter::repeat(bits_from_values(&[(0x58, 8)])).take(16).flatten());
        let decoded = decode(&bits).unwrap();
        assert_eq!(decoded.len(), 16);
        assert!(decoded.iter().all(|&b| b == 0x58));
    }

    #[test]
    fn truncated_mid_character_returns_partial_output() {
        // A full 'H' then 3 dangling bits, not enough for another
        // character: the decoder returns what it already has rather than
        // erroring.
        let mut bits = bits_from_values(&[(8, 5)]);
        bits.extend_from_slice(&[1, 0, 1]);
        let decoded = decode(&bits).unwrap();
        assert_eq!(decoded, vec![b'H']);
    }

    #[test]
    fn end_of_message_via_lower_value_31_sub_3_stops_cleanly() {
        // Upper's value 28 shifts to Lower, then Lower's value 31/sub 3
        // is the one genuine end-of-message trigger in the whole state
        // machine.
        let mut bits = bits_from_values(&[(28, 5), (31, 5), (3, 2)]);
        bits.extend(bits_from_values(&[(8, 5)]));
        let decoded = decode(&bits).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn byte_truncated_prefix_is_an_error() {
        // Byte mode's own length-prefix read is not a graceful stop: a
        // truncated stream mid-Byte is an error, matching decodeData's
        // `reportError`/`return NULL` on that path.
        let bits = bits_from_values(&[(31, 5), (0, 2)]);
        assert!(decode(&bits).is_err());
    }
}
