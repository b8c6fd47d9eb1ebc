use std::fmt::Debug;

use crate::error::{Error, Result};
use crate::util::tracing_wrappers::*;

/// Reads fixed-width, big-endian fields out of an already-unpacked bit
/// array: one `u8` per bit (`0` or `1`), the shape `rawModuleData2RawData`
/// produces once LDPC decoding and deinterleaving are done. Distinct from a
/// packed-byte bitstream reader since nothing upstream of the text
/// demultiplexer deals in packed bytes.
#[derive(Clone)]
pub struct BitCursor<'a> {
    bits: &'a [u8],
    pos: usize,
}

impl Debug for BitCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BitCursor{{ {} bits, pos: {} }}",
            self.bits.len(),
            self.pos
        )
    }
}

impl<'a> BitCursor<'a> {
    /// `bits` must contain only `0`/`1` values; this is a caller invariant,
    /// not re-validated here since every producer in this crate already
    /// guarantees it.
    pub fn new(bits: &'a [u8]) -> Self {
        BitCursor { bits, pos: 0 }
    }

    pub fn total_bits(&self) -> usize {
        self.bits.len()
    }

    pub fn bits_remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    pub fn bit_position(&self) -> usize {
        self.pos
    }

    /// Reads `num` bits without consuming them.
    pub fn peek(&self, num: usize) -> Result<u32> {
        if self.bits_remaining() < num {
            return Err(Error::TextTruncated(crate::text::Mode::None));
        }
        let mut value: u32 = 0;
        for &b in &self.bits[self.pos..self.pos + num] {
            value = (value << 1) | (b as u32 & 1);
        }
        Ok(value)
    }

    pub fn consume(&mut self, num: usize) -> Result<()> {
        if self.bits_remaining() < num {
            return Err(Error::TextTruncated(crate::text::Mode::None));
        }
        self.pos += num;
        Ok(())
    }

    /// Reads and consumes `num` bits, most-significant bit first.
    pub fn read(&mut self, num: usize) -> Result<u32> {
        let value = self.peek(num)?;
        self.consume(num)?;
        trace!(num, value, pos = self.pos, "read bits");
        Ok(value)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.bits.len()
    }
}
