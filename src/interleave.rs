//! The bit interleaver protecting the payload codeword against burst
//! errors. `original_source/decoder.c` calls `deinterleaveData` as an
//! already-implemented collaborator (declared in a header that was not
//! retrieved); this module supplies a concrete, self-consistent inverse
//! permutation, documented as reconstructed in `DESIGN.md`.
//!
//! The scheme: the encoder writes codeword bits column-major into a
//! `wr`-column matrix (spreading each row's parity-check neighborhood
//! across the transmitted stream), so the decoder's job is to read them
//! back out row-major.

/// Un-interleaves `bits` (and the parallel `reliabilities`) in place.
/// `bits.len()` must be a multiple of `wr`; this is guaranteed by the
/// caller since `Pg` (the truncated gross payload length) is itself
/// `floor(M*(Nc+1)/wr) * wr`.
pub fn deinterleave(bits: &mut [u8], reliabilities: &mut [f32], wr: usize) {
    assert_eq!(bits.len(), reliabilities.len());
    assert_eq!(bits.len() % wr, 0);
    if wr == 0 {
        return;
    }
    let rows = bits.len() / wr;
    let src_bits = bits.to_vec();
    let src_rel = reliabilities.to_vec();
    for col in 0..wr {
        for row in 0..rows {
            let interleaved_index = col * rows + row;
            let original_index = row * wr + col;
            bits[original_index] = src_bits[interleaved_index];
            reliabilities[original_index] = src_rel[interleaved_index];
        }
    }
}

/// The encode-time forward permutation, kept test-only: this crate never
/// produces a symbol, only consumes one, but round-trip tests (and, via
/// the `test-support` feature, whole-symbol integration test fixtures)
/// need a way to build interleaved data.
#[cfg(any(test, feature = "test-support"))]
pub fn interleave(bits: &mut [u8], wr: usize) {
    assert_eq!(bits.len() % wr, 0);
    if wr == 0 {
        return;
    }
    let rows = bits.len() / wr;
    let src = bits.to_vec();
    for row in 0..rows {
        for col in 0..wr {
            let original_index = row * wr + col;
            let interleaved_index = col * rows + row;
            bits[interleaved_index] = src[original_index];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deinterleave_after_interleave_is_identity() {
        let original: Vec<u8> = (0..24u32).map(|i| (i % 2) as u8).collect();
        let mut data = original.clone();
        interleave(&mut data, 4);
        let mut reliabilities = vec![0.0f32; data.len()];
        deinterleave(&mut data, &mut reliabilities, 4);
        assert_eq!(data, original);
    }

    #[test]
    fn single_column_is_already_sorted() {
        let mut data = vec![1u8, 0, 1, 1];
        let mut rel = vec![0.1, 0.2, 0.3, 0.4];
        let original = data.clone();
        let original_rel = rel.clone();
        deinterleave(&mut data, &mut rel, 1);
        assert_eq!(data, original);
        assert_eq!(rel, original_rel);
    }
}
