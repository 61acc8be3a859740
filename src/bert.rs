//! BERT (Bit Error Rate Test) frames: a fixed PRBS9 bit pattern sent
//! in place of real traffic so two stations can measure link quality
//! against a known-good reference.
//!
//! The PRBS bits are whitened but not convolutionally coded or
//! interleaved: unlike the other frame types, a BERT frame exists to
//! expose the channel's raw bit error rate, which FEC would mask. See
//! `DESIGN.md` for why this diverges from the other frame types'
//! conv+puncture+interleave pipeline.

use crate::bits::SoftBit;
use crate::randomize;

/// Length of the PRBS9 test sequence.
pub const PRBS_LEN: usize = 197;
/// LFSR seed: all-ones, per the PRBS9 reference sequence.
const SEED: u16 = 0x1FF;

/// Generates the 197-bit PRBS9 test sequence from an `x^9 + x^5 + 1`
/// Fibonacci LFSR started at `seed`.
#[must_use]
pub fn generate(seed: u16) -> Vec<u8> {
    let mut state = seed & 0x1FF;
    let mut bits = Vec::with_capacity(PRBS_LEN);
    for _ in 0..PRBS_LEN {
        let out = state & 1;
        bits.push(out as u8);
        let feedback = (state & 1) ^ ((state >> 4) & 1);
        state = (state >> 1) | (feedback << 8);
    }
    bits
}

/// Encodes the 197-bit PRBS9 sequence (seeded with [`SEED`]) for RF:
/// whiten, packed MSB-first.
#[must_use]
pub fn encode_for_rf() -> Vec<u8> {
    let bits = generate(SEED);
    let bytes = crate::bits::pack_bits_msb(&bits);
    let whitened = randomize::randomize(&bytes);
    crate::bits::unpack_bits_msb(&whitened)[..PRBS_LEN].to_vec()
}

/// Decodes a received BERT frame body (hard bits, already whitened on
/// the wire) back to its 197 raw bits.
#[must_use]
pub fn decode_from_rf(received: &[u8]) -> Vec<u8> {
    let bytes = crate::bits::pack_bits_msb(received);
    let dewhitened = randomize::randomize(&bytes);
    crate::bits::unpack_bits_msb(&dewhitened)[..PRBS_LEN].to_vec()
}

/// Fraction of bits in `received` that differ from `expected`
/// (0.0 = identical, 1.0 = every bit differs).
///
/// # Panics
/// Panics if the two slices have different lengths or either is
/// empty.
#[must_use]
pub fn calculate_ber(received: &[u8], expected: &[u8]) -> f32 {
    assert_eq!(received.len(), expected.len(), "BER slices must match in length");
    assert!(!received.is_empty(), "BER of empty slices is undefined");
    let errors = received
        .iter()
        .zip(expected)
        .filter(|(&r, &e)| r != e)
        .count();
    errors as f32 / received.len() as f32
}

/// Soft-decides `soft` (0=strong-0, 255=strong-1) to hard bits using
/// [`crate::bits::soft_to_hard`] before computing BER against
/// `expected`. Convenience wrapper so callers holding a soft-bit
/// receiver sample don't need a separate hard-decision pass.
#[must_use]
pub fn calculate_ber_soft(received_soft: &[SoftBit], expected: &[u8]) -> f32 {
    let hard = crate::bits::soft_slice_to_hard(received_soft);
    calculate_ber(&hard, expected)
}
