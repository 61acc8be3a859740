//! Bit/byte packing and the soft-bit representation used by the FEC pipeline.
//!
//! Bits are represented one-per-`u8` (value 0 or 1), MSB-first, the same
//! convention `hdlc_deframer` and `il2p_deframer` use for their bit
//! vectors. Soft bits use the unsigned 8-bit scale from the protocol
//! spec: 0 is a strong zero, 255 is a strong one, and 128 is an erasure
//! (a punctured or otherwise unknown position).

/// A soft bit: 0 = strong 0, 255 = strong 1, 128 = erasure.
pub type SoftBit = u8;

/// Midpoint soft value used for punctured/erased positions.
pub const ERASURE: SoftBit = 128;

/// Hard-decision threshold: soft values `>= HARD_THRESHOLD` decide `1`.
pub const HARD_THRESHOLD: SoftBit = 128;

/// Converts a hard bit (0/1) to its strong soft-bit representation.
#[must_use]
pub fn hard_to_soft(bit: u8) -> SoftBit {
    if bit != 0 { 255 } else { 0 }
}

/// Hard-decides a soft bit using the midpoint threshold.
#[must_use]
pub fn soft_to_hard(soft: SoftBit) -> u8 {
    u8::from(soft >= HARD_THRESHOLD)
}

/// Unpacks a byte slice into MSB-first bits, one bit per output byte.
#[must_use]
pub fn unpack_bits_msb(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for i in 0..8 {
            out.push((byte >> (7 - i)) & 1);
        }
    }
    out
}

/// Packs MSB-first bits (one bit per input byte, value 0/1) into bytes.
///
/// If `bits.len()` isn't a multiple of 8, the final byte is padded with
/// zero bits on the low end.
#[must_use]
pub fn pack_bits_msb(bits: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bits.len().div_ceil(8));
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit & 1) << (7 - i);
        }
        out.push(byte);
    }
    out
}

/// Hard-decides a slice of soft bits into hard bits.
#[must_use]
pub fn soft_slice_to_hard(soft: &[SoftBit]) -> Vec<u8> {
    soft.iter().copied().map(soft_to_hard).collect()
}

/// Converts hard bits (0/1) into strong soft bits.
#[must_use]
pub fn hard_slice_to_soft(bits: &[u8]) -> Vec<SoftBit> {
    bits.iter().copied().map(hard_to_soft).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_round_trip() {
        let bytes = [0x5Au8, 0xC3, 0x00, 0xFF];
        let bits = unpack_bits_msb(&bytes);
        assert_eq!(bits.len(), 32);
        let back = pack_bits_msb(&bits);
        assert_eq!(back, bytes);
    }

    #[test]
    fn msb_first_order() {
        let bits = unpack_bits_msb(&[0b1000_0001]);
        assert_eq!(bits, vec![1, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn partial_byte_padding() {
        let bits = [1u8, 0, 1];
        let packed = pack_bits_msb(&bits);
        assert_eq!(packed, vec![0b1010_0000]);
    }

    #[test]
    fn soft_hard_round_trip() {
        assert_eq!(soft_to_hard(hard_to_soft(0)), 0);
        assert_eq!(soft_to_hard(hard_to_soft(1)), 1);
        assert_eq!(soft_to_hard(ERASURE), 1); // midpoint decides 1 by convention
    }
}
