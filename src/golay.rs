//! Golay(24,12) encode and decode, hard and soft decision.
//!
//! The code is systematic: a 24-bit codeword is the 12 information
//! bits followed by 12 parity bits, `parity = info * B` over GF(2),
//! where `B` is the standard circulant parity matrix for the extended
//! binary Golay code (minimum distance 8, corrects up to 3 errors).
//!
//! Decoding doesn't use a syndrome table: with only 4096 codewords,
//! nearest-codeword search (by Hamming distance for hard decision, by
//! summed soft distance for soft decision) is cheap and trivially
//! correct, and ties break toward the lowest codeword index by
//! construction (first-seen-wins during the linear scan).

use crate::bits::SoftBit;
use crate::{Error, Result};
use std::sync::OnceLock;

/// Parity matrix for the extended (24,12) Golay code, one `u16` (12
/// bits used) per row. Derived from the systematic form of the cyclic
/// (23,12,7) Golay code generated by `g(x) = x^11+x^10+x^6+x^5+x^4+x^2+1`
/// over GF(2)[x]/(x^23-1), extended with an overall parity bit; the
/// resulting `[I12 | B]` code has the Golay weight enumerator
/// (1, 759, 2576, 759, 1 codewords of weight 0/8/12/16/24).
#[rustfmt::skip]
const B: [u16; 12] = [
    0x0ae3, 0x0f92, 0x0d2b, 0x0c76,
    0x0cd9, 0x066d, 0x0337, 0x0b78,
    0x05bc, 0x02de, 0x0b8d, 0x05c7,
];

/// Encodes a 12-bit word into its 24-bit Golay codeword: `info` in the
/// high 12 bits, parity in the low 12.
#[must_use]
pub fn encode(info: u16) -> u32 {
    let info = info & 0x0FFF;
    let mut parity: u16 = 0;
    for (i, &row) in B.iter().enumerate() {
        let bit = (info >> (11 - i)) & 1;
        if bit != 0 {
            parity ^= row;
        }
    }
    (u32::from(info) << 12) | u32::from(parity)
}

/// Splits 48 bits into four 12-bit words and Golay-encodes each into
/// 96 bits total, used to protect one LICH chunk.
#[must_use]
pub fn encode_lich(bits48: u64) -> u128 {
    let mut out: u128 = 0;
    for i in 0..4 {
        let shift = 36 - i * 12;
        let word = ((bits48 >> shift) & 0xFFF) as u16;
        out = (out << 24) | u128::from(encode(word));
    }
    out
}

fn codeword_table() -> &'static [u32; 4096] {
    static TABLE: OnceLock<[u32; 4096]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u32; 4096];
        for (info, slot) in table.iter_mut().enumerate() {
            *slot = encode(info as u16);
        }
        table
    })
}

/// Hard-decision decode: finds the codeword nearest `received` (24
/// bits, in the low bits of the `u32`) by Hamming distance.
///
/// # Errors
/// Returns [`Error::DecodeFailure`] if the nearest codeword is more
/// than 3 bits away (outside the code's correction radius).
pub fn decode(received: u32) -> Result<u16> {
    let table = codeword_table();
    let mut best_info = 0u16;
    let mut best_dist = u32::MAX;
    for (info, &codeword) in table.iter().enumerate() {
        let dist = (codeword ^ received).count_ones();
        if dist < best_dist {
            best_dist = dist;
            best_info = info as u16;
            if dist == 0 {
                break;
            }
        }
    }
    if best_dist <= 3 {
        Ok(best_info)
    } else {
        Err(Error::DecodeFailure(format!(
            "Golay: nearest codeword {best_dist} bits away"
        )))
    }
}

/// Soft-decision decode over 24 soft bits (MSB-first, 0=strong-0,
/// 255=strong-1, 128=erasure). Picks the codeword minimizing summed
/// per-bit distance; ties resolve to the lowest-numbered codeword.
///
/// # Errors
/// Returns [`Error::DecodeFailure`] only if `soft.len() != 24`.
pub fn decode_soft(soft: &[SoftBit]) -> Result<u16> {
    if soft.len() != 24 {
        return Err(Error::DecodeFailure(format!(
            "Golay soft decode expects 24 bits, got {}",
            soft.len()
        )));
    }
    let table = codeword_table();
    let mut best_info = 0u16;
    let mut best_cost: u32 = u32::MAX;
    for (info, &codeword) in table.iter().enumerate() {
        let mut cost: u32 = 0;
        for (i, &s) in soft.iter().enumerate() {
            let bit = (codeword >> (23 - i)) & 1;
            let expected = if bit != 0 { 255 } else { 0 };
            cost += u32::from(s.abs_diff(expected));
        }
        if cost < best_cost {
            best_cost = cost;
            best_info = info as u16;
        }
    }
    Ok(best_info)
}
