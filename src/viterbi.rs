//! Soft-decision Viterbi decoding for the [`crate::convolutional`]
//! trellis: 16 states, full-length traceback (frames here are short
//! enough that a sliding traceback window buys nothing).
//!
//! Branch metrics are the sum of per-bit soft distances (0..=255 each,
//! smaller is better), so path metrics accumulate in a `u32` and the
//! decoder is a minimizing search rather than the more common
//! maximizing correlation metric.

use crate::bits::SoftBit;
use crate::convolutional::{branch_output, FLUSH_BITS};

const STATES: usize = 16;

/// Decodes `soft` (a sequence of soft bit pairs, `2 * (info_len + 4)`
/// entries) back to `info_len` hard information bits, assuming the
/// encoder started and ended in state 0.
///
/// Ties between equally good paths resolve toward the lower-numbered
/// predecessor state, matching the deterministic tie-break of
/// [`crate::golay::decode`].
#[must_use]
pub fn decode(soft: &[SoftBit], info_len: usize) -> Vec<u8> {
    let steps = info_len + FLUSH_BITS;
    assert_eq!(soft.len(), steps * 2, "viterbi: unexpected soft bit count");

    // path_metric[state], updated in place each step.
    let mut metric = [u32::MAX; STATES];
    metric[0] = 0;
    // predecessors[step][state] = (prev_state, bit_emitted)
    let mut predecessors: Vec<[(u8, u8); STATES]> = Vec::with_capacity(steps);

    for step in 0..steps {
        let s0 = soft[2 * step];
        let s1 = soft[2 * step + 1];
        let mut next_metric = [u32::MAX; STATES];
        let mut preds = [(0u8, 0u8); STATES];

        for state in 0..STATES {
            if metric[state] == u32::MAX {
                continue;
            }
            for bit in 0..2u8 {
                let (o0, o1) = branch_output(state as u8, bit);
                let expected0 = if o0 != 0 { 255 } else { 0 };
                let expected1 = if o1 != 0 { 255 } else { 0 };
                let branch_cost =
                    u32::from(s0.abs_diff(expected0)) + u32::from(s1.abs_diff(expected1));
                let cost = metric[state] + branch_cost;
                let next = (((state as u8) << 1) | bit) & 0x0F;
                if cost < next_metric[next as usize] {
                    next_metric[next as usize] = cost;
                    preds[next as usize] = (state as u8, bit);
                }
            }
        }

        metric = next_metric;
        predecessors.push(preds);
    }

    // Trellis is flushed with zero bits, so it must end in state 0.
    let mut state = 0u8;
    let mut bits = vec![0u8; steps];
    for step in (0..steps).rev() {
        let (prev, bit) = predecessors[step][state as usize];
        bits[step] = bit;
        state = prev;
    }
    bits.truncate(info_len);
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convolutional::encode;

    fn to_soft(coded: &[u8]) -> Vec<SoftBit> {
        coded.iter().map(|&b| if b != 0 { 255 } else { 0 }).collect()
    }

    #[test]
    fn decodes_clean_signal() {
        let info = vec![1u8, 0, 1, 1, 0, 1, 0, 0, 1, 1, 1, 0, 0, 1, 0, 1];
        let coded = encode(&info);
        let decoded = decode(&to_soft(&coded), info.len());
        assert_eq!(decoded, info);
    }

    #[test]
    fn corrects_a_single_flipped_soft_bit() {
        let info = vec![1u8, 1, 1, 0, 0, 0, 1, 0, 1, 0];
        let coded = encode(&info);
        let mut soft = to_soft(&coded);
        // Flip one soft bit hard but not all the way to impossible.
        soft[3] = 255 - soft[3];
        let decoded = decode(&soft, info.len());
        assert_eq!(decoded, info);
    }

    #[test]
    fn tolerates_erasures() {
        let info = vec![0u8, 1, 0, 1, 1, 0, 0, 1];
        let coded = encode(&info);
        let mut soft = to_soft(&coded);
        soft[2] = 128;
        soft[9] = 128;
        let decoded = decode(&soft, info.len());
        assert_eq!(decoded, info);
    }

    #[test]
    fn empty_info_decodes_flush_only() {
        let info: Vec<u8> = vec![];
        let coded = encode(&info);
        let decoded = decode(&to_soft(&coded), 0);
        assert!(decoded.is_empty());
    }

    #[test]
    fn corrects_random_single_bit_flips() {
        use rand::Rng;
        let mut rng = rand::rng();
        for _ in 0..50 {
            let info: Vec<u8> = (0..32).map(|_| rng.random_range(0..2)).collect();
            let coded = encode(&info);
            let mut soft = to_soft(&coded);
            let flip = rng.random_range(0..soft.len());
            soft[flip] = 255 - soft[flip];
            let decoded = decode(&soft, info.len());
            assert_eq!(decoded, info);
        }
    }
}
