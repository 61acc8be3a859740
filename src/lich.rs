//! LICH: the Link Information Channel carried alongside every stream
//! frame, one Golay-protected 40-bit LSF chunk per frame, cycling
//! through a 3-bit counter so a receiver can reassemble the LSF over
//! six consecutive frames without ever seeing a dedicated setup frame.

use crate::bits::SoftBit;
use crate::golay;
use crate::lsf::Lsf;
use log::debug;

const SLOTS: usize = 6;

/// Golay-encodes one LICH chunk into a 48-bit unit split into four
/// 12-bit Golay(24,12) words (96 bits total): a 3-bit counter (0..=5),
/// 5 reserved zero bits, then the chunk's 40 data bits.
#[must_use]
pub fn encode_chunk(counter: u8, chunk: u64) -> u128 {
    debug_assert!(counter < 6);
    let unit = (u64::from(counter & 0b111) << 45) | (chunk & 0xFF_FFFF_FFFF);
    golay::encode_lich(unit)
}

/// One slot of the collector: the last-accepted 40-bit chunk and the
/// soft-decode cost it was accepted with (lower is better), used to
/// decide whether a later chunk for the same counter should overwrite
/// it.
#[derive(Debug, Clone, Copy)]
struct Slot {
    chunk: u64,
    cost: u32,
}

/// Accumulates the six LICH chunks of one in-progress stream and
/// assembles them into an [`Lsf`] once all six are present and the
/// LSF's own CRC verifies.
///
/// One collector is scoped to a single incoming stream; concurrent
/// streams need separate collectors, and a collector has no notion of
/// timeout — callers abandon it when the stream ends.
#[derive(Debug, Clone, Default)]
pub struct LichCollector {
    slots: [Option<Slot>; SLOTS],
}

impl LichCollector {
    /// A collector with no chunks accepted yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a raw 96-bit Golay-protected LICH unit, decoding the
    /// counter and chunk with soft-decision Golay decoding. Chunks
    /// that fail to decode any of their four Golay words are dropped
    /// silently (logged at debug level); a decodable chunk overwrites
    /// its slot only if no chunk has been accepted for that counter
    /// yet, or the new one has a lower (better) soft-decode cost.
    pub fn accept(&mut self, soft96: &[SoftBit]) {
        debug_assert_eq!(soft96.len(), 96);
        let mut words = [0u16; 4];
        let mut total_cost = 0u32;
        for i in 0..4 {
            match golay::decode_soft(&soft96[i * 24..i * 24 + 24]) {
                Ok(w) => {
                    words[i] = w;
                    total_cost += soft_cost(&soft96[i * 24..i * 24 + 24], w);
                }
                Err(e) => {
                    debug!("LICH chunk dropped: Golay word {i} failed to decode: {e}");
                    return;
                }
            }
        }
        let unit = (u64::from(words[0]) << 36)
            | (u64::from(words[1]) << 24)
            | (u64::from(words[2]) << 12)
            | u64::from(words[3]);
        let counter = ((unit >> 45) & 0b111) as usize;
        let chunk = unit & 0xFF_FFFF_FFFF;
        if counter >= SLOTS {
            debug!("LICH chunk dropped: counter {counter} out of range");
            return;
        }
        let better = match self.slots[counter] {
            None => true,
            Some(existing) => total_cost < existing.cost,
        };
        if better {
            self.slots[counter] = Some(Slot {
                chunk,
                cost: total_cost,
            });
        }
    }

    /// True once all six slots hold a chunk.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Assembles the collected chunks into an LSF, returning `None`
    /// until all six slots are filled or if the assembled bytes fail
    /// CRC verification.
    #[must_use]
    pub fn try_assemble(&self) -> Option<Lsf> {
        if !self.is_complete() {
            return None;
        }
        let mut bytes = [0u8; 30];
        for (i, slot) in self.slots.iter().enumerate() {
            let chunk = slot.expect("checked complete above").chunk;
            let chunk_bytes = chunk.to_be_bytes();
            bytes[i * 5..i * 5 + 5].copy_from_slice(&chunk_bytes[3..8]);
        }
        Lsf::from_bytes(&bytes).ok()
    }
}

fn soft_cost(soft: &[SoftBit], decoded: u16) -> u32 {
    let codeword = golay::encode(decoded);
    soft.iter()
        .enumerate()
        .map(|(i, &s)| {
            let bit = (codeword >> (23 - i)) & 1;
            let expected = if bit != 0 { 255 } else { 0 };
            u32::from(s.abs_diff(expected))
        })
        .sum()
}
