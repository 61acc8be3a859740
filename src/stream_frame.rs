//! Stream frames: the 2-byte frame number + 16-byte payload carried
//! over RF alongside one LICH chunk.
//!
//! The on-air frame body is a fixed 368 bits: the 96-bit Golay-encoded
//! LICH chunk (already FEC-protected on its own, untouched by the
//! convolutional coder) concatenated with the 272 bits the stream
//! payload reduces to after K=5 convolutional coding and P2
//! puncturing. The combined 368 bits are interleaved and whitened as
//! one block, matching the fixed-size contract of [`crate::interleave`].

use crate::bits::{pack_bits_msb, unpack_bits_msb, SoftBit};
use crate::convolutional;
use crate::interleave;
use crate::puncture::Schedule;
use crate::randomize;
use crate::viterbi;
use crate::{Error, Result};

/// Number of coded bits the 18-byte payload produces (144 info + 4
/// flush bits, rate 1/2).
const CODED_BITS: usize = (18 * 8 + convolutional::FLUSH_BITS) * 2;
/// Payload bits remaining after P2 puncturing.
const PAYLOAD_RF_BITS: usize = 272;
/// Bits contributed by the (already Golay-encoded) LICH chunk.
const LICH_BITS: usize = 96;
/// Total on-air frame body: LICH chunk + punctured payload.
pub const FRAME_BITS: usize = LICH_BITS + PAYLOAD_RF_BITS;

/// One stream frame: the highest bit of `frame_number` is the
/// end-of-transmission flag, the low 15 bits are a sequence number
/// modulo 2^15.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamFrame {
    /// Packed frame number: bit 15 = EOT, bits 14..0 = sequence.
    pub frame_number: u16,
    /// 16 bytes of opaque stream payload.
    pub payload: [u8; 16],
}

impl StreamFrame {
    /// Builds a stream frame.
    #[must_use]
    pub fn new(sequence: u16, payload: [u8; 16], eot: bool) -> Self {
        let frame_number = (u16::from(eot) << 15) | (sequence & 0x7FFF);
        Self {
            frame_number,
            payload,
        }
    }

    /// Whether this is the final frame of the transmission.
    #[must_use]
    pub fn is_eot(&self) -> bool {
        self.frame_number & 0x8000 != 0
    }

    /// The sequence number, masked to its 15-bit range.
    #[must_use]
    pub fn sequence(&self) -> u16 {
        self.frame_number & 0x7FFF
    }

    fn to_bits(self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(18);
        bytes.extend_from_slice(&self.frame_number.to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        unpack_bits_msb(&bytes)
    }

    /// Encodes this frame for RF: convolutional code and P2 puncture
    /// the payload, prepend the 96-bit Golay-encoded `lich_chunk`
    /// verbatim, then QPP-interleave and whiten the combined 368
    /// bits. Output is [`FRAME_BITS`] hard bits (0/1).
    #[must_use]
    pub fn encode_rf(self, lich_chunk: u128) -> Vec<u8> {
        let info_bits = self.to_bits();
        let coded = convolutional::encode(&info_bits);
        debug_assert_eq!(coded.len(), CODED_BITS);
        let punctured = Schedule::P2.puncture(&coded);
        debug_assert_eq!(punctured.len(), PAYLOAD_RF_BITS);

        let mut body = Vec::with_capacity(FRAME_BITS);
        for i in 0..LICH_BITS {
            body.push(((lich_chunk >> (LICH_BITS - 1 - i)) & 1) as u8);
        }
        body.extend_from_slice(&punctured);

        let interleaved = interleave::interleave(&body)
            .expect("stream frame body is always exactly 368 bits by construction");
        let bytes = pack_bits_msb(&interleaved);
        let whitened = randomize::randomize(&bytes);
        unpack_bits_msb(&whitened)[..FRAME_BITS].to_vec()
    }

    /// Decodes [`FRAME_BITS`] soft bits back into a stream frame and
    /// the 96 raw (still Golay-encoded) soft bits of the LICH chunk,
    /// for the caller to feed to a [`crate::lich::LichCollector`].
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if `soft.len() != FRAME_BITS`.
    pub fn decode_rf(soft: &[SoftBit]) -> Result<(Self, Vec<SoftBit>)> {
        if soft.len() != FRAME_BITS {
            return Err(Error::InvalidInput(format!(
                "stream frame expects {FRAME_BITS} soft bits, got {}",
                soft.len()
            )));
        }
        let dewhitened = randomize::randomize_soft(soft);
        let deinterleaved = interleave::deinterleave(&dewhitened)?;

        let lich_soft = deinterleaved[..LICH_BITS].to_vec();
        let depunctured =
            Schedule::P2.depuncture(&deinterleaved[LICH_BITS..], CODED_BITS, 128);
        let info_bits = viterbi::decode(&depunctured, 18 * 8);
        let info_bytes = pack_bits_msb(&info_bits);
        let frame_number = u16::from_be_bytes([info_bytes[0], info_bytes[1]]);
        let mut payload = [0u8; 16];
        payload.copy_from_slice(&info_bytes[2..18]);
        Ok((
            Self {
                frame_number,
                payload,
            },
            lich_soft,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lich;

    #[test]
    fn round_trip_clean_channel() {
        let frame = StreamFrame::new(42, [0xAB; 16], false);
        let lich_chunk = lich::encode_chunk(2, 0x1234_5678_90);
        let rf = frame.encode_rf(lich_chunk);
        assert_eq!(rf.len(), FRAME_BITS);
        let soft: Vec<SoftBit> = rf.iter().map(|&b| if b != 0 { 255 } else { 0 }).collect();
        let (decoded, lich_soft) = StreamFrame::decode_rf(&soft).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(lich_soft.len(), LICH_BITS);
    }

    #[test]
    fn eot_flag_round_trips() {
        let frame = StreamFrame::new(1, [0u8; 16], true);
        assert!(frame.is_eot());
        let lich_chunk = lich::encode_chunk(0, 0);
        let rf = frame.encode_rf(lich_chunk);
        let soft: Vec<SoftBit> = rf.iter().map(|&b| if b != 0 { 255 } else { 0 }).collect();
        let (decoded, _) = StreamFrame::decode_rf(&soft).unwrap();
        assert!(decoded.is_eot());
        assert_eq!(decoded.sequence(), 1);
    }

    #[test]
    fn rejects_wrong_length_input() {
        assert!(StreamFrame::decode_rf(&[128u8; 10]).is_err());
    }

    #[test]
    fn tolerates_light_noise() {
        let frame = StreamFrame::new(7, [0x5A; 16], false);
        let lich_chunk = lich::encode_chunk(5, 0xABCDEF0123);
        let rf = frame.encode_rf(lich_chunk);
        let mut soft: Vec<SoftBit> = rf.iter().map(|&b| if b != 0 { 255 } else { 0 }).collect();
        soft[120] = 180;
        soft[200] = 90;
        let (decoded, _) = StreamFrame::decode_rf(&soft).unwrap();
        assert_eq!(decoded, frame);
    }
}
