//! End-to-end glue: composes the FEC building blocks and the frame
//! model into full on-air frames, each a 2-byte sync word followed by
//! the frame's FEC-coded body.
//!
//! Everything below is pure computation over byte/soft-bit buffers;
//! finding the sync word in a continuous bitstream and handing this
//! module clean frame-aligned buffers is a caller concern (typically a
//! demodulator), not this crate's.

use crate::bert;
use crate::bits::{pack_bits_msb, unpack_bits_msb, SoftBit};
use crate::constants::{SYNC_BERT, SYNC_EOT, SYNC_LSF, SYNC_PACKET, SYNC_STREAM};
use crate::convolutional;
use crate::interleave;
use crate::lich::LichCollector;
use crate::lsf::Lsf;
use crate::packet::{Packet, PacketChunk, PacketReassembler};
use crate::puncture::Schedule;
use crate::randomize;
use crate::stream_frame::StreamFrame;
use crate::viterbi;
use crate::{Error, Result};

/// Bits in an LSF's wire form (30 bytes), convolutionally coded as a
/// single block and P1-punctured to [`crate::stream_frame`]'s 368-bit
/// frame body.
const LSF_INFO_BITS: usize = 30 * 8;
const LSF_CODED_BITS: usize = (LSF_INFO_BITS + convolutional::FLUSH_BITS) * 2;
/// On-air bits of an LSF-only frame body, after the sync word.
pub const LSF_FRAME_BITS: usize = 368;

/// Encodes a full LSF-only on-air frame: sync word + FEC-coded 30-byte
/// LSF, P1-punctured, interleaved, and whitened as a single 368-bit
/// block. Used to transmit an LSF on its own, outside of the per-frame
/// LICH cycling a stream otherwise relies on.
#[must_use]
pub fn encode_lsf_frame(lsf: &Lsf) -> Vec<u8> {
    let info_bits = unpack_bits_msb(&lsf.to_bytes());
    let coded = convolutional::encode(&info_bits);
    debug_assert_eq!(coded.len(), LSF_CODED_BITS);
    let punctured = Schedule::P1.puncture(&coded);
    debug_assert_eq!(punctured.len(), LSF_FRAME_BITS);
    let interleaved = interleave::interleave(&punctured)
        .expect("LSF frame is always exactly 368 bits after P1 puncturing");
    let bytes = pack_bits_msb(&interleaved);
    let whitened = randomize::randomize(&bytes);
    let body = unpack_bits_msb(&whitened)[..LSF_FRAME_BITS].to_vec();
    prefix_sync(SYNC_LSF, &body)
}

/// Decodes a full LSF-only on-air frame body (sync word already
/// stripped by the caller).
///
/// # Errors
/// Returns [`Error::InvalidInput`] if `soft.len() != LSF_FRAME_BITS`,
/// or [`Error::CrcMismatch`] if the decoded LSF fails its own CRC.
pub fn decode_lsf_frame(soft: &[SoftBit]) -> Result<Lsf> {
    if soft.len() != LSF_FRAME_BITS {
        return Err(Error::InvalidInput(format!(
            "LSF frame expects {LSF_FRAME_BITS} soft bits, got {}",
            soft.len()
        )));
    }
    let dewhitened = randomize::randomize_soft(soft);
    let deinterleaved = interleave::deinterleave(&dewhitened)?;
    let depunctured = Schedule::P1.depuncture(&deinterleaved, LSF_CODED_BITS, 128);
    let info_bits = viterbi::decode(&depunctured, LSF_INFO_BITS);
    let bytes = pack_bits_msb(&info_bits);
    let mut lsf_bytes = [0u8; 30];
    lsf_bytes.copy_from_slice(&bytes);
    Lsf::from_bytes(&lsf_bytes)
}

/// Encodes one stream frame for RF, cycling the LICH chunk per
/// [`crate::lich`]'s 6-slot counter (`frame.sequence() % 6`), and
/// prefixes the sync word (`SYNC_EOT` in place of `SYNC_STREAM` on the
/// final frame).
#[must_use]
pub fn encode_stream_frame(lsf: &Lsf, frame: StreamFrame) -> Vec<u8> {
    let counter = (frame.sequence() % 6) as u8;
    let chunk = lsf.chunks()[counter as usize];
    let lich_chunk = crate::lich::encode_chunk(counter, chunk);
    let body = frame.encode_rf(lich_chunk);
    let sync = if frame.is_eot() { SYNC_EOT } else { SYNC_STREAM };
    prefix_sync(sync, &body)
}

/// Accumulates a stream's LICH chunks across frames and hands back the
/// reassembled [`Lsf`] as soon as all six have arrived, without the
/// caller needing a dedicated LSF-only frame.
#[derive(Debug, Clone, Default)]
pub struct StreamReceiver {
    lich: LichCollector,
}

impl StreamReceiver {
    /// A receiver with no LICH chunks accepted yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one stream frame body (sync word already stripped), and
    /// feeds its LICH chunk to the running collector. Returns the
    /// decoded frame, plus the reassembled LSF the moment it becomes
    /// available (at most once per receiver).
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if `soft.len() !=
    /// crate::stream_frame::FRAME_BITS`.
    pub fn accept(&mut self, soft: &[SoftBit]) -> Result<(StreamFrame, Option<Lsf>)> {
        let (frame, lich_soft) = StreamFrame::decode_rf(soft)?;
        self.lich.accept(&lich_soft);
        let lsf = self.lich.try_assemble();
        Ok((frame, lsf))
    }
}

/// Encodes a full packet into its sequence of on-air frames, each sync
/// word + FEC-coded chunk.
#[must_use]
pub fn encode_packet_frames(packet: &Packet) -> Vec<Vec<u8>> {
    packet
        .chunks()
        .into_iter()
        .map(|chunk| prefix_sync(SYNC_PACKET, &Packet::encode_chunk_rf(chunk)))
        .collect()
}

/// Accumulates packet chunks (sync word already stripped from each
/// frame) across a receive session.
#[derive(Debug, Clone, Default)]
pub struct PacketReceiver {
    reassembler: PacketReassembler,
}

impl PacketReceiver {
    /// A receiver with no chunks accepted yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one packet chunk frame body and accepts it into the
    /// running reassembly.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if `soft.len() !=
    /// crate::packet::CHUNK_RF_BITS`.
    pub fn accept(&mut self, soft: &[SoftBit]) -> Result<()> {
        let chunk: PacketChunk = Packet::decode_chunk_rf(soft)?;
        self.reassembler.accept(chunk);
        Ok(())
    }

    /// Assembles the accepted chunks into a [`Packet`], per
    /// [`PacketReassembler::try_assemble`].
    ///
    /// # Errors
    /// See [`PacketReassembler::try_assemble`].
    pub fn try_assemble(&self) -> Result<Packet> {
        self.reassembler.try_assemble()
    }
}

/// Encodes a full on-air BERT frame: sync word + whitened PRBS9
/// sequence (see [`crate::bert`] for why this frame type skips
/// convolutional coding).
#[must_use]
pub fn encode_bert_frame() -> Vec<u8> {
    prefix_sync(SYNC_BERT, &bert::encode_for_rf())
}

/// Decodes a BERT frame body (sync word already stripped) back to its
/// raw PRBS9 bits.
#[must_use]
pub fn decode_bert_frame(received: &[u8]) -> Vec<u8> {
    bert::decode_from_rf(received)
}

fn prefix_sync(sync: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + body.len());
    out.extend_from_slice(&sync.to_be_bytes());
    out.extend_from_slice(body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::constants::ProtocolId;

    fn sample_lsf() -> Lsf {
        Lsf::new(
            Address::from_callsign("W2FBI").unwrap(),
            Address::from_callsign("N0CALL").unwrap(),
            0x1234,
        )
    }

    #[test]
    fn lsf_frame_round_trip_clean_channel() {
        let lsf = sample_lsf();
        let frame = encode_lsf_frame(&lsf);
        assert_eq!(frame.len(), 2 + LSF_FRAME_BITS);
        assert_eq!(
            u16::from_be_bytes([frame[0], frame[1]]),
            SYNC_LSF
        );
        let soft: Vec<SoftBit> = frame[2..]
            .iter()
            .map(|&b| if b != 0 { 255 } else { 0 })
            .collect();
        let decoded = decode_lsf_frame(&soft).unwrap();
        assert_eq!(decoded, lsf);
    }

    #[test]
    fn lsf_frame_rejects_wrong_length() {
        assert!(decode_lsf_frame(&[128u8; 12]).is_err());
    }

    #[test]
    fn stream_frame_reassembles_lsf_over_six_frames() {
        let lsf = sample_lsf();
        let mut rx = StreamReceiver::new();
        let mut last_lsf = None;
        for i in 0..6u16 {
            let eot = i == 5;
            let frame = StreamFrame::new(i, [0xAAu8; 16], eot);
            let on_air = encode_stream_frame(&lsf, frame);
            let expected_sync = if eot { SYNC_EOT } else { SYNC_STREAM };
            assert_eq!(u16::from_be_bytes([on_air[0], on_air[1]]), expected_sync);
            let soft: Vec<SoftBit> = on_air[2..]
                .iter()
                .map(|&b| if b != 0 { 255 } else { 0 })
                .collect();
            let (decoded, lsf_maybe) = rx.accept(&soft).unwrap();
            assert_eq!(decoded.sequence(), i);
            if let Some(l) = lsf_maybe {
                last_lsf = Some(l);
            }
        }
        assert_eq!(last_lsf, Some(lsf));
    }

    #[test]
    fn packet_frames_round_trip_through_receiver() {
        let packet = Packet::new(ProtocolId::Aprs, vec![0x11u8; 80]);
        let frames = encode_packet_frames(&packet);
        assert!(frames.len() >= 2);
        let mut rx = PacketReceiver::new();
        for on_air in &frames {
            assert_eq!(
                u16::from_be_bytes([on_air[0], on_air[1]]),
                SYNC_PACKET
            );
            let soft: Vec<SoftBit> = on_air[2..]
                .iter()
                .map(|&b| if b != 0 { 255 } else { 0 })
                .collect();
            rx.accept(&soft).unwrap();
        }
        let assembled = rx.try_assemble().unwrap();
        assert_eq!(assembled.payload, vec![0x11u8; 80]);
    }

    #[test]
    fn bert_frame_round_trip() {
        let frame = encode_bert_frame();
        assert_eq!(
            u16::from_be_bytes([frame[0], frame[1]]),
            SYNC_BERT
        );
        let expected = bert::generate(0x1FF);
        let decoded = decode_bert_frame(&frame[2..]);
        assert_eq!(bert::calculate_ber(&decoded, &expected), 0.0);
    }
}
