//! Packet mode: a protocol-tagged, CRC-protected payload chunked into
//! 25-byte pieces for RF transmission, plus reassembly on receive.

use crate::bits::{pack_bits_msb, unpack_bits_msb, SoftBit};
use crate::constants::ProtocolId;
use crate::convolutional;
use crate::crc::crc_m17;
use crate::interleave;
use crate::puncture::Schedule;
use crate::randomize;
use crate::viterbi;
use crate::{Error, Result};
use log::debug;

const CHUNK_DATA_LEN: usize = 25;
/// Information bits per packet chunk: 25 data bytes (200 bits) plus 6
/// metadata bits (1 end-of-packet flag + 5-bit counter), not a padded
/// trailing byte.
const CHUNK_INFO_BITS: usize = CHUNK_DATA_LEN * 8 + 6;
const CHUNK_CODED_BITS: usize = (CHUNK_INFO_BITS + convolutional::FLUSH_BITS) * 2;
/// On-air bits per chunk after P3 puncturing.
pub const CHUNK_RF_BITS: usize = 368;

/// One 25-byte slice of a packet's wire bytes, tagged with its
/// position in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketChunk {
    /// Up to 25 bytes of packet data, zero-padded past `len` on a
    /// non-final chunk or past the final chunk's valid byte count.
    pub data: [u8; CHUNK_DATA_LEN],
    /// True on the last chunk of the packet.
    pub is_end: bool,
    /// 0-based chunk index (0..=31) on a non-final chunk; on the
    /// final chunk, the count of valid bytes in `data` (1..=25).
    pub counter: u8,
}

impl PacketChunk {
    fn to_info_bits(self) -> Vec<u8> {
        let mut bits = unpack_bits_msb(&self.data);
        bits.push(u8::from(self.is_end));
        for i in 0..5 {
            bits.push((self.counter >> (4 - i)) & 1);
        }
        bits
    }

    fn from_info_bits(bits: &[u8]) -> Self {
        debug_assert_eq!(bits.len(), CHUNK_INFO_BITS);
        let data_bytes = pack_bits_msb(&bits[..CHUNK_DATA_LEN * 8]);
        let mut data = [0u8; CHUNK_DATA_LEN];
        data.copy_from_slice(&data_bytes);
        let is_end = bits[CHUNK_DATA_LEN * 8] != 0;
        let mut counter = 0u8;
        for &b in &bits[CHUNK_DATA_LEN * 8 + 1..] {
            counter = (counter << 1) | (b & 1);
        }
        Self {
            data,
            is_end,
            counter,
        }
    }
}

/// A complete packet: protocol identifier, payload, and the CRC-16
/// computed over `[protocol_id] ++ payload`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Packet {
    /// Payload protocol identifier.
    pub protocol_id: ProtocolId,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
}

impl Packet {
    /// Builds a packet from its protocol identifier and payload.
    #[must_use]
    pub fn new(protocol_id: ProtocolId, payload: Vec<u8>) -> Self {
        Self {
            protocol_id,
            payload,
        }
    }

    fn framed_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.payload.len() + 2);
        out.push(self.protocol_id.to_byte());
        out.extend_from_slice(&self.payload);
        let crc = crc_m17(&out);
        out.extend_from_slice(&crc.to_be_bytes());
        out
    }

    /// Splits the packet (protocol ID + payload + CRC) into 25-byte
    /// chunks. The final chunk's `counter` holds the number of valid
    /// data bytes it carries (1..=25) instead of a sequence index.
    ///
    /// # Panics
    /// Panics if the framed packet needs more than 32 chunks (more
    /// than 800 bytes of protocol-ID + payload + CRC).
    #[must_use]
    pub fn chunks(&self) -> Vec<PacketChunk> {
        let framed = self.framed_bytes();
        let total = framed.len().div_ceil(CHUNK_DATA_LEN).max(1);
        assert!(total <= 32, "packet needs more than 32 chunks");
        framed
            .chunks(CHUNK_DATA_LEN)
            .enumerate()
            .map(|(i, raw)| {
                let is_end = i + 1 == total;
                let mut data = [0u8; CHUNK_DATA_LEN];
                data[..raw.len()].copy_from_slice(raw);
                let counter = if is_end { raw.len() as u8 } else { i as u8 };
                PacketChunk {
                    data,
                    is_end,
                    counter,
                }
            })
            .collect()
    }

    /// FEC-encodes one chunk for RF: convolutional code, P3 puncture,
    /// QPP interleave, whiten.
    #[must_use]
    pub fn encode_chunk_rf(chunk: PacketChunk) -> Vec<u8> {
        let info_bits = chunk.to_info_bits();
        debug_assert_eq!(info_bits.len(), CHUNK_INFO_BITS);
        let coded = convolutional::encode(&info_bits);
        debug_assert_eq!(coded.len(), CHUNK_CODED_BITS);
        let punctured = Schedule::P3.puncture(&coded);
        debug_assert_eq!(punctured.len(), CHUNK_RF_BITS);
        let interleaved = interleave::interleave(&punctured)
            .expect("packet chunk is always exactly 368 bits after P3 puncturing");
        let bytes = pack_bits_msb(&interleaved);
        let whitened = randomize::randomize(&bytes);
        unpack_bits_msb(&whitened)[..CHUNK_RF_BITS].to_vec()
    }

    /// Decodes one RF chunk back into its structured form.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if `soft.len() != CHUNK_RF_BITS`.
    pub fn decode_chunk_rf(soft: &[SoftBit]) -> Result<PacketChunk> {
        if soft.len() != CHUNK_RF_BITS {
            return Err(Error::InvalidInput(format!(
                "packet chunk expects {CHUNK_RF_BITS} soft bits, got {}",
                soft.len()
            )));
        }
        let dewhitened = randomize::randomize_soft(soft);
        let deinterleaved = interleave::deinterleave(&dewhitened)?;
        let depunctured = Schedule::P3.depuncture(&deinterleaved, CHUNK_CODED_BITS, 128);
        let info_bits = viterbi::decode(&depunctured, CHUNK_INFO_BITS);
        Ok(PacketChunk::from_info_bits(&info_bits))
    }
}

/// Reassembles packet chunks received in any order into a validated
/// [`Packet`].
#[derive(Debug, Clone, Default)]
pub struct PacketReassembler {
    chunks: std::collections::BTreeMap<u8, Vec<u8>>,
    end_received: bool,
}

const END_KEY: u8 = u8::MAX;

impl PacketReassembler {
    /// A reassembler with no chunks accepted yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts one decoded chunk. Rejects (logs, drops) a chunk whose
    /// slot was already filled with different content.
    pub fn accept(&mut self, chunk: PacketChunk) {
        let key = if chunk.is_end { END_KEY } else { chunk.counter };
        let data = if chunk.is_end {
            let len = (chunk.counter as usize).min(CHUNK_DATA_LEN);
            chunk.data[..len].to_vec()
        } else {
            chunk.data.to_vec()
        };
        if let Some(existing) = self.chunks.get(&key) {
            if existing != &data {
                debug!("packet chunk {key} rejected: conflicts with previously accepted data");
                return;
            }
        }
        self.chunks.insert(key, data);
        if chunk.is_end {
            self.end_received = true;
        }
    }

    /// Assembles the accepted chunks into a packet once the
    /// end-of-packet chunk has arrived and no gaps remain before it;
    /// verifies the trailing CRC before returning.
    ///
    /// # Errors
    /// Returns [`Error::ReassemblyError`] if the end chunk hasn't
    /// arrived yet or a middle chunk is missing, and
    /// [`Error::CrcMismatch`] if the assembled bytes fail CRC.
    pub fn try_assemble(&self) -> Result<Packet> {
        if !self.end_received {
            return Err(Error::ReassemblyError(
                "end-of-packet chunk not yet received".into(),
            ));
        }
        let expected_middle = self.chunks.keys().filter(|&&k| k != END_KEY).count();
        let mut ordered = Vec::new();
        let mut next = 0u8;
        while let Some(data) = self.chunks.get(&next) {
            ordered.extend_from_slice(data);
            next += 1;
        }
        if next as usize != expected_middle {
            return Err(Error::ReassemblyError(format!(
                "missing packet chunk(s): have {next} contiguous of {expected_middle} received"
            )));
        }
        let last = self
            .chunks
            .get(&END_KEY)
            .expect("end_received implies the end chunk is present");
        ordered.extend_from_slice(last);
        if ordered.len() < 3 {
            return Err(Error::ReassemblyError(
                "reassembled packet too short for CRC".into(),
            ));
        }
        let (body, crc_bytes) = ordered.split_at(ordered.len() - 2);
        let expected = u16::from_be_bytes([crc_bytes[0], crc_bytes[1]]);
        let got = crc_m17(body);
        if expected != got {
            return Err(Error::CrcMismatch { expected, got });
        }
        let protocol_id = ProtocolId::from_byte(body[0]);
        Ok(Packet::new(protocol_id, body[1..].to_vec()))
    }
}

/// Two-Line Element set, encoded as a raw [`Packet`] with
/// `protocol_id = TLE`: a fixed-width name plus two 69-character
/// orbital element lines, space-padded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlePacket {
    /// Satellite name, normalized to 24 bytes (truncated or
    /// space-padded).
    pub name: String,
    /// First element line, normalized to 69 bytes.
    pub line1: String,
    /// Second element line, normalized to 69 bytes.
    pub line2: String,
}

const TLE_NAME_LEN: usize = 24;
const TLE_LINE_LEN: usize = 69;

impl TlePacket {
    /// Encodes as a [`Packet`], truncating or space-padding each field
    /// to its fixed width.
    #[must_use]
    pub fn to_packet(&self) -> Packet {
        let mut payload = Vec::with_capacity(TLE_NAME_LEN + 2 * TLE_LINE_LEN);
        payload.extend_from_slice(&pad_or_truncate(&self.name, TLE_NAME_LEN));
        payload.extend_from_slice(&pad_or_truncate(&self.line1, TLE_LINE_LEN));
        payload.extend_from_slice(&pad_or_truncate(&self.line2, TLE_LINE_LEN));
        Packet::new(ProtocolId::Tle, payload)
    }

    /// Parses a TLE packet, rejecting payloads whose length doesn't
    /// match the fixed-width layout.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if `packet.payload.len() !=
    /// 24 + 69 + 69`.
    pub fn from_packet(packet: &Packet) -> Result<Self> {
        let expected_len = TLE_NAME_LEN + 2 * TLE_LINE_LEN;
        if packet.payload.len() != expected_len {
            debug!(
                "TLE packet rejected: expected {expected_len} bytes, got {}",
                packet.payload.len()
            );
            return Err(Error::InvalidInput(format!(
                "TLE packet expects {expected_len} bytes, got {}",
                packet.payload.len()
            )));
        }
        let name = String::from_utf8_lossy(&packet.payload[0..TLE_NAME_LEN])
            .trim_end()
            .to_string();
        let line1 = String::from_utf8_lossy(&packet.payload[TLE_NAME_LEN..TLE_NAME_LEN + TLE_LINE_LEN])
            .trim_end()
            .to_string();
        let line2 = String::from_utf8_lossy(
            &packet.payload[TLE_NAME_LEN + TLE_LINE_LEN..TLE_NAME_LEN + 2 * TLE_LINE_LEN],
        )
        .trim_end()
        .to_string();
        Ok(Self { name, line1, line2 })
    }
}

fn pad_or_truncate(s: &str, width: usize) -> Vec<u8> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.truncate(width);
    bytes.resize(width, b' ');
    bytes
}
