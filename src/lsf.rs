//! Link Setup Frame: the 30-byte structure that precedes a stream and
//! carries addressing, the TYPE field, and one of several tagged META
//! payloads.

use crate::address::Address;
use crate::crc::crc_m17;
use crate::type_field::{detect_version, parse_v3, MetaKind, Version};
use crate::{Error, Result};
use log::debug;

const META_LEN: usize = 14;

/// A decoded view of the LSF's 14-byte META field, tagged by the
/// v3.0.0 TYPE's META code (legacy v2.0.3 frames carry no META tag
/// and always decode as [`MetaView::Unknown`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetaView {
    /// No META payload (v3 `META = NONE`, or a legacy v2 frame).
    None,
    /// GNSS position report.
    Position {
        /// Source of the position fix.
        data_source: u8,
        /// Station type.
        station_type: u8,
        /// Latitude, signed fixed-point, scale `180 / 2^23` degrees.
        latitude: i32,
        /// Longitude, signed fixed-point, scale `360 / 2^23` degrees.
        longitude: i32,
        /// Altitude in meters above MSL, with a +1500 m bias removed.
        altitude: i16,
        /// Bearing in degrees, 0..=359.
        bearing: u16,
        /// Speed in km/h, capped at 255.
        speed: u8,
    },
    /// Two additional base-40 callsigns.
    ExtendedCallsign {
        /// First additional address.
        call1: Address,
        /// Second additional address.
        call2: Address,
    },
    /// Timestamp + CTR state for scramblers/AES.
    Nonce([u8; 14]),
    /// AES initialization vector (frame number fills the low 2 bytes
    /// on transmit to form the full 16-byte counter).
    AesIv([u8; 14]),
    /// One block of a multi-block text message.
    Text {
        /// Total number of blocks in the message, 1..=15.
        block_count: u8,
        /// This block's index, 0..block_count.
        block_index: u8,
        /// 13 bytes of UTF-8 text, zero-padded past the message end.
        text: [u8; 13],
    },
    /// META tag not recognized by this build.
    Unknown([u8; META_LEN]),
}

/// A Link Setup Frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lsf {
    /// Destination address.
    pub dst: Address,
    /// Source address.
    pub src: Address,
    /// Raw 16-bit TYPE field.
    pub type_field: u16,
    meta: [u8; META_LEN],
}

impl Lsf {
    /// Builds an LSF with an empty (all-zero) META field.
    #[must_use]
    pub fn new(dst: Address, src: Address, type_field: u16) -> Self {
        Self {
            dst,
            src,
            type_field,
            meta: [0; META_LEN],
        }
    }

    /// Sets the META field to a GNSS position report.
    pub fn set_position(
        &mut self,
        data_source: u8,
        station_type: u8,
        latitude: i32,
        longitude: i32,
        altitude: i16,
        bearing: u16,
        speed: u8,
    ) {
        let mut m = [0u8; META_LEN];
        m[0] = data_source;
        m[1] = station_type;
        m[2..5].copy_from_slice(&latitude.to_be_bytes()[1..4]);
        m[5..8].copy_from_slice(&longitude.to_be_bytes()[1..4]);
        let alt = altitude.wrapping_add(1500) as u16;
        m[8..10].copy_from_slice(&alt.to_be_bytes());
        m[10..12].copy_from_slice(&bearing.to_be_bytes());
        m[12] = speed;
        self.meta = m;
    }

    /// Sets the META field to two extended callsigns.
    pub fn set_extended_callsign(&mut self, call1: Address, call2: Address) {
        let mut m = [0u8; META_LEN];
        m[0..6].copy_from_slice(&call1.to_bytes());
        m[6..12].copy_from_slice(&call2.to_bytes());
        self.meta = m;
    }

    /// Sets the META field to a scrambler/AES nonce.
    pub fn set_nonce(&mut self, nonce: [u8; 14]) {
        self.meta = nonce;
    }

    /// Sets the META field to an AES initialization vector.
    pub fn set_aes_iv(&mut self, iv: [u8; 14]) {
        self.meta = iv;
    }

    /// Sets the META field to one block of a multi-block text message.
    ///
    /// # Panics
    /// Panics if `block_count` is 0 or greater than 15, or `block_index
    /// >= block_count`.
    pub fn set_text_block(&mut self, block_count: u8, block_index: u8, text: [u8; 13]) {
        assert!(
            (1..=15).contains(&block_count) && block_index < block_count,
            "text block count/index out of range"
        );
        let mut m = [0u8; META_LEN];
        m[0] = (block_count << 4) | (block_index & 0x0F);
        m[1..14].copy_from_slice(&text);
        self.meta = m;
    }

    /// The raw 14 META bytes.
    #[must_use]
    pub fn meta_bytes(&self) -> [u8; META_LEN] {
        self.meta
    }

    /// Decodes the META field according to the v3.0.0 TYPE's META tag.
    #[must_use]
    pub fn meta_view(&self) -> MetaView {
        if detect_version(self.type_field) != Version::V3 {
            return MetaView::Unknown(self.meta);
        }
        match parse_v3(self.type_field).meta {
            MetaKind::None => MetaView::None,
            MetaKind::Gnss => {
                let mut lat_bytes = [0u8; 4];
                lat_bytes[1..4].copy_from_slice(&self.meta[2..5]);
                let latitude = i32::from_be_bytes(lat_bytes) << 8 >> 8;
                let mut lon_bytes = [0u8; 4];
                lon_bytes[1..4].copy_from_slice(&self.meta[5..8]);
                let longitude = i32::from_be_bytes(lon_bytes) << 8 >> 8;
                let alt = u16::from_be_bytes([self.meta[8], self.meta[9]]);
                MetaView::Position {
                    data_source: self.meta[0],
                    station_type: self.meta[1],
                    latitude,
                    longitude,
                    altitude: (i32::from(alt) - 1500) as i16,
                    bearing: u16::from_be_bytes([self.meta[10], self.meta[11]]),
                    speed: self.meta[12],
                }
            }
            MetaKind::ExtCall => {
                // A 6-byte big-endian value is always within the 48-bit
                // address range, so these conversions cannot fail.
                let call1 = Address::from_bytes(self.meta[0..6].try_into().unwrap())
                    .expect("6 bytes always fit in a 48-bit address");
                let call2 = Address::from_bytes(self.meta[6..12].try_into().unwrap())
                    .expect("6 bytes always fit in a 48-bit address");
                MetaView::ExtendedCallsign { call1, call2 }
            }
            MetaKind::Text => {
                let block_count = self.meta[0] >> 4;
                let block_index = self.meta[0] & 0x0F;
                let mut text = [0u8; 13];
                text.copy_from_slice(&self.meta[1..14]);
                MetaView::Text {
                    block_count,
                    block_index,
                    text,
                }
            }
            MetaKind::AesIv => MetaView::AesIv(self.meta),
            MetaKind::Unknown(_) => MetaView::Unknown(self.meta),
        }
    }

    /// Serializes to the 30-byte wire form: `DST ‖ SRC ‖ TYPE ‖ META ‖
    /// CRC`, the CRC covering the first 28 bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 30] {
        let mut out = [0u8; 30];
        out[0..6].copy_from_slice(&self.dst.to_bytes());
        out[6..12].copy_from_slice(&self.src.to_bytes());
        out[12..14].copy_from_slice(&self.type_field.to_be_bytes());
        out[14..28].copy_from_slice(&self.meta);
        let crc = crc_m17(&out[0..28]);
        out[28..30].copy_from_slice(&crc.to_be_bytes());
        out
    }

    /// Parses the 30-byte wire form.
    ///
    /// # Errors
    /// Returns [`Error::CrcMismatch`] if the trailing CRC doesn't match
    /// the first 28 bytes.
    pub fn from_bytes(bytes: &[u8; 30]) -> Result<Self> {
        let expected = u16::from_be_bytes([bytes[28], bytes[29]]);
        let got = crc_m17(&bytes[0..28]);
        if expected != got {
            return Err(Error::CrcMismatch { expected, got });
        }
        let dst = Address::from_bytes(bytes[0..6].try_into().unwrap())?;
        let src = Address::from_bytes(bytes[6..12].try_into().unwrap())?;
        let type_field = u16::from_be_bytes([bytes[12], bytes[13]]);
        let mut meta = [0u8; META_LEN];
        meta.copy_from_slice(&bytes[14..28]);
        Ok(Self {
            dst,
            src,
            type_field,
            meta,
        })
    }

    /// Splits the 240-bit LSF payload (bytes 0..28, the CRC excluded
    /// per the LICH framing) into 6 chunks of 40 bits each.
    #[must_use]
    pub fn chunks(&self) -> [u64; 6] {
        let bytes = self.to_bytes();
        let mut chunks = [0u64; 6];
        for (i, chunk) in chunks.iter_mut().enumerate() {
            let mut v: u64 = 0;
            for b in &bytes[i * 5..i * 5 + 5] {
                v = (v << 8) | u64::from(*b);
            }
            *chunk = v;
        }
        chunks
    }

    /// Fragments `text` into up to 15 LSFs carrying consecutive text
    /// blocks, splitting on UTF-8 character boundaries so no block
    /// boundary falls inside a multi-byte code point.
    ///
    /// # Panics
    /// Panics if `text` needs more than 15 blocks of 13 bytes (more
    /// than 195 bytes, accounting for boundary padding).
    #[must_use]
    pub fn create_text_message_frames(dst: Address, src: Address, type_field: u16, text: &str) -> Vec<Self> {
        let mut blocks: Vec<[u8; 13]> = Vec::new();
        let bytes = text.as_bytes();
        let mut start = 0;
        while start < bytes.len() {
            let mut end = (start + 13).min(bytes.len());
            while end > start && !text.is_char_boundary(end) {
                end -= 1;
            }
            let mut block = [0u8; 13];
            block[..end - start].copy_from_slice(&bytes[start..end]);
            blocks.push(block);
            start = end;
        }
        if blocks.is_empty() {
            blocks.push([0u8; 13]);
        }
        assert!(blocks.len() <= 15, "text message needs more than 15 blocks");
        let count = blocks.len() as u8;
        blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| {
                let mut lsf = Self::new(dst, src, type_field);
                lsf.set_text_block(count, i as u8, block);
                lsf
            })
            .collect()
    }
}

/// Reassembles a multi-block text message (its blocks accepted in any
/// order, typically one per received LSF) into the original string.
///
/// Missing or out-of-order indices invalidate the collection: a gap
/// before `block_count` blocks have all arrived is reported by
/// [`TextCollector::try_assemble`] rather than silently assembling a
/// truncated message.
#[derive(Debug, Clone, Default)]
pub struct TextCollector {
    blocks: std::collections::BTreeMap<u8, [u8; 13]>,
    block_count: Option<u8>,
}

impl TextCollector {
    /// A collector with no blocks accepted yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts one text block. A block whose `block_count` disagrees
    /// with a previously accepted block's is dropped (logged at debug
    /// level) rather than corrupting the collection.
    pub fn accept(&mut self, block_count: u8, block_index: u8, text: [u8; 13]) {
        match self.block_count {
            Some(existing) if existing != block_count => {
                debug!(
                    "text block {block_index} dropped: block_count {block_count} disagrees with {existing}"
                );
                return;
            }
            _ => self.block_count = Some(block_count),
        }
        self.blocks.insert(block_index, text);
    }

    /// Accepts the `Text` META view of one decoded LSF directly.
    pub fn accept_lsf(&mut self, lsf: &Lsf) {
        if let MetaView::Text {
            block_count,
            block_index,
            text,
        } = lsf.meta_view()
        {
            self.accept(block_count, block_index, text);
        }
    }

    /// Assembles the accepted blocks into the original message, once
    /// every index `0..block_count` has arrived. Trailing zero padding
    /// from the last block is trimmed before UTF-8 decoding.
    ///
    /// # Errors
    /// Returns [`Error::ReassemblyError`] if no blocks have been
    /// accepted yet, a block index is missing, or the reassembled bytes
    /// aren't valid UTF-8.
    pub fn try_assemble(&self) -> Result<String> {
        let Some(block_count) = self.block_count else {
            return Err(Error::ReassemblyError("no text blocks received".into()));
        };
        let mut bytes = Vec::with_capacity(block_count as usize * 13);
        for i in 0..block_count {
            let Some(block) = self.blocks.get(&i) else {
                return Err(Error::ReassemblyError(format!(
                    "missing text block {i} of {block_count}"
                )));
            };
            bytes.extend_from_slice(block);
        }
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        String::from_utf8(bytes[..end].to_vec())
            .map_err(|e| Error::ReassemblyError(format!("text message not valid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_field::{build_v3, Encryption, MetaKind as MK, Payload};

    fn addr(s: &str) -> Address {
        Address::from_callsign(s).unwrap()
    }

    #[test]
    fn round_trip_no_meta() {
        let lsf = Lsf::new(addr("@ALL"), addr("N0CALL"), 0x0001);
        let bytes = lsf.to_bytes();
        let back = Lsf::from_bytes(&bytes).unwrap();
        assert_eq!(back, lsf);
    }

    #[test]
    fn round_trip_position() {
        let type_field = build_v3(Payload::DataOnly, Encryption::None, false, MK::Gnss, 0);
        let mut lsf = Lsf::new(addr("N0CALL"), addr("W2FBI"), type_field);
        lsf.set_position(1, 2, -1_000_000, 2_000_000, 123, 45, 67);
        let bytes = lsf.to_bytes();
        let back = Lsf::from_bytes(&bytes).unwrap();
        match back.meta_view() {
            MetaView::Position {
                data_source,
                station_type,
                latitude,
                longitude,
                altitude,
                bearing,
                speed,
            } => {
                assert_eq!(data_source, 1);
                assert_eq!(station_type, 2);
                assert_eq!(latitude, -1_000_000);
                assert_eq!(longitude, 2_000_000);
                assert_eq!(altitude, 123);
                assert_eq!(bearing, 45);
                assert_eq!(speed, 67);
            }
            other => panic!("expected Position, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_extended_callsign() {
        let type_field = build_v3(Payload::DataOnly, Encryption::None, false, MK::ExtCall, 0);
        let mut lsf = Lsf::new(addr("N0CALL"), addr("W2FBI"), type_field);
        lsf.set_extended_callsign(addr("AA1AA"), addr("BB2BB"));
        let back = Lsf::from_bytes(&lsf.to_bytes()).unwrap();
        match back.meta_view() {
            MetaView::ExtendedCallsign { call1, call2 } => {
                assert_eq!(call1.to_callsign(), "AA1AA");
                assert_eq!(call2.to_callsign(), "BB2BB");
            }
            other => panic!("expected ExtendedCallsign, got {other:?}"),
        }
    }

    #[test]
    fn corrupted_crc_rejected() {
        let lsf = Lsf::new(addr("N0CALL"), addr("W2FBI"), 0);
        let mut bytes = lsf.to_bytes();
        bytes[29] ^= 0xFF;
        assert!(Lsf::from_bytes(&bytes).is_err());
    }

    #[test]
    fn chunking_covers_240_bits_in_6x40() {
        let lsf = Lsf::new(addr("N0CALL"), addr("W2FBI"), 0x1234);
        let chunks = lsf.chunks();
        assert_eq!(chunks.len(), 6);
        for c in chunks {
            assert!(c <= 0xFF_FFFF_FFFF);
        }
    }

    #[test]
    fn text_message_fragmentation_round_trip() {
        let type_field = build_v3(Payload::DataOnly, Encryption::None, false, MK::Text, 0);
        let text = "Hello from an M17 radio, this message is long enough to span blocks!";
        let frames = Lsf::create_text_message_frames(addr("N0CALL"), addr("W2FBI"), type_field, text);
        assert!(!frames.is_empty());
        let mut reassembled = Vec::new();
        for f in &frames {
            if let MetaView::Text {
                block_count,
                block_index: _,
                text,
            } = f.meta_view()
            {
                assert_eq!(block_count as usize, frames.len());
                reassembled.extend_from_slice(&text);
            } else {
                panic!("expected Text meta view");
            }
        }
        let joined = String::from_utf8(reassembled[..text.len()].to_vec()).unwrap();
        assert_eq!(joined, text);
    }

    #[test]
    fn text_collector_assembles_out_of_order_blocks() {
        let type_field = build_v3(Payload::DataOnly, Encryption::None, false, MK::Text, 0);
        let text = "Hello from an M17 radio, this message is long enough to span blocks!";
        let frames = Lsf::create_text_message_frames(addr("N0CALL"), addr("W2FBI"), type_field, text);
        assert!(frames.len() > 1, "test needs a multi-block message");

        let mut collector = TextCollector::new();
        for f in frames.iter().rev() {
            collector.accept_lsf(f);
        }
        assert_eq!(collector.try_assemble().unwrap(), text);
    }

    #[test]
    fn text_collector_rejects_missing_block() {
        let type_field = build_v3(Payload::DataOnly, Encryption::None, false, MK::Text, 0);
        let text = "Hello from an M17 radio, this message is long enough to span blocks!";
        let frames = Lsf::create_text_message_frames(addr("N0CALL"), addr("W2FBI"), type_field, text);
        assert!(frames.len() > 2, "test needs at least three blocks");

        let mut collector = TextCollector::new();
        collector.accept_lsf(&frames[0]);
        collector.accept_lsf(&frames[frames.len() - 1]);
        assert!(collector.try_assemble().is_err());
    }

    #[test]
    fn text_collector_empty_is_an_error() {
        let collector = TextCollector::new();
        assert!(collector.try_assemble().is_err());
    }

    #[test]
    fn text_collector_drops_block_with_conflicting_count() {
        let mut collector = TextCollector::new();
        collector.accept(2, 0, [b'A'; 13]);
        collector.accept(3, 1, [b'B'; 13]);
        assert!(collector.try_assemble().is_err());
        collector.accept(2, 1, [b'C'; 13]);
        assert!(collector.try_assemble().is_ok());
    }
}
