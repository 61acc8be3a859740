//! M17-over-IP framing: a 54-byte datagram carrying a stream-id, the
//! LSF (without its own CRC, since the IP frame has its own), and one
//! stream payload, for transport over a reliable or unreliable IP
//! link instead of RF.

use crate::address::Address;
use crate::constants::IP_MAGIC;
use crate::crc::crc_m17;
use crate::lsf::Lsf;
use crate::{Error, Result};

/// Total size of an M17-over-IP frame.
pub const FRAME_LEN: usize = 54;

/// One M17-over-IP datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpFrame {
    /// Stream identifier, distinguishing concurrent streams on one
    /// link.
    pub stream_id: u16,
    /// The link setup frame for this stream.
    pub lsf: Lsf,
    /// 18-byte stream payload (frame number + 16-byte payload).
    pub payload: [u8; 18],
}

impl IpFrame {
    /// Builds an IP frame from a destination, source, stream id, and
    /// payload, the common case of sending a plain voice/data stream
    /// over IP. The embedded LSF gets an all-zero TYPE field and an
    /// empty META payload; use [`IpFrame::from_lsf`] when the stream
    /// needs a specific TYPE field or META payload.
    #[must_use]
    pub fn create(dst: Address, src: Address, stream_id: u16, payload: [u8; 18]) -> Self {
        Self::from_lsf(stream_id, Lsf::new(dst, src, 0), payload)
    }

    /// Builds an IP frame from a caller-constructed LSF, preserving its
    /// TYPE field and META payload.
    #[must_use]
    pub fn from_lsf(stream_id: u16, lsf: Lsf, payload: [u8; 18]) -> Self {
        Self {
            stream_id,
            lsf,
            payload,
        }
    }

    /// Serializes to the 54-byte wire form: magic (4) + stream-id (2)
    /// + LSF-without-CRC (28) + payload (18) + CRC-16 over bytes
    /// `[4..52]` (2).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        let mut out = [0u8; FRAME_LEN];
        out[0..4].copy_from_slice(&IP_MAGIC);
        out[4..6].copy_from_slice(&self.stream_id.to_be_bytes());
        let lsf_bytes = self.lsf.to_bytes();
        out[6..34].copy_from_slice(&lsf_bytes[0..28]);
        out[34..52].copy_from_slice(&self.payload);
        let crc = crc_m17(&out[4..52]);
        out[52..54].copy_from_slice(&crc.to_be_bytes());
        out
    }

    /// Parses the 54-byte wire form.
    ///
    /// # Errors
    /// Returns [`Error::BadMagic`] if the leading 4 bytes aren't
    /// `"M17 "`, or [`Error::CrcMismatch`] if the trailing CRC doesn't
    /// match bytes `[4..52]`.
    pub fn parse(bytes: &[u8; FRAME_LEN]) -> Result<Self> {
        if bytes[0..4] != IP_MAGIC {
            return Err(Error::BadMagic);
        }
        let expected = u16::from_be_bytes([bytes[52], bytes[53]]);
        let got = crc_m17(&bytes[4..52]);
        if expected != got {
            return Err(Error::CrcMismatch { expected, got });
        }
        let stream_id = u16::from_be_bytes([bytes[4], bytes[5]]);
        // Re-derive the LSF's own CRC so Lsf::from_bytes sees a
        // self-consistent 30-byte buffer even though this wire form
        // doesn't carry it separately.
        let mut lsf_bytes = [0u8; 30];
        lsf_bytes[0..28].copy_from_slice(&bytes[6..34]);
        let lsf_crc = crc_m17(&lsf_bytes[0..28]);
        lsf_bytes[28..30].copy_from_slice(&lsf_crc.to_be_bytes());
        let lsf = Lsf::from_bytes(&lsf_bytes)?;
        let mut payload = [0u8; 18];
        payload.copy_from_slice(&bytes[34..52]);
        Ok(Self {
            stream_id,
            lsf,
            payload,
        })
    }
}
