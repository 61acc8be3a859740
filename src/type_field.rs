//! The LSF TYPE field: the legacy v2.0.3 bit layout, the redesigned
//! v3.0.0 layout, and the version probe that tells them apart.
//!
//! Both layouts are carried as a raw `u16` inside the LSF and parsed
//! on demand by whichever layout the caller asks for, rather than
//! wrapped in an enum at construction time — see `DESIGN.md` for why.

/// v2.0.3 frame type: stream or packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameKind {
    /// Packet mode.
    Packet,
    /// Stream mode.
    Stream,
}

/// v2.0.3 DataType field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataTypeV2 {
    /// Reserved.
    Reserved,
    /// Data only.
    Data,
    /// Voice only.
    Voice,
    /// Voice and data.
    VoiceAndData,
}

/// v2.0.3 EncryptionType field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EncryptionTypeV2 {
    /// No encryption.
    None,
    /// Scrambler.
    Scrambler,
    /// AES.
    Aes,
    /// Another, unspecified scheme.
    Other,
}

/// A fully parsed v2.0.3 TYPE field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeV2 {
    /// Stream or packet.
    pub frame_kind: FrameKind,
    /// Data type.
    pub data_type: DataTypeV2,
    /// Encryption type.
    pub encryption_type: EncryptionTypeV2,
    /// Encryption sub-type, meaning depends on `encryption_type`.
    pub encryption_subtype: u8,
    /// Channel Access Number.
    pub can: u8,
}

/// Builds a raw v2.0.3 TYPE field.
#[must_use]
pub fn build_v2(
    frame_kind: FrameKind,
    data_type: DataTypeV2,
    encryption_type: EncryptionTypeV2,
    encryption_subtype: u8,
    can: u8,
) -> u16 {
    let stream_bit = u16::from(matches!(frame_kind, FrameKind::Stream));
    let data = match data_type {
        DataTypeV2::Reserved => 0b00,
        DataTypeV2::Data => 0b01,
        DataTypeV2::Voice => 0b10,
        DataTypeV2::VoiceAndData => 0b11,
    };
    let enc = match encryption_type {
        EncryptionTypeV2::None => 0b00,
        EncryptionTypeV2::Scrambler => 0b01,
        EncryptionTypeV2::Aes => 0b10,
        EncryptionTypeV2::Other => 0b11,
    };
    stream_bit
        | (data << 1)
        | (enc << 3)
        | (u16::from(encryption_subtype & 0b11) << 5)
        | (u16::from(can & 0b1111) << 7)
}

/// Parses a raw TYPE field as the v2.0.3 layout.
#[must_use]
pub fn parse_v2(raw: u16) -> TypeV2 {
    let frame_kind = if raw & 0x0001 != 0 {
        FrameKind::Stream
    } else {
        FrameKind::Packet
    };
    let data_type = match (raw >> 1) & 0b11 {
        0b00 => DataTypeV2::Reserved,
        0b01 => DataTypeV2::Data,
        0b10 => DataTypeV2::Voice,
        _ => DataTypeV2::VoiceAndData,
    };
    let encryption_type = match (raw >> 3) & 0b11 {
        0b00 => EncryptionTypeV2::None,
        0b01 => EncryptionTypeV2::Scrambler,
        0b10 => EncryptionTypeV2::Aes,
        _ => EncryptionTypeV2::Other,
    };
    TypeV2 {
        frame_kind,
        data_type,
        encryption_type,
        encryption_subtype: ((raw >> 5) & 0b11) as u8,
        can: ((raw >> 7) & 0b1111) as u8,
    }
}

/// v3.0.0 PAYLOAD field. Unrecognized codes parse as `Unknown` rather
/// than failing, since the v3.0.0 layout is pre-release and may grow
/// new codes (§9 Open Question ii).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Payload {
    /// Data only, no voice.
    DataOnly,
    /// 3200 bps voice.
    Voice3200,
    /// 1600 bps voice with data.
    Voice1600Data,
    /// Packet mode payload.
    Packet,
    /// Any other 4-bit code.
    Unknown(u8),
}

impl Payload {
    fn to_bits(self) -> u16 {
        match self {
            Self::DataOnly => 1,
            Self::Voice3200 => 2,
            Self::Voice1600Data => 3,
            Self::Packet => 4,
            Self::Unknown(n) => u16::from(n & 0b1111),
        }
    }

    fn from_bits(n: u16) -> Self {
        match n {
            1 => Self::DataOnly,
            2 => Self::Voice3200,
            3 => Self::Voice1600Data,
            4 => Self::Packet,
            n => Self::Unknown(n as u8),
        }
    }
}

/// v3.0.0 ENCRYPTION field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encryption {
    /// No encryption.
    None,
    /// 8-bit scrambler.
    Scr8,
    /// 16-bit scrambler.
    Scr16,
    /// 24-bit scrambler.
    Scr24,
    /// AES-128.
    Aes128,
    /// AES-192.
    Aes192,
    /// AES-256.
    Aes256,
    /// Reserved/unrecognized code.
    Unknown(u8),
}

impl Encryption {
    fn to_bits(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Scr8 => 1,
            Self::Scr16 => 2,
            Self::Scr24 => 3,
            Self::Aes128 => 4,
            Self::Aes192 => 5,
            Self::Aes256 => 6,
            Self::Unknown(n) => u16::from(n & 0b111),
        }
    }

    fn from_bits(n: u16) -> Self {
        match n {
            0 => Self::None,
            1 => Self::Scr8,
            2 => Self::Scr16,
            3 => Self::Scr24,
            4 => Self::Aes128,
            5 => Self::Aes192,
            6 => Self::Aes256,
            n => Self::Unknown(n as u8),
        }
    }
}

/// v3.0.0 META field tag: which decoded view, if any, the LSF's META
/// bytes should be interpreted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetaKind {
    /// No META payload.
    None,
    /// GNSS position report.
    Gnss,
    /// Extended callsign(s).
    ExtCall,
    /// Multi-block text message.
    Text,
    /// AES initialization vector.
    AesIv,
    /// Any other 4-bit code.
    Unknown(u8),
}

impl MetaKind {
    fn to_bits(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Gnss => 1,
            Self::ExtCall => 2,
            Self::Text => 3,
            Self::AesIv => 4,
            Self::Unknown(n) => u16::from(n & 0b1111),
        }
    }

    fn from_bits(n: u16) -> Self {
        match n {
            0 => Self::None,
            1 => Self::Gnss,
            2 => Self::ExtCall,
            3 => Self::Text,
            4 => Self::AesIv,
            n => Self::Unknown(n as u8),
        }
    }
}

/// A fully parsed v3.0.0 TYPE field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeV3 {
    /// Payload kind.
    pub payload: Payload,
    /// Encryption scheme.
    pub encryption: Encryption,
    /// Whether the frame carries a digital signature.
    pub signed: bool,
    /// META field tag.
    pub meta: MetaKind,
    /// Channel Access Number.
    pub can: u8,
}

/// Builds a raw v3.0.0 TYPE field.
///
/// Bit layout, MSB to LSB: `PAYLOAD[4] ENCRYPTION[3] SIGNED[1] META[4]
/// CAN[4]`. Note the PAYLOAD nibble occupies bits 15..12, so its low
/// nibble (bits 3..0 of the whole field, per the version probe in
/// [`detect_version`]) is never all-zero for a valid v3 payload code,
/// since `PAYLOAD` codes start at 1.
#[must_use]
pub fn build_v3(
    payload: Payload,
    encryption: Encryption,
    signed: bool,
    meta: MetaKind,
    can: u8,
) -> u16 {
    (payload.to_bits() << 12)
        | (encryption.to_bits() << 9)
        | (u16::from(signed) << 8)
        | (meta.to_bits() << 4)
        | u16::from(can & 0b1111)
}

/// Parses a raw TYPE field as the v3.0.0 layout.
#[must_use]
pub fn parse_v3(raw: u16) -> TypeV3 {
    TypeV3 {
        payload: Payload::from_bits((raw >> 12) & 0b1111),
        encryption: Encryption::from_bits((raw >> 9) & 0b111),
        signed: (raw >> 8) & 1 != 0,
        meta: MetaKind::from_bits((raw >> 4) & 0b1111),
        can: (raw & 0b1111) as u8,
    }
}

/// Which TYPE layout a raw field should be parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// Legacy v2.0.3 layout.
    V2,
    /// Redesigned v3.0.0 layout.
    V3,
}

/// Probes a raw TYPE field for its layout version.
///
/// The v3.0.0 PAYLOAD nibble occupies the top 4 bits. If those bits
/// are zero the field is treated as the legacy v2.0.3 layout (whose
/// top bits are CAN, frequently zero in practice but never relied on
/// here); otherwise it's v3.0.0. This is the protocol's own
/// backward-compatibility hinge, not an out-of-band version tag.
#[must_use]
pub fn detect_version(raw: u16) -> Version {
    if (raw >> 12) & 0b1111 == 0 {
        Version::V2
    } else {
        Version::V3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v2_round_trip() {
        let raw = build_v2(
            FrameKind::Stream,
            DataTypeV2::Voice,
            EncryptionTypeV2::None,
            0,
            7,
        );
        let parsed = parse_v2(raw);
        assert_eq!(parsed.frame_kind, FrameKind::Stream);
        assert_eq!(parsed.data_type, DataTypeV2::Voice);
        assert_eq!(parsed.can, 7);
    }

    #[test]
    fn v3_round_trip() {
        let raw = build_v3(Payload::Voice3200, Encryption::Aes128, true, MetaKind::Gnss, 3);
        let parsed = parse_v3(raw);
        assert_eq!(parsed.payload, Payload::Voice3200);
        assert_eq!(parsed.encryption, Encryption::Aes128);
        assert!(parsed.signed);
        assert_eq!(parsed.meta, MetaKind::Gnss);
        assert_eq!(parsed.can, 3);
    }

    #[test]
    fn version_probe_v2_when_payload_nibble_zero() {
        for data in [DataTypeV2::Reserved, DataTypeV2::Data, DataTypeV2::Voice] {
            let raw = build_v2(FrameKind::Packet, data, EncryptionTypeV2::None, 0, 0);
            assert_eq!(detect_version(raw), Version::V2);
        }
    }

    #[test]
    fn version_probe_v3_when_payload_nonzero() {
        for p in [Payload::DataOnly, Payload::Voice3200, Payload::Packet] {
            let raw = build_v3(p, Encryption::None, false, MetaKind::None, 0);
            assert_eq!(detect_version(raw), Version::V3);
        }
    }

    #[test]
    fn unknown_codes_do_not_fail() {
        let parsed = parse_v3(build_v3(
            Payload::Unknown(9),
            Encryption::Unknown(7),
            false,
            MetaKind::Unknown(12),
            0,
        ));
        assert_eq!(parsed.payload, Payload::Unknown(9));
        assert_eq!(parsed.encryption, Encryption::Unknown(7));
        assert_eq!(parsed.meta, MetaKind::Unknown(12));
    }
}
