//! M17 CRC-16.
//!
//! Polynomial `0x5935`, initial register `0xFFFF`, MSB-first bit
//! processing, no reflection, no final XOR. Ported the way
//! `hdlc_deframer::calc_crc` ports RFC1662's FCS table, but computed
//! bit-by-bit since the M17 polynomial isn't the CCITT one the table
//! in that file was built for.

const POLY: u16 = 0x5935;
const INIT: u16 = 0xFFFF;

/// Computes the M17 CRC-16 over `data`.
///
/// Test vectors from the protocol spec: `crc(b"") == 0xFFFF`,
/// `crc(b"A") == 0x206E`, `crc(b"123456789") == 0x772B`.
#[must_use]
pub fn crc_m17(data: &[u8]) -> u16 {
    let mut reg = INIT;
    for &byte in data {
        reg ^= (byte as u16) << 8;
        for _ in 0..8 {
            reg = if reg & 0x8000 != 0 {
                (reg << 1) ^ POLY
            } else {
                reg << 1
            };
        }
    }
    reg
}

/// Verifies that the last two bytes of `data_with_crc` are the
/// big-endian M17 CRC of the bytes preceding them.
#[must_use]
pub fn verify(data_with_crc: &[u8]) -> bool {
    let Some((data, crc_bytes)) = data_with_crc.split_last_chunk::<2>() else {
        return false;
    };
    let got = u16::from_be_bytes(*crc_bytes);
    crc_m17(data) == got
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        assert_eq!(crc_m17(b""), 0xFFFF);
    }

    #[test]
    fn single_byte() {
        assert_eq!(crc_m17(b"A"), 0x206E);
    }

    #[test]
    fn check_string() {
        assert_eq!(crc_m17(b"123456789"), 0x772B);
    }

    #[test]
    fn verify_round_trip() {
        let data = b"the quick brown fox";
        let crc = crc_m17(data);
        let mut buf = data.to_vec();
        buf.extend_from_slice(&crc.to_be_bytes());
        assert!(verify(&buf));
        buf[0] ^= 1;
        assert!(!verify(&buf));
    }

    #[test]
    fn verify_rejects_short_input() {
        assert!(!verify(&[0u8]));
        assert!(verify(&[0xFF, 0xFF])); // empty data, CRC of "" is 0xFFFF
    }
}
