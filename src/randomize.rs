//! 46-byte whitening sequence applied (XORed) over a frame's coded
//! payload to break up long runs of identical symbols before
//! transmission. XOR is self-inverse, so the same function whitens
//! and de-whitens.

/// The fixed dithering sequence, one byte per coded byte of a frame.
#[rustfmt::skip]
pub const SEQUENCE: [u8; 46] = [
    0xD6, 0xB5, 0xE2, 0x30, 0x82, 0xFF, 0x84, 0x62,
    0xBA, 0x4E, 0x96, 0x90, 0xD8, 0x98, 0xDD, 0x5D,
    0x0C, 0xC8, 0x52, 0x43, 0x91, 0x1D, 0xF8, 0x6E,
    0x68, 0x2F, 0x35, 0xDA, 0x14, 0xEA, 0xCD, 0x76,
    0x19, 0x8D, 0xD5, 0x80, 0xD1, 0x33, 0x87, 0x13,
    0x57, 0x18, 0x2D, 0x29, 0x78, 0xC3,
];

/// XORs `data` against [`SEQUENCE`], cycling the sequence if `data` is
/// longer than 46 bytes. Applying this twice returns the original
/// data.
#[must_use]
pub fn randomize(data: &[u8]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, &b)| b ^ SEQUENCE[i % SEQUENCE.len()])
        .collect()
}

/// Whitens or de-whitens a slice of soft bits (one per transmitted
/// bit, MSB-first within each byte of [`SEQUENCE`]). Where the
/// whitening bit is 1, the soft value is mirrored around the midpoint
/// (`255 - soft`) instead of XORed, so confidence is preserved rather
/// than discarded the way a hard XOR would. Applying this twice
/// returns the original soft values.
#[must_use]
pub fn randomize_soft(soft: &[u8]) -> Vec<u8> {
    soft.iter()
        .enumerate()
        .map(|(i, &s)| {
            let byte = SEQUENCE[(i / 8) % SEQUENCE.len()];
            let wbit = (byte >> (7 - (i % 8))) & 1;
            if wbit != 0 { 255 - s } else { s }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_self_inverse() {
        let data = [0x12u8, 0x34, 0x56, 0xAB, 0xCD, 0xEF];
        let once = randomize(&data);
        let twice = randomize(&once);
        assert_eq!(twice, data);
    }

    #[test]
    fn full_length_round_trip() {
        let data: Vec<u8> = (0..46).map(|i| (i * 3) as u8).collect();
        let once = randomize(&data);
        assert_ne!(once, data);
        let twice = randomize(&once);
        assert_eq!(twice, data);
    }

    #[test]
    fn empty_input() {
        assert!(randomize(&[]).is_empty());
    }

    #[test]
    fn soft_randomize_is_self_inverse() {
        let soft: Vec<u8> = (0..368).map(|i| ((i * 37) % 256) as u8).collect();
        let once = randomize_soft(&soft);
        let twice = randomize_soft(&once);
        assert_eq!(twice, soft);
    }

    #[test]
    fn soft_randomize_matches_hard_randomize_at_the_extremes() {
        // Strong 0 (0) / strong 1 (255) soft values round-trip exactly
        // like hard bits would under the XOR-based byte randomizer.
        let hard = [0xFFu8; 46];
        let soft: Vec<u8> = hard
            .iter()
            .flat_map(|&b| (0..8).map(move |i| if (b >> (7 - i)) & 1 != 0 { 255 } else { 0 }))
            .collect();
        let whitened_hard = randomize(&hard);
        let whitened_soft = randomize_soft(&soft);
        for (byte_idx, &hb) in whitened_hard.iter().enumerate() {
            for bit_idx in 0..8 {
                let expected = if (hb >> (7 - bit_idx)) & 1 != 0 { 255 } else { 0 };
                assert_eq!(whitened_soft[byte_idx * 8 + bit_idx], expected);
            }
        }
    }
}
