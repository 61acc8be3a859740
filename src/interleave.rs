//! Quadratic permutation polynomial (QPP) interleaver used after
//! puncturing: `π(i) = (45*i + 92*i^2) mod 368`.
//!
//! The polynomial is an involution over its domain (`π(π(i)) == i`
//! for every `i` in `0..368`), so the same function interleaves and
//! deinterleaves.

use crate::{Error, Result};

const SIZE: usize = 368;

fn permute(i: usize) -> usize {
    (45 * i + 92 * i * i) % SIZE
}

fn check_len<T>(input: &[T], who: &str) -> Result<()> {
    if input.len() != SIZE {
        return Err(Error::InvalidInput(format!(
            "{who}: input must be {SIZE} entries, got {}",
            input.len()
        )));
    }
    Ok(())
}

/// Applies the QPP permutation to a 368-entry slice, returning the
/// reordered copy. `T` is generic so this works on both hard bits and
/// soft bits.
///
/// # Errors
/// Returns [`Error::InvalidInput`] if `input.len() != 368`.
pub fn interleave<T: Copy + Default>(input: &[T]) -> Result<Vec<T>> {
    check_len(input, "interleave")?;
    let mut out = vec![T::default(); SIZE];
    for i in 0..SIZE {
        out[permute(i)] = input[i];
    }
    Ok(out)
}

/// Inverts [`interleave`]. Since the QPP permutation is its own
/// inverse, this is the same operation applied again.
///
/// # Errors
/// Returns [`Error::InvalidInput`] if `input.len() != 368`.
pub fn deinterleave<T: Copy + Default>(input: &[T]) -> Result<Vec<T>> {
    check_len(input, "deinterleave")?;
    let mut out = vec![T::default(); SIZE];
    for i in 0..SIZE {
        out[i] = input[permute(i)];
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_is_an_involution() {
        for i in 0..SIZE {
            assert_eq!(permute(permute(i)), i);
        }
    }

    #[test]
    fn permutation_is_a_bijection() {
        let mut seen = vec![false; SIZE];
        for i in 0..SIZE {
            let p = permute(i);
            assert!(!seen[p], "index {p} hit twice");
            seen[p] = true;
        }
    }

    #[test]
    fn interleave_deinterleave_round_trip() {
        let input: Vec<u16> = (0..SIZE as u16).collect();
        let out = interleave(&input).unwrap();
        let back = deinterleave(&out).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn interleave_is_self_inverse() {
        let input: Vec<u8> = (0..SIZE).map(|i| (i % 7) as u8).collect();
        let once = interleave(&input).unwrap();
        let twice = interleave(&once).unwrap();
        assert_eq!(twice, input);
    }

    #[test]
    fn rejects_wrong_length() {
        let input = vec![0u8; 10];
        assert!(interleave(&input).is_err());
        assert!(deinterleave(&input).is_err());
    }
}
