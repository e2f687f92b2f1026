//! Bit encoding of sampled sensor groups.
//!
//! The first pin of a group is the least significant bit: pin `i` weighs
//! `2^i`. Consumers parse the decimal text, so this ordering is part of the
//! wire contract.

use crate::bank::GroupKey;

/// Encodes an ordered sequence of pin states, first pin least significant.
///
/// Groups are limited to 31 pins by configuration validation; bits past
/// index 31 would not fit and are ignored.
pub fn encode(bits: &[bool]) -> u32 {
    bits.iter()
        .take(32)
        .enumerate()
        .filter(|&(_, &high)| high)
        .fold(0u32, |acc, (i, _)| acc | (1u32 << i))
}

/// Renders a value as base-10 ASCII with no sign and no leading zeros.
pub fn to_text(value: u32) -> String {
    value.to_string()
}

/// A complete reading of one group: the value and its decimal text, always
/// produced together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedReading {
    group: GroupKey,
    value: u32,
    text: String,
}

impl EncodedReading {
    pub fn from_bits(group: GroupKey, bits: &[bool]) -> Self {
        let value = encode(bits);
        Self {
            group,
            value,
            text: to_text(value),
        }
    }

    #[inline]
    pub fn group(&self) -> GroupKey {
        self.group
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text form in bytes.
    #[inline]
    pub fn width(&self) -> usize {
        self.text.len()
    }

    /// Copies as much of the text as fits in `buf` and returns the count.
    pub(crate) fn copy_to(&self, buf: &mut [u8]) -> usize {
        let len = buf.len().min(self.text.len());
        buf[..len].copy_from_slice(&self.text.as_bytes()[..len]);
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(&[]), 0);
        assert_eq!(encode(&[true, false]), 1);
        assert_eq!(encode(&[false, true]), 2);
        assert_eq!(encode(&[true, true]), 3);
        assert_eq!(encode(&[false, true, false, true]), 10);
        assert_eq!(encode(&[true, true, true, true]), 15);
    }

    #[test]
    fn test_encode_matches_weighted_sum() {
        for width in [2usize, 4] {
            for pattern in 0u32..(1 << width) {
                let bits: Vec<bool> = (0..width).map(|i| pattern & (1 << i) != 0).collect();
                let expected: u32 = bits
                    .iter()
                    .enumerate()
                    .map(|(i, &b)| u32::from(b) * 2u32.pow(i as u32))
                    .sum();
                assert_eq!(encode(&bits), expected, "bits {:?}", bits);
                assert!(encode(&bits) < (1 << width));
            }
        }
    }

    #[test]
    fn test_text_has_no_padding() {
        assert_eq!(to_text(0), "0");
        assert_eq!(to_text(5), "5");
        assert_eq!(to_text(15), "15");
        assert_eq!(to_text(1 << 30), "1073741824");
    }

    #[test]
    fn test_reading_copy_truncates() {
        let reading = EncodedReading::from_bits(GroupKey(2), &[true, true, true, true]);
        assert_eq!(reading.value(), 15);
        assert_eq!(reading.width(), 2);

        let mut one = [0u8; 1];
        assert_eq!(reading.copy_to(&mut one), 1);
        assert_eq!(&one, b"1");

        let mut wide = [0u8; 8];
        assert_eq!(reading.copy_to(&mut wide), 2);
        assert_eq!(&wide[..2], b"15");

        assert_eq!(reading.copy_to(&mut []), 0);
    }
}
