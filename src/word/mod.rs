//! Twelve bit words.
//!
//! Every register and memory cell of the 160-A holds one 12-bit word.
//! Values are kept masked to [`Word::MASK`] at all times, so nothing
//! outside this module ever sees an out-of-range cell.

pub mod arith;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 12-bit machine word.
///
/// The wrapped `u16` never exceeds `0o7777`. Construction masks, it does
/// not check.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub struct Word(u16);

impl Word {
    /// Number of bits in a word.
    pub const WIDTH: u32 = 12;

    /// All twelve bits set.
    pub const MASK: u16 = 0o7777;

    /// The sign bit in one's complement interpretation.
    pub const SIGN: u16 = 0o4000;

    /// Positive zero.
    pub const ZERO: Word = Word(0);

    /// Minus zero, the one's complement of positive zero.
    pub const MINUS_ZERO: Word = Word(0o7777);

    /// Create a word, discarding any bits above bit 11.
    #[inline]
    pub const fn new(value: u16) -> Self {
        Self(value & Self::MASK)
    }

    /// The raw 12-bit value.
    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// The value as a `usize`, for indexing bank arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The F (operation) field: bits 11-6.
    #[inline]
    pub const fn f(self) -> u8 {
        (self.0 >> 6) as u8
    }

    /// The E (operand) field: bits 5-0.
    #[inline]
    pub const fn e(self) -> u8 {
        (self.0 & 0o77) as u8
    }

    /// Assemble a word from its F and E fields.
    #[inline]
    pub const fn from_fields(f: u8, e: u8) -> Self {
        Self::new(((f as u16 & 0o77) << 6) | (e as u16 & 0o77))
    }

    /// True only for positive zero. Minus zero is not zero to the
    /// jump logic.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// True when the sign bit is clear, including positive zero.
    #[inline]
    pub const fn is_positive(self) -> bool {
        self.0 & Self::SIGN == 0
    }

    /// True when the sign bit is set, including minus zero.
    #[inline]
    pub const fn is_negative(self) -> bool {
        !self.is_positive()
    }

    /// Address arithmetic: `self + offset`, wrapping at 12 bits.
    #[inline]
    pub const fn offset(self, offset: u16) -> Self {
        Self::new(self.0.wrapping_add(offset))
    }

    /// Address arithmetic: `self - offset`, wrapping at 12 bits.
    #[inline]
    pub const fn back(self, offset: u16) -> Self {
        Self::new(self.0.wrapping_sub(offset))
    }

    /// Parse an unsigned octal literal such as `7700`.
    ///
    /// Returns `None` for empty input, anything but the digits 0-7 (signs
    /// included), or values that do not fit in twelve bits.
    pub fn parse_octal(s: &str) -> Option<Self> {
        if s.is_empty() || s.len() > 4 || !s.bytes().all(is_octal_digit) {
            return None;
        }
        u16::from_str_radix(s, 8).ok().map(Self::new)
    }
}

pub(crate) fn is_octal_digit(b: u8) -> bool {
    (b'0'..=b'7').contains(&b)
}

impl From<u16> for Word {
    fn from(value: u16) -> Self {
        Self::new(value)
    }
}

impl From<Word> for u16 {
    fn from(word: Word) -> Self {
        word.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({:04o})", self.0)
    }
}

impl fmt::Octal for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Octal::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_truncates() {
        assert_eq!(Word::new(0o17777).value(), 0o7777);
        assert_eq!(Word::new(0o10000).value(), 0);
        assert_eq!(Word::from(0o1234).value(), 0o1234);
    }

    #[test]
    fn test_fields() {
        let w = Word::new(0o2211);
        assert_eq!(w.f(), 0o22);
        assert_eq!(w.e(), 0o11);
        assert_eq!(Word::from_fields(0o22, 0o11), w);
    }

    #[test]
    fn test_sign_tests() {
        assert!(Word::ZERO.is_zero());
        assert!(Word::ZERO.is_positive());
        assert!(!Word::MINUS_ZERO.is_zero());
        assert!(Word::MINUS_ZERO.is_negative());
        assert!(Word::new(0o3777).is_positive());
        assert!(Word::new(0o4000).is_negative());
    }

    #[test]
    fn test_address_wrap() {
        assert_eq!(Word::new(0o7777).offset(1), Word::ZERO);
        assert_eq!(Word::new(0o0002).back(3), Word::new(0o7777));
    }

    #[test]
    fn test_parse_octal() {
        assert_eq!(Word::parse_octal("7700"), Some(Word::new(0o7700)));
        assert_eq!(Word::parse_octal("0"), Some(Word::ZERO));
        assert_eq!(Word::parse_octal("8"), None);
        assert_eq!(Word::parse_octal("17777"), None);
        assert_eq!(Word::parse_octal(""), None);
        assert_eq!(Word::parse_octal("+100"), None);
        assert_eq!(Word::parse_octal("-1"), None);
    }

    #[test]
    fn test_display_is_four_digit_octal() {
        assert_eq!(Word::new(0o12).to_string(), "0012");
        assert_eq!(format!("{:o}", Word::new(0o777)), "777");
    }

    proptest! {
        #[test]
        fn prop_value_never_exceeds_mask(v in any::<u16>()) {
            prop_assert!(Word::new(v).value() <= Word::MASK);
            prop_assert_eq!(Word::new(v).value(), v & 0o7777);
        }

        #[test]
        fn prop_offset_back_inverse(a in 0u16..=0o7777, n in 0u16..=0o77) {
            let w = Word::new(a);
            prop_assert_eq!(w.offset(n).back(n), w);
        }
    }
}
