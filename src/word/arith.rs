//! One's complement arithmetic on 12-bit words.
//!
//! The 160-A adder is a subtractor with end-around borrow: addition is
//! performed by subtracting the complement of the addend. Doing it the
//! same way here reproduces the machine's minus-zero behaviour exactly,
//! e.g. `-0 + -0 = -0` while `-0 + +0 = +0`.

use crate::word::Word;

/// One's complement negation.
#[inline]
pub fn negate(value: Word) -> Word {
    Word::new(value.value() ^ Word::MASK)
}

/// `minuend - subtrahend` with end-around borrow.
pub fn subtract(minuend: Word, subtrahend: Word) -> Word {
    let mut difference = i32::from(minuend.value()) - i32::from(subtrahend.value());
    if difference & !i32::from(Word::MASK) != 0 {
        difference -= 1;
    }
    Word::new((difference & i32::from(Word::MASK)) as u16)
}

/// `lhs + rhs`, computed as `lhs - (-rhs)`.
#[inline]
pub fn add(lhs: Word, rhs: Word) -> Word {
    subtract(lhs, negate(rhs))
}

/// Multiply by ten. Algebraically correct for `-0o314..=0o314`,
/// correct modulo 4095 elsewhere.
pub fn times_ten(value: Word) -> Word {
    let doubled = add(value, value);
    let quadrupled = add(doubled, doubled);
    let octupled = add(quadrupled, quadrupled);
    add(octupled, doubled)
}

/// Multiply by one hundred. Algebraically correct for `-0o24..=0o24`.
pub fn times_hundred(value: Word) -> Word {
    times_ten(times_ten(value))
}

/// End-around left rotation by `places` bits.
pub fn rotate_left(value: Word, places: u32) -> Word {
    let places = places % Word::WIDTH;
    let v = value.value();
    Word::new((v << places) | (v >> (Word::WIDTH - places)))
}

/// Arithmetic right shift by `places` bits, replicating the sign bit.
pub fn shift_right(value: Word, places: u32) -> Word {
    (0..places).fold(value, |acc, _| {
        let v = acc.value();
        Word::new((v >> 1) | (v & Word::SIGN))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn w(v: u16) -> Word {
        Word::new(v)
    }

    #[test]
    fn test_negate() {
        assert_eq!(negate(w(0)), w(0o7777));
        assert_eq!(negate(w(0o7777)), w(0));
        assert_eq!(negate(w(1)), w(0o7776));
        assert_eq!(negate(w(0o7776)), w(1));
    }

    #[test]
    fn test_subtract() {
        assert_eq!(subtract(w(0), w(0)), w(0));
        assert_eq!(subtract(w(0o7777), w(0o7777)), w(0));
        assert_eq!(subtract(w(0o7777), w(0)), w(0o7777));
        assert_eq!(subtract(w(0), w(0o7777)), w(0));
        assert_eq!(subtract(w(1), w(0)), w(1));
        assert_eq!(subtract(w(1), w(1)), w(0));
        assert_eq!(subtract(w(0), w(1)), w(0o7776));
        assert_eq!(subtract(w(0o7777), w(1)), w(0o7776));
        assert_eq!(subtract(w(1), w(2)), w(0o7776));
        assert_eq!(subtract(w(2), w(1)), w(1));
    }

    #[test]
    fn test_add() {
        assert_eq!(add(w(0), w(0)), w(0));
        assert_eq!(add(w(0o7777), w(0o7777)), w(0o7777));
        assert_eq!(add(w(0o7777), w(0)), w(0));
        assert_eq!(add(w(0), w(0o7777)), w(0));
        assert_eq!(add(w(0o7777), w(1)), w(1));
        assert_eq!(add(w(1), w(0o7777)), w(1));
        assert_eq!(add(w(1), w(0o7776)), w(0));
        assert_eq!(add(w(0o7776), w(1)), w(0));
        assert_eq!(add(w(1), w(0o3775)), w(0o3776));
        assert_eq!(add(w(1), w(0o3777)), w(0o4000));
        assert_eq!(add(w(1), w(2)), w(3));
    }

    #[test]
    fn test_times_ten() {
        assert_eq!(times_ten(w(1)), w(10));
        assert_eq!(times_ten(w(0o7777)), w(0o7777));
        assert_eq!(times_ten(negate(w(1))), negate(w(10)));
        assert_eq!(times_ten(w(0o314)), w(0o3770));
    }

    #[test]
    fn test_times_hundred() {
        assert_eq!(times_hundred(w(1)), w(100));
        assert_eq!(times_hundred(w(0o24)), w(2000));
        assert_eq!(times_hundred(negate(w(2))), negate(w(200)));
    }

    #[test]
    fn test_rotate_left() {
        assert_eq!(rotate_left(w(0o4001), 1), w(0o0003));
        assert_eq!(rotate_left(w(0o4001), 2), w(0o0006));
        assert_eq!(rotate_left(w(0o7001), 3), w(0o0017));
        assert_eq!(rotate_left(w(0o1234), 6), w(0o3412));
    }

    #[test]
    fn test_shift_right_extends_sign() {
        assert_eq!(shift_right(w(0o4000), 1), w(0o6000));
        assert_eq!(shift_right(w(0o0006), 1), w(0o0003));
        assert_eq!(shift_right(w(0o4014), 2), w(0o7003));
        assert_eq!(shift_right(w(0o0014), 2), w(0o0003));
    }

    proptest! {
        #[test]
        fn prop_double_negation(v in 0u16..=0o7777) {
            prop_assert_eq!(negate(negate(w(v))), w(v));
        }

        #[test]
        fn prop_add_commutes(a in 0u16..=0o7777, b in 0u16..=0o7777) {
            prop_assert_eq!(add(w(a), w(b)), add(w(b), w(a)));
        }

        #[test]
        fn prop_value_minus_itself_is_plus_zero(v in 0u16..=0o7777) {
            prop_assert_eq!(subtract(w(v), w(v)), Word::ZERO);
        }

        #[test]
        fn prop_full_rotation_is_identity(v in 0u16..=0o7777) {
            prop_assert_eq!(rotate_left(rotate_left(w(v), 6), 6), w(v));
        }
    }
}
