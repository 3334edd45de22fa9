//! Exact rational exponents for dimension vectors.
//!
//! Magnetic field strength in Gaussian CGS is `g^(1/2) cm^(-1/2) s^-1`, so
//! dimension exponents cannot be plain integers. [`Rational`] stores a small
//! `num/denom` pair kept in lowest terms.
//!
//! ```rust
//! use codeunits_types::rational::Rational;
//!
//! let half = Rational::new(1, 2);
//! assert_eq!(half + half, Rational::ONE);
//! assert_eq!(Rational::new(-2, 4), -half);
//! assert_eq!(Rational::approximate(1.5), Some(Rational::new(3, 2)));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Largest denominator [`Rational::approximate`] will search.
const MAX_APPROX_DENOM: u8 = 12;

/// A rational number `num / denom`.
///
/// # Invariants
///
/// - `denom > 0`
/// - `gcd(|num|, denom) == 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    /// Numerator, carries the sign.
    pub num: i8,
    /// Denominator, never zero.
    pub denom: u8,
}

impl Rational {
    /// Zero (0/1).
    pub const ZERO: Self = Rational { num: 0, denom: 1 };

    /// One (1/1).
    pub const ONE: Self = Rational { num: 1, denom: 1 };

    /// One half, the exponent that shows up in Gaussian magnetic units.
    pub const HALF: Self = Rational { num: 1, denom: 2 };

    /// Build a rational in lowest terms.
    ///
    /// A zero denominator is treated as an integer (`denom = 1`); callers
    /// that parse user input go through [`Rational::checked`] instead.
    pub fn new(num: i8, denom: u8) -> Self {
        Self::checked(num as i16, denom as u16).unwrap_or(Rational::integer(num))
    }

    /// Build a rational from wide parts, returning `None` when the
    /// denominator is zero or the reduced value does not fit in `i8/u8`.
    pub fn checked(num: i16, denom: u16) -> Option<Self> {
        if denom == 0 {
            return None;
        }
        if num == 0 {
            return Some(Self::ZERO);
        }
        let g = gcd(num.unsigned_abs(), denom);
        let num = i8::try_from(num / g as i16).ok()?;
        let denom = u8::try_from(denom / g).ok()?;
        Some(Rational { num, denom })
    }

    /// Integer rational `n/1`.
    pub const fn integer(n: i8) -> Self {
        Rational { num: n, denom: 1 }
    }

    /// Find the rational with denominator at most 12 equal to `value`.
    ///
    /// Used for decimal exponents such as `**0.5` or `^1.5`.
    pub fn approximate(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        (1..=MAX_APPROX_DENOM).find_map(|denom| {
            let scaled = value * denom as f64;
            let rounded = scaled.round();
            if (scaled - rounded).abs() < 1e-9 && rounded.abs() <= i8::MAX as f64 {
                Self::checked(rounded as i16, denom as u16)
            } else {
                None
            }
        })
    }

    pub const fn is_zero(self) -> bool {
        self.num == 0
    }

    pub const fn is_integer(self) -> bool {
        self.denom == 1
    }

    /// Lossy conversion to `f64`.
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.denom as f64
    }

    /// Raise `base` to this exponent, using `powi` when exact.
    pub fn pow_f64(self, base: f64) -> f64 {
        if self.is_integer() {
            base.powi(self.num as i32)
        } else {
            base.powf(self.to_f64())
        }
    }

    /// `self + other`, or `None` when the reduced sum does not fit in `i8/u8`.
    pub fn checked_add(self, other: Rational) -> Option<Self> {
        let num = self.num as i32 * other.denom as i32 + other.num as i32 * self.denom as i32;
        Self::narrow(num, self.denom as u32 * other.denom as u32)
    }

    /// `self * other`, or `None` when the reduced product does not fit in `i8/u8`.
    pub fn checked_mul(self, other: Rational) -> Option<Self> {
        Self::narrow(
            self.num as i32 * other.num as i32,
            self.denom as u32 * other.denom as u32,
        )
    }

    /// Reduce a wide intermediate, `None` when it is out of range.
    fn narrow(num: i32, denom: u32) -> Option<Self> {
        if num == 0 {
            return Some(Self::ZERO);
        }
        let g = gcd_wide(num.unsigned_abs(), denom);
        let num = i8::try_from(num / g as i32).ok()?;
        let denom = u8::try_from(denom / g).ok()?;
        Some(Rational { num, denom })
    }

    /// Narrow a wide intermediate back into range, saturating.
    fn from_wide(num: i32, denom: u32) -> Self {
        if num == 0 {
            return Self::ZERO;
        }
        let g = gcd_wide(num.unsigned_abs(), denom);
        let num = (num / g as i32).clamp(i8::MIN as i32, i8::MAX as i32) as i16;
        let denom = (denom / g).min(u8::MAX as u32) as u16;
        Self::checked(num, denom).unwrap_or(Self::ZERO)
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<i8> for Rational {
    fn from(n: i8) -> Self {
        Rational::integer(n)
    }
}

/// Greatest common divisor (Euclid).
pub fn gcd(mut a: u16, mut b: u16) -> u16 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

fn gcd_wide(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

impl Add for Rational {
    type Output = Rational;

    fn add(self, other: Rational) -> Rational {
        let num = self.num as i32 * other.denom as i32 + other.num as i32 * self.denom as i32;
        Rational::from_wide(num, self.denom as u32 * other.denom as u32)
    }
}

impl Sub for Rational {
    type Output = Rational;

    fn sub(self, other: Rational) -> Rational {
        self + (-other)
    }
}

impl Mul for Rational {
    type Output = Rational;

    fn mul(self, other: Rational) -> Rational {
        Rational::from_wide(
            self.num as i32 * other.num as i32,
            self.denom as u32 * other.denom as u32,
        )
    }
}

impl Div for Rational {
    type Output = Rational;

    /// Division by zero yields zero.
    fn div(self, other: Rational) -> Rational {
        if other.is_zero() {
            return Rational::ZERO;
        }
        let num = self.num as i32 * other.denom as i32 * other.num.signum() as i32;
        let denom = self.denom as u32 * other.num.unsigned_abs() as u32;
        Rational::from_wide(num, denom)
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational {
            num: self.num.saturating_neg(),
            denom: self.denom,
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.denom)
        }
    }
}
