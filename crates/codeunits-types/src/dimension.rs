//! Physical dimension vectors.
//!
//! A [`Dimension`] records the exponent of each base quantity. Two units can
//! be converted into one another iff their dimensions are equal; the scale
//! factor between them is registry data and lives elsewhere.
//!
//! ```rust
//! use codeunits_types::{Dimension, Rational};
//!
//! let velocity = Dimension::LENGTH.multiply(&Dimension::TIME, Rational::integer(-1));
//! assert_eq!(velocity.length, Rational::ONE);
//! assert_eq!(velocity.time, Rational::integer(-1));
//! assert_eq!(velocity.to_string(), "cm·s^-1");
//! ```

use crate::rational::Rational;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exponents over the base quantities.
///
/// The basis is CGS flavored: the display symbols are `cm`, `g`, `s`, `K`,
/// `rad`, `A` and `cd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimension {
    /// Length exponent (L).
    pub length: Rational,
    /// Mass exponent (M).
    pub mass: Rational,
    /// Time exponent (T).
    pub time: Rational,
    /// Temperature exponent (Θ).
    pub temperature: Rational,
    /// Angle exponent. Tracked separately so radians never silently cancel.
    pub angle: Rational,
    /// Electric current exponent (I).
    pub current: Rational,
    /// Luminous intensity exponent (J).
    pub luminosity: Rational,
}

impl Dimension {
    pub const DIMENSIONLESS: Dimension = Dimension {
        length: Rational::ZERO,
        mass: Rational::ZERO,
        time: Rational::ZERO,
        temperature: Rational::ZERO,
        angle: Rational::ZERO,
        current: Rational::ZERO,
        luminosity: Rational::ZERO,
    };

    pub const LENGTH: Dimension = Dimension {
        length: Rational::ONE,
        ..Self::DIMENSIONLESS
    };

    pub const MASS: Dimension = Dimension {
        mass: Rational::ONE,
        ..Self::DIMENSIONLESS
    };

    pub const TIME: Dimension = Dimension {
        time: Rational::ONE,
        ..Self::DIMENSIONLESS
    };

    pub const TEMPERATURE: Dimension = Dimension {
        temperature: Rational::ONE,
        ..Self::DIMENSIONLESS
    };

    pub const ANGLE: Dimension = Dimension {
        angle: Rational::ONE,
        ..Self::DIMENSIONLESS
    };

    pub const CURRENT: Dimension = Dimension {
        current: Rational::ONE,
        ..Self::DIMENSIONLESS
    };

    pub const LUMINOSITY: Dimension = Dimension {
        luminosity: Rational::ONE,
        ..Self::DIMENSIONLESS
    };

    /// Gaussian CGS magnetic field: `g^(1/2) cm^(-1/2) s^-1`.
    pub const MAGNETIC_FIELD: Dimension = Dimension {
        length: Rational { num: -1, denom: 2 },
        mass: Rational::HALF,
        time: Rational { num: -1, denom: 1 },
        ..Self::DIMENSIONLESS
    };

    /// Build a dimension from integer exponents in basis order
    /// (length, mass, time, temperature, angle, current, luminosity).
    pub fn from_exponents(exponents: [i8; 7]) -> Self {
        let [l, m, t, k, a, i, j] = exponents.map(Rational::integer);
        Dimension {
            length: l,
            mass: m,
            time: t,
            temperature: k,
            angle: a,
            current: i,
            luminosity: j,
        }
    }

    /// Exponents in basis order.
    pub fn exponents(&self) -> [Rational; 7] {
        [
            self.length,
            self.mass,
            self.time,
            self.temperature,
            self.angle,
            self.current,
            self.luminosity,
        ]
    }

    fn from_array(e: [Rational; 7]) -> Self {
        Dimension {
            length: e[0],
            mass: e[1],
            time: e[2],
            temperature: e[3],
            angle: e[4],
            current: e[5],
            luminosity: e[6],
        }
    }

    /// `self · other^power`: adds `power`-scaled exponents of `other`.
    pub fn multiply(&self, other: &Dimension, power: Rational) -> Dimension {
        let lhs = self.exponents();
        let rhs = other.exponents();
        Self::from_array(std::array::from_fn(|i| lhs[i] + rhs[i] * power))
    }

    /// Like [`Dimension::multiply`], but `None` when an exponent leaves the
    /// `i8/u8` range instead of saturating.
    pub fn checked_multiply(&self, other: &Dimension, power: Rational) -> Option<Dimension> {
        let lhs = self.exponents();
        let rhs = other.exponents();
        let mut out = [Rational::ZERO; 7];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = lhs[i].checked_add(rhs[i].checked_mul(power)?)?;
        }
        Some(Self::from_array(out))
    }

    /// `self^power`.
    pub fn pow(&self, power: Rational) -> Dimension {
        Self::from_array(self.exponents().map(|e| e * power))
    }

    pub fn inverse(&self) -> Dimension {
        self.pow(Rational::integer(-1))
    }

    pub fn equals(&self, other: &Dimension) -> bool {
        self == other
    }

    pub fn is_dimensionless(&self) -> bool {
        self.exponents().iter().all(|e| e.is_zero())
    }
}

/// CGS display symbols in basis order.
pub const BASE_SYMBOLS: [&str; 7] = ["cm", "g", "s", "K", "rad", "A", "cd"];

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }

        let parts: Vec<String> = self
            .exponents()
            .iter()
            .zip(BASE_SYMBOLS)
            .filter(|(e, _)| !e.is_zero())
            .map(|(e, symbol)| match *e {
                Rational::ONE => symbol.to_string(),
                e if e.is_integer() => format!("{}^{}", symbol, e),
                e => format!("{}^({})", symbol, e),
            })
            .collect();

        write!(f, "{}", parts.join("·"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensionless() {
        assert!(Dimension::DIMENSIONLESS.is_dimensionless());
        assert!(!Dimension::LENGTH.is_dimensionless());
        assert_eq!(Dimension::default(), Dimension::DIMENSIONLESS);
    }

    #[test]
    fn test_multiply_with_power() {
        let density = Dimension::MASS.multiply(&Dimension::LENGTH, Rational::integer(-3));
        assert_eq!(density, Dimension::from_exponents([-3, 1, 0, 0, 0, 0, 0]));
    }

    #[test]
    fn test_checked_multiply() {
        let big = Dimension::LENGTH.pow(Rational::integer(100));
        assert_eq!(big.checked_multiply(&big, Rational::ONE), None);
        assert_eq!(
            Dimension::MASS.checked_multiply(&Dimension::LENGTH, Rational::integer(-3)),
            Some(Dimension::from_exponents([-3, 1, 0, 0, 0, 0, 0]))
        );
    }

    #[test]
    fn test_magnetic_field_squared_is_pressure() {
        let pressure = Dimension::from_exponents([-1, 1, -2, 0, 0, 0, 0]);
        assert_eq!(Dimension::MAGNETIC_FIELD.pow(Rational::integer(2)), pressure);
        assert_eq!(pressure.pow(Rational::HALF), Dimension::MAGNETIC_FIELD);
    }

    #[test]
    fn test_inverse_cancels() {
        let velocity = Dimension::LENGTH.multiply(&Dimension::TIME, Rational::integer(-1));
        let product = velocity.multiply(&velocity.inverse(), Rational::ONE);
        assert!(product.is_dimensionless());
        assert!(velocity.equals(&velocity));
        assert!(!velocity.equals(&Dimension::LENGTH));
    }

    #[test]
    fn test_display() {
        assert_eq!(Dimension::DIMENSIONLESS.to_string(), "1");
        assert_eq!(Dimension::LENGTH.to_string(), "cm");
        assert_eq!(
            Dimension::MAGNETIC_FIELD.to_string(),
            "cm^(-1/2)·g^(1/2)·s^-1"
        );
    }
}
