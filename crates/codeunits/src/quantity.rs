//! Scalar values bound to a unit and a registry.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Div, Mul, Neg};
use std::sync::Arc;

use codeunits_types::{Dimension, Rational};
use tracing::trace;

use crate::error::{Result, UnitError};
use crate::expr::UnitExpression;
use crate::registry::UnitRegistry;

/// A number with a unit.
///
/// The registry is held by `Arc`. A dataset that overrides its code units
/// swaps in a new registry, so quantities built earlier keep converting with
/// the definitions they were created under.
#[derive(Debug, Clone)]
pub struct Quantity {
    value: f64,
    units: UnitExpression,
    registry: Arc<UnitRegistry>,
}

impl Quantity {
    /// Parse `units` against `registry` and attach `value`.
    pub fn new(value: f64, units: &str, registry: &Arc<UnitRegistry>) -> Result<Self> {
        let units = registry.parse(units)?;
        Ok(Self::from_expression(value, units, registry))
    }

    pub fn from_expression(value: f64, units: UnitExpression, registry: &Arc<UnitRegistry>) -> Self {
        Self {
            value,
            units,
            registry: Arc::clone(registry),
        }
    }

    /// Dimensionless quantity in the plain `dimensionless` unit.
    pub fn dimensionless(value: f64, registry: &Arc<UnitRegistry>) -> Self {
        Self::from_expression(value, UnitExpression::dimensionless(), registry)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn units(&self) -> &UnitExpression {
        &self.units
    }

    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.registry
    }

    pub fn dimension(&self) -> Dimension {
        self.units.dimension()
    }

    /// Value in CGS, cosmology applied as of now.
    pub fn cgs_value(&self) -> f64 {
        self.value * self.units.cgs_factor()
    }

    /// Rescale into `units`, parsed against this quantity's registry.
    pub fn convert_to(&self, units: &str) -> Result<Quantity> {
        let target = self.registry.parse(units)?;
        self.convert_to_expression(&target)
    }

    /// Rescale into an already parsed expression.
    ///
    /// The ratio of the two CGS factors is taken once and applied once.
    pub fn convert_to_expression(&self, target: &UnitExpression) -> Result<Quantity> {
        let ratio = self.units.conversion_factor(target)?;
        trace!(from = %self.units, to = %target, ratio, "quantity converted");
        Ok(Self {
            value: self.value * ratio,
            units: target.clone(),
            registry: Arc::clone(&self.registry),
        })
    }

    /// Value after converting to `units`.
    pub fn in_units(&self, units: &str) -> Result<f64> {
        Ok(self.convert_to(units)?.value)
    }

    /// Same quantity in the plain CGS unit of its dimension.
    pub fn to_cgs(&self) -> Result<Quantity> {
        let target = UnitExpression::cgs(self.dimension(), &self.registry)?;
        self.convert_to_expression(&target)
    }

    /// Sum in the left operand's unit.
    pub fn add(&self, other: &Quantity) -> Result<Quantity> {
        self.combine(other, "add", |a, b| a + b)
    }

    /// Difference in the left operand's unit.
    pub fn subtract(&self, other: &Quantity) -> Result<Quantity> {
        self.combine(other, "subtract", |a, b| a - b)
    }

    fn combine(&self, other: &Quantity, operation: &'static str, op: impl Fn(f64, f64) -> f64) -> Result<Quantity> {
        if self.dimension() != other.dimension() {
            return Err(UnitError::mismatch(operation, self.dimension(), other.dimension()));
        }
        let rhs = other.value * other.units.conversion_factor(&self.units)?;
        Ok(self.with_value(op(self.value, rhs)))
    }

    pub fn multiply(&self, other: &Quantity) -> Quantity {
        self.product(other, Rational::ONE)
    }

    pub fn divide(&self, other: &Quantity) -> Quantity {
        self.product(other, Rational::integer(-1))
    }

    fn product(&self, other: &Quantity, power: Rational) -> Quantity {
        let value = if power == Rational::ONE {
            self.value * other.value
        } else {
            self.value / other.value
        };
        let (value, units) = collapse(value, self.units.multiply(&other.units, power));
        Self {
            value,
            units,
            registry: Arc::clone(&self.registry),
        }
    }

    pub fn pow(&self, power: Rational) -> Quantity {
        let (value, units) = collapse(power.pow_f64(self.value), self.units.pow(power));
        Self {
            value,
            units,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Same unit, new value.
    pub fn with_value(&self, value: f64) -> Quantity {
        Self {
            value,
            units: self.units.clone(),
            registry: Arc::clone(&self.registry),
        }
    }

    /// Equality within `precision`, relative to the larger CGS magnitude.
    pub fn approx_eq(&self, other: &Quantity, precision: f64) -> bool {
        if self.dimension() != other.dimension() {
            return false;
        }
        let (a, b) = (self.cgs_value(), other.cgs_value());
        a == b || (a - b).abs() <= precision * a.abs().max(b.abs())
    }
}

/// A dimensionless product keeps its numeric meaning in the plain
/// `dimensionless` unit: `Mpc/Mpccm` becomes `(1 + z) dimensionless`.
pub(crate) fn collapse(value: f64, units: UnitExpression) -> (f64, UnitExpression) {
    if units.is_dimensionless() && !units.terms().is_empty() {
        (value * units.cgs_factor(), UnitExpression::dimensionless())
    } else {
        (value, units)
    }
}

/// Equal CGS values within the left registry's precision.
impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq(other, self.registry.precision())
    }
}

/// Ordered by CGS value; unordered when dimensions differ.
impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.dimension() != other.dimension() {
            return None;
        }
        if self == other {
            return Some(Ordering::Equal);
        }
        self.cgs_value().partial_cmp(&other.cgs_value())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.units)
    }
}

impl Mul<&Quantity> for &Quantity {
    type Output = Quantity;

    fn mul(self, rhs: &Quantity) -> Quantity {
        self.multiply(rhs)
    }
}

impl Div<&Quantity> for &Quantity {
    type Output = Quantity;

    fn div(self, rhs: &Quantity) -> Quantity {
        self.divide(rhs)
    }
}

impl Mul<f64> for &Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        self.with_value(self.value * rhs)
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(mut self, rhs: f64) -> Quantity {
        self.value *= rhs;
        self
    }
}

impl Div<f64> for &Quantity {
    type Output = Quantity;

    fn div(self, rhs: f64) -> Quantity {
        self.with_value(self.value / rhs)
    }
}

impl Div<f64> for Quantity {
    type Output = Quantity;

    fn div(mut self, rhs: f64) -> Quantity {
        self.value /= rhs;
        self
    }
}

impl Neg for &Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        self.with_value(-self.value)
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(mut self) -> Quantity {
        self.value = -self.value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::constants::PARSEC_CM;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs()
    }

    fn registry() -> Arc<UnitRegistry> {
        Arc::new(UnitRegistry::new())
    }

    #[test]
    fn test_convert_to() {
        let registry = registry();
        let q = Quantity::new(3.0, "kpc", &registry).unwrap();
        let pc = q.convert_to("pc").unwrap();
        assert!(close(pc.value(), 3000.0));
        assert_eq!(pc.units().to_string(), "pc");

        let err = q.convert_to("Myr").unwrap_err();
        assert!(matches!(err, UnitError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_to_cgs() {
        let registry = registry();
        let q = Quantity::new(2.0, "kpc", &registry).unwrap();
        let cgs = q.to_cgs().unwrap();
        assert!(close(cgs.value(), 2e3 * PARSEC_CM));
        assert_eq!(cgs.units().to_string(), "cm");

        let energy = Quantity::new(1.0, "J", &registry).unwrap().to_cgs().unwrap();
        assert_eq!(energy.value(), 1e7);
        assert_eq!(energy.units().to_string(), "erg");
    }

    #[test]
    fn test_add_uses_left_unit() {
        let registry = registry();
        let a = Quantity::new(1.0, "km", &registry).unwrap();
        let b = Quantity::new(500.0, "m", &registry).unwrap();
        let sum = a.add(&b).unwrap();
        assert!(close(sum.value(), 1.5));
        assert_eq!(sum.units().to_string(), "km");

        let diff = b.subtract(&a).unwrap();
        assert!(close(diff.value(), -500.0));

        let t = Quantity::new(1.0, "s", &registry).unwrap();
        assert_eq!(
            a.add(&t).unwrap_err(),
            UnitError::DimensionMismatch {
                operation: "add",
                left: Dimension::LENGTH,
                right: Dimension::TIME,
            }
        );
    }

    #[test]
    fn test_multiply_and_divide() {
        let registry = registry();
        let d = Quantity::new(10.0, "km", &registry).unwrap();
        let t = Quantity::new(2.0, "s", &registry).unwrap();

        let v = &d / &t;
        assert_eq!(v.value(), 5.0);
        assert_eq!(v.units().to_string(), "km/s");

        let area = &d * &d;
        assert_eq!(area.value(), 100.0);
        assert_eq!(area.units().to_string(), "km^2");
    }

    #[test]
    fn test_dimensionless_result_collapses() {
        let registry = registry();
        let a = Quantity::new(1.0, "km", &registry).unwrap();
        let b = Quantity::new(1.0, "m", &registry).unwrap();
        let ratio = &a / &b;
        assert!(ratio.units().terms().is_empty());
        assert!(close(ratio.value(), 1000.0));
        assert_eq!(ratio.to_string(), "1000 dimensionless");
    }

    #[test]
    fn test_equality_across_units() {
        let registry = registry();
        let a = Quantity::new(1.0, "km", &registry).unwrap();
        let b = Quantity::new(1e5, "cm", &registry).unwrap();
        let c = Quantity::new(1.0, "s", &registry).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(Quantity::new(2.0, "km", &registry).unwrap() > b);
        assert_eq!(a.partial_cmp(&c), None);
    }

    #[test]
    fn test_scalar_ops() {
        let registry = registry();
        let q = Quantity::new(4.0, "Msun", &registry).unwrap();
        assert_eq!((&q * 2.0).value(), 8.0);
        assert_eq!((&q / 2.0).value(), 2.0);
        assert_eq!((-&q).value(), -4.0);
        assert_eq!((q.clone() * 0.5).units().to_string(), "Msun");

        let sq = q.pow(Rational::HALF);
        assert!(close(sq.value(), 2.0));
        assert_eq!(sq.units().to_string(), "Msun^(1/2)");
    }

    #[test]
    fn test_conversion_sees_later_redshift() {
        let mut inner = UnitRegistry::new();
        inner.add_comoving_and_hubble(0.7).unwrap();
        let registry = Arc::new(inner);

        let q = Quantity::new(1.0, "Mpccm", &registry).unwrap();
        assert!(close(q.in_units("Mpc").unwrap(), 1.0));

        registry.set_redshift(1.0).unwrap();
        assert!(close(q.in_units("Mpc").unwrap(), 0.5));
    }
}
