//! Arrays of values sharing one unit.

use std::fmt;
use std::ops::{Mul, Neg};
use std::sync::Arc;

use codeunits_types::{Dimension, Rational};

use crate::error::{Result, UnitError};
use crate::expr::UnitExpression;
use crate::quantity::{collapse, Quantity};
use crate::registry::UnitRegistry;

/// A vector of values with a single unit.
#[derive(Debug, Clone)]
pub struct QuantityArray {
    values: Vec<f64>,
    units: UnitExpression,
    registry: Arc<UnitRegistry>,
}

impl QuantityArray {
    pub fn new(values: impl Into<Vec<f64>>, units: &str, registry: &Arc<UnitRegistry>) -> Result<Self> {
        let units = registry.parse(units)?;
        Ok(Self::from_expression(values, units, registry))
    }

    pub fn from_expression(
        values: impl Into<Vec<f64>>,
        units: UnitExpression,
        registry: &Arc<UnitRegistry>,
    ) -> Self {
        Self {
            values: values.into(),
            units,
            registry: Arc::clone(registry),
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
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

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Element `index` as a [`Quantity`].
    pub fn get(&self, index: usize) -> Option<Quantity> {
        self.values
            .get(index)
            .map(|value| Quantity::from_expression(*value, self.units.clone(), &self.registry))
    }

    pub fn iter(&self) -> impl Iterator<Item = Quantity> + '_ {
        self.values
            .iter()
            .map(|value| Quantity::from_expression(*value, self.units.clone(), &self.registry))
    }

    pub fn convert_to(&self, units: &str) -> Result<QuantityArray> {
        let target = self.registry.parse(units)?;
        self.convert_to_expression(&target)
    }

    /// One ratio for the whole array.
    pub fn convert_to_expression(&self, target: &UnitExpression) -> Result<QuantityArray> {
        let ratio = self.units.conversion_factor(target)?;
        Ok(Self {
            values: self.values.iter().map(|value| value * ratio).collect(),
            units: target.clone(),
            registry: Arc::clone(&self.registry),
        })
    }

    pub fn in_units(&self, units: &str) -> Result<Vec<f64>> {
        Ok(self.convert_to(units)?.values)
    }

    pub fn to_cgs(&self) -> Result<QuantityArray> {
        let target = UnitExpression::cgs(self.dimension(), &self.registry)?;
        self.convert_to_expression(&target)
    }

    pub fn add(&self, other: &QuantityArray) -> Result<QuantityArray> {
        self.combine(other, "add", |a, b| a + b)
    }

    pub fn subtract(&self, other: &QuantityArray) -> Result<QuantityArray> {
        self.combine(other, "subtract", |a, b| a - b)
    }

    fn combine(
        &self,
        other: &QuantityArray,
        operation: &'static str,
        op: impl Fn(f64, f64) -> f64,
    ) -> Result<QuantityArray> {
        self.check_shape(other)?;
        if self.dimension() != other.dimension() {
            return Err(UnitError::mismatch(operation, self.dimension(), other.dimension()));
        }
        let ratio = other.units.conversion_factor(&self.units)?;
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| op(*a, b * ratio))
            .collect::<Vec<_>>();
        Ok(self.with_values(values))
    }

    /// Element-wise product.
    pub fn multiply(&self, other: &QuantityArray) -> Result<QuantityArray> {
        self.check_shape(other)?;
        let values = self.values.iter().zip(&other.values).map(|(a, b)| a * b).collect();
        Ok(self.product(values, &other.units, Rational::ONE))
    }

    /// Element-wise quotient.
    pub fn divide(&self, other: &QuantityArray) -> Result<QuantityArray> {
        self.check_shape(other)?;
        let values = self.values.iter().zip(&other.values).map(|(a, b)| a / b).collect();
        Ok(self.product(values, &other.units, Rational::integer(-1)))
    }

    /// Multiply every element by a quantity.
    pub fn multiply_quantity(&self, other: &Quantity) -> QuantityArray {
        let values = self.values.iter().map(|a| a * other.value()).collect();
        self.product(values, other.units(), Rational::ONE)
    }

    fn product(&self, values: Vec<f64>, units: &UnitExpression, power: Rational) -> QuantityArray {
        let (scale, units) = collapse(1.0, self.units.multiply(units, power));
        Self {
            values: values.into_iter().map(|value| value * scale).collect(),
            units,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Multiply every element by a plain number.
    pub fn scale(&self, factor: f64) -> QuantityArray {
        self.with_values(self.values.iter().map(|value| value * factor).collect())
    }

    pub fn sum(&self) -> Quantity {
        Quantity::from_expression(self.values.iter().sum(), self.units.clone(), &self.registry)
    }

    fn with_values(&self, values: Vec<f64>) -> QuantityArray {
        Self {
            values,
            units: self.units.clone(),
            registry: Arc::clone(&self.registry),
        }
    }

    fn check_shape(&self, other: &QuantityArray) -> Result<()> {
        if self.len() == other.len() {
            Ok(())
        } else {
            Err(UnitError::ShapeMismatch {
                left: self.len(),
                right: other.len(),
            })
        }
    }
}

/// Same length and element-wise equal in CGS.
impl PartialEq for QuantityArray {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for QuantityArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "] {}", self.units)
    }
}

impl Mul<f64> for &QuantityArray {
    type Output = QuantityArray;

    fn mul(self, rhs: f64) -> QuantityArray {
        self.scale(rhs)
    }
}

impl Neg for &QuantityArray {
    type Output = QuantityArray;

    fn neg(self) -> QuantityArray {
        self.scale(-1.0)
    }
}
