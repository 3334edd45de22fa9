//! Convenience imports.
//!
//! ```rust
//! use codeunits_types::prelude::*;
//!
//! let area = LENGTH.pow(Rational::integer(2));
//! assert_eq!(area.length, Rational::integer(2));
//! ```

pub use crate::dimension::{Dimension, BASE_SYMBOLS};
pub use crate::rational::Rational;

pub const DIMENSIONLESS: Dimension = Dimension::DIMENSIONLESS;
pub const LENGTH: Dimension = Dimension::LENGTH;
pub const MASS: Dimension = Dimension::MASS;
pub const TIME: Dimension = Dimension::TIME;
pub const TEMPERATURE: Dimension = Dimension::TEMPERATURE;
pub const MAGNETIC_FIELD: Dimension = Dimension::MAGNETIC_FIELD;
