// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Physical units for simulation datasets.
//!
//! A [`UnitRegistry`] maps symbols to a CGS factor and a [`Dimension`]. On
//! top of the default table a dataset registers its `code_*` units, and a
//! cosmological dataset adds comoving `…cm` lengths and the reduced Hubble
//! symbol `h`. Unit strings are parsed into a [`UnitExpression`] before any
//! value is computed, and [`Quantity`] / [`QuantityArray`] carry a value
//! together with its unit and registry.
//!
//! ```
//! use std::sync::Arc;
//! use codeunits::{Quantity, UnitRegistry};
//!
//! let mut registry = UnitRegistry::new();
//! registry.add_comoving_and_hubble(0.7).unwrap();
//! registry.set_redshift(1.0).unwrap();
//! let registry = Arc::new(registry);
//!
//! let physical = Quantity::new(1.0, "Mpc", &registry).unwrap();
//! let comoving = Quantity::new(1.0, "Mpccm", &registry).unwrap();
//! assert_eq!((&physical / &comoving).value(), 2.0);
//! ```
//!
//! ## Modules
//!
//! - [`registry`] - symbol table, code-unit derivation, comoving variants
//! - [`expr`] - unit-string parser and [`UnitExpression`]
//! - [`overrides`] - code-unit bases and override resolution
//! - [`system`] - dataset-level [`UnitSystem`]
//! - [`config`] - YAML unit system descriptions

pub mod array;
pub mod config;
pub mod cosmology;
pub mod error;
pub mod expr;
pub mod lexer;
pub mod overrides;
pub mod quantity;
pub mod registry;
pub mod symbols;
pub mod system;

pub use array::QuantityArray;
pub use codeunits_types::{Dimension, Rational};
pub use config::{ConfigError, UnitSystemConfig};
pub use cosmology::{Cosmology, CosmologyContext};
pub use error::{Result, UnitError};
pub use expr::UnitExpression;
pub use overrides::{CodeUnitBases, OverrideKey, OverrideResolver, OverrideState, UnitOverrides, UnitValue};
pub use quantity::Quantity;
pub use registry::{factor, Scaling, UnitEntry, UnitRegistry};
pub use system::UnitSystem;
