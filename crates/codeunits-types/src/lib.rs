// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Value types shared by the codeunits crates.
//!
//! - [`Rational`]: exact, normalized exponents
//! - [`Dimension`]: exponent vector over length, mass, time, temperature,
//!   angle, current and luminous intensity
//!
//! Nothing here knows about unit symbols or scale factors. Those belong to
//! the registry in the `codeunits` crate.

pub mod dimension;
pub mod prelude;
pub mod rational;

pub use dimension::Dimension;
pub use rational::Rational;
