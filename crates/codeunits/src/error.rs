//! Unit system errors

use codeunits_types::Dimension;
use thiserror::Error;

/// Unit system result type
pub type Result<T> = std::result::Result<T, UnitError>;

/// Unit system errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("unknown unit symbol '{symbol}'")]
    UnknownUnit { symbol: String },

    #[error("unit symbol '{symbol}' is already registered with a different definition")]
    DuplicateSymbol { symbol: String },

    #[error("cannot {operation} {left} and {right}: dimensions differ")]
    DimensionMismatch {
        operation: &'static str,
        left: Dimension,
        right: Dimension,
    },

    #[error("unit expression is empty")]
    EmptyUnitExpression,

    #[error("malformed unit expression '{expression}': {reason}")]
    MalformedUnitExpression { expression: String, reason: String },

    #[error("'{key}' is not a recognized unit override key")]
    InvalidOverrideKey { key: String },

    #[error("invalid override for {key}: expected dimension {expected}, got {found}")]
    InvalidOverride {
        key: String,
        expected: Dimension,
        found: Dimension,
    },

    #[error("factor for '{symbol}' must be positive and finite, got {factor}")]
    NonPositiveFactor { symbol: String, factor: f64 },

    #[error("invalid cosmology: {reason}")]
    InvalidCosmology { reason: String },

    #[error("array shapes differ: {left} vs {right} elements")]
    ShapeMismatch { left: usize, right: usize },
}

impl UnitError {
    pub(crate) fn unknown(symbol: impl Into<String>) -> Self {
        Self::UnknownUnit {
            symbol: symbol.into(),
        }
    }

    pub(crate) fn malformed(expression: &str, reason: impl Into<String>) -> Self {
        Self::MalformedUnitExpression {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(operation: &'static str, left: Dimension, right: Dimension) -> Self {
        Self::DimensionMismatch {
            operation,
            left,
            right,
        }
    }
}
