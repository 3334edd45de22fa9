//! Code-unit bases and dataset-level unit overrides.
//!
//! A dataset declares its base units (length, mass, time, and optionally
//! magnetic field and temperature). Each base is given as a bare CGS number,
//! a `(value, unit)` pair, or an existing [`Quantity`]. The registry derives
//! the whole `code_*` family from them.
//!
//! An override mapping replaces some of those bases after the fact. The
//! [`OverrideResolver`] walks `Unbound → Resolving → Bound | Rejected`. Every
//! key and value is validated before the registry is touched, so a rejected
//! override leaves the previous code units in place.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use codeunits_types::Dimension;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, UnitError};
use crate::quantity::Quantity;
use crate::registry::UnitRegistry;

/// Keys accepted in a base-unit or override mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideKey {
    LengthUnit,
    TimeUnit,
    MassUnit,
    MagneticUnit,
    TemperatureUnit,
}

impl OverrideKey {
    pub const ALL: [OverrideKey; 5] = [
        OverrideKey::LengthUnit,
        OverrideKey::TimeUnit,
        OverrideKey::MassUnit,
        OverrideKey::MagneticUnit,
        OverrideKey::TemperatureUnit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OverrideKey::LengthUnit => "length_unit",
            OverrideKey::TimeUnit => "time_unit",
            OverrideKey::MassUnit => "mass_unit",
            OverrideKey::MagneticUnit => "magnetic_unit",
            OverrideKey::TemperatureUnit => "temperature_unit",
        }
    }

    /// Dimension a value for this key must carry.
    pub fn dimension(self) -> Dimension {
        match self {
            OverrideKey::LengthUnit => Dimension::LENGTH,
            OverrideKey::TimeUnit => Dimension::TIME,
            OverrideKey::MassUnit => Dimension::MASS,
            OverrideKey::MagneticUnit => Dimension::MAGNETIC_FIELD,
            OverrideKey::TemperatureUnit => Dimension::TEMPERATURE,
        }
    }
}

impl FromStr for OverrideKey {
    type Err = UnitError;

    fn from_str(key: &str) -> Result<Self> {
        OverrideKey::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == key)
            .ok_or_else(|| UnitError::InvalidOverrideKey {
                key: key.to_string(),
            })
    }
}

impl fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A base-unit value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitValue {
    /// Already in CGS for the key's dimension.
    Cgs(f64),
    /// A number and a unit string, e.g. `[1.0, "Mpc"]`.
    Pair(f64, String),
    /// A quantity built elsewhere.
    #[serde(skip)]
    Quantity(Quantity),
}

impl UnitValue {
    /// Resolve to a positive CGS factor carrying `key`'s dimension.
    pub fn resolve(&self, key: OverrideKey, registry: &UnitRegistry) -> Result<f64> {
        let (factor, found) = match self {
            UnitValue::Cgs(value) => (*value, key.dimension()),
            UnitValue::Pair(value, units) => {
                let expr = registry.parse(units)?;
                (value * expr.cgs_factor(), expr.dimension())
            }
            UnitValue::Quantity(quantity) => (quantity.cgs_value(), quantity.dimension()),
        };

        if found != key.dimension() {
            return Err(UnitError::InvalidOverride {
                key: key.as_str().to_string(),
                expected: key.dimension(),
                found,
            });
        }
        if !(factor.is_finite() && factor > 0.0) {
            return Err(UnitError::NonPositiveFactor {
                symbol: key.as_str().to_string(),
                factor,
            });
        }
        Ok(factor)
    }
}

impl From<f64> for UnitValue {
    fn from(value: f64) -> Self {
        UnitValue::Cgs(value)
    }
}

impl From<(f64, &str)> for UnitValue {
    fn from((value, units): (f64, &str)) -> Self {
        UnitValue::Pair(value, units.to_string())
    }
}

impl From<(f64, String)> for UnitValue {
    fn from((value, units): (f64, String)) -> Self {
        UnitValue::Pair(value, units)
    }
}

impl From<Quantity> for UnitValue {
    fn from(quantity: Quantity) -> Self {
        UnitValue::Quantity(quantity)
    }
}

/// Ordered key → value mapping, as written by a user.
///
/// Keys stay strings until resolution so that unknown keys can be reported
/// instead of silently dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitOverrides(IndexMap<String, UnitValue>);

impl UnitOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<UnitValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<UnitValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnitValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Parse every key, failing on the first unknown one.
    pub fn keyed(&self) -> Result<Vec<(OverrideKey, &UnitValue)>> {
        self.iter()
            .map(|(key, value)| Ok((key.parse::<OverrideKey>()?, value)))
            .collect()
    }
}

/// Declared base units of a dataset.
#[derive(Debug, Clone)]
pub struct CodeUnitBases {
    pub length: UnitValue,
    pub mass: UnitValue,
    pub time: UnitValue,
    /// Defaults to `sqrt(4π · M / (L · T²))` gauss.
    pub magnetic: Option<UnitValue>,
    /// Defaults to 1 K.
    pub temperature: Option<UnitValue>,
}

impl Default for CodeUnitBases {
    /// 1 cm, 1 g, 1 s.
    fn default() -> Self {
        Self {
            length: UnitValue::Cgs(1.0),
            mass: UnitValue::Cgs(1.0),
            time: UnitValue::Cgs(1.0),
            magnetic: None,
            temperature: None,
        }
    }
}

impl CodeUnitBases {
    pub fn new(
        length: impl Into<UnitValue>,
        mass: impl Into<UnitValue>,
        time: impl Into<UnitValue>,
    ) -> Self {
        Self {
            length: length.into(),
            mass: mass.into(),
            time: time.into(),
            magnetic: None,
            temperature: None,
        }
    }

    pub fn with_magnetic(mut self, magnetic: impl Into<UnitValue>) -> Self {
        self.magnetic = Some(magnetic.into());
        self
    }

    pub fn with_temperature(mut self, temperature: impl Into<UnitValue>) -> Self {
        self.temperature = Some(temperature.into());
        self
    }

    /// Build from a key → value mapping; absent keys keep their defaults.
    pub fn from_mapping(mapping: &UnitOverrides) -> Result<Self> {
        let mut bases = Self::default();
        for (key, value) in mapping.keyed()? {
            bases.set(key, value.clone());
        }
        Ok(bases)
    }

    pub fn set(&mut self, key: OverrideKey, value: UnitValue) {
        match key {
            OverrideKey::LengthUnit => self.length = value,
            OverrideKey::TimeUnit => self.time = value,
            OverrideKey::MassUnit => self.mass = value,
            OverrideKey::MagneticUnit => self.magnetic = Some(value),
            OverrideKey::TemperatureUnit => self.temperature = Some(value),
        }
    }

    /// Resolve every base to CGS against `registry`.
    pub fn resolve(&self, registry: &UnitRegistry) -> Result<ResolvedBases> {
        let optional = |value: &Option<UnitValue>, key| {
            value
                .as_ref()
                .map(|value| value.resolve(key, registry))
                .transpose()
        };

        Ok(ResolvedBases {
            length: self.length.resolve(OverrideKey::LengthUnit, registry)?,
            mass: self.mass.resolve(OverrideKey::MassUnit, registry)?,
            time: self.time.resolve(OverrideKey::TimeUnit, registry)?,
            magnetic: optional(&self.magnetic, OverrideKey::MagneticUnit)?,
            temperature: optional(&self.temperature, OverrideKey::TemperatureUnit)?,
        })
    }
}

/// Base units resolved to CGS factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedBases {
    pub length: f64,
    pub mass: f64,
    pub time: f64,
    pub magnetic: Option<f64>,
    pub temperature: Option<f64>,
}

impl Default for ResolvedBases {
    fn default() -> Self {
        Self {
            length: 1.0,
            mass: 1.0,
            time: 1.0,
            magnetic: None,
            temperature: None,
        }
    }
}

impl ResolvedBases {
    pub fn set(&mut self, key: OverrideKey, factor: f64) {
        match key {
            OverrideKey::LengthUnit => self.length = factor,
            OverrideKey::TimeUnit => self.time = factor,
            OverrideKey::MassUnit => self.mass = factor,
            OverrideKey::MagneticUnit => self.magnetic = Some(factor),
            OverrideKey::TemperatureUnit => self.temperature = Some(factor),
        }
    }

    /// Magnetic unit, explicit or derived from the mechanical bases.
    pub fn magnetic_factor(&self) -> f64 {
        self.magnetic.unwrap_or_else(|| {
            (4.0 * PI * self.mass / (self.length * self.time * self.time)).sqrt()
        })
    }

    /// Every `code_*` symbol with its factor and dimension, validated.
    pub fn code_entries(&self) -> Result<Vec<(&'static str, f64, Dimension)>> {
        let (l, m, t) = (self.length, self.mass, self.time);
        let dim = Dimension::from_exponents;
        let entries = vec![
            ("code_length", l, Dimension::LENGTH),
            ("code_mass", m, Dimension::MASS),
            ("code_time", t, Dimension::TIME),
            ("code_velocity", l / t, dim([1, 0, -1, 0, 0, 0, 0])),
            ("code_density", m / (l * l * l), dim([-3, 1, 0, 0, 0, 0, 0])),
            ("code_pressure", m / (l * t * t), dim([-1, 1, -2, 0, 0, 0, 0])),
            ("code_energy", m * l * l / (t * t), dim([2, 1, -2, 0, 0, 0, 0])),
            ("code_specific_energy", l * l / (t * t), dim([2, 0, -2, 0, 0, 0, 0])),
            ("code_magnetic", self.magnetic_factor(), Dimension::MAGNETIC_FIELD),
            (
                "code_temperature",
                self.temperature.unwrap_or(1.0),
                Dimension::TEMPERATURE,
            ),
        ];

        for (symbol, factor, _) in &entries {
            if !(factor.is_finite() && *factor > 0.0) {
                return Err(UnitError::NonPositiveFactor {
                    symbol: symbol.to_string(),
                    factor: *factor,
                });
            }
        }
        Ok(entries)
    }
}

/// Progress of an override application.
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideState {
    /// Nothing applied; the registry keeps its default derivation.
    Unbound,
    /// Keys and values are being validated.
    Resolving,
    /// Code units replaced.
    Bound,
    /// Validation failed; the registry was not modified.
    Rejected(UnitError),
}

impl OverrideState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OverrideState::Bound | OverrideState::Rejected(_))
    }
}

/// Applies one override mapping to a registry.
#[derive(Debug)]
pub struct OverrideResolver<'a> {
    overrides: &'a UnitOverrides,
    state: OverrideState,
}

impl<'a> OverrideResolver<'a> {
    pub fn new(overrides: &'a UnitOverrides) -> Self {
        Self {
            overrides,
            state: OverrideState::Unbound,
        }
    }

    pub fn state(&self) -> &OverrideState {
        &self.state
    }

    /// Validate the mapping and, on success, re-derive `registry`'s code
    /// units from its current bases with the overridden keys replaced.
    ///
    /// An empty mapping leaves the resolver `Unbound`. Once terminal, calling
    /// again reports the same outcome without touching the registry.
    pub fn bind(&mut self, registry: &mut UnitRegistry) -> Result<()> {
        match &self.state {
            OverrideState::Bound => return Ok(()),
            OverrideState::Rejected(err) => return Err(err.clone()),
            OverrideState::Unbound | OverrideState::Resolving => {}
        }
        if self.overrides.is_empty() {
            return Ok(());
        }

        self.state = OverrideState::Resolving;
        let outcome = self
            .resolve(registry)
            .and_then(|bases| registry.install_code_units(bases));

        match outcome {
            Ok(()) => {
                debug!(keys = self.overrides.len(), "unit overrides bound");
                self.state = OverrideState::Bound;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "unit overrides rejected");
                self.state = OverrideState::Rejected(err.clone());
                Err(err)
            }
        }
    }

    fn resolve(&self, registry: &UnitRegistry) -> Result<ResolvedBases> {
        let mut bases = registry.code_bases().copied().unwrap_or_default();
        for (key, value) in self.overrides.keyed()? {
            let factor = value.resolve(key, registry)?;
            debug!(key = %key, factor, "override resolved");
            bases.set(key, factor);
        }
        Ok(bases)
    }
}

impl UnitRegistry {
    /// Replace the code units using an override mapping.
    ///
    /// All-or-nothing: on error the registry keeps its previous code units.
    pub fn override_code_units(&mut self, overrides: &UnitOverrides) -> Result<()> {
        OverrideResolver::new(overrides).bind(self)
    }
}
