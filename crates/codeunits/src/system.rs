//! Dataset-level unit system.
//!
//! [`UnitSystem`] owns the registry a dataset's quantities are bound to. The
//! registry is published through an `Arc` and never mutated in place once
//! published: an override builds a new registry and swaps it in. Quantities
//! made before the swap keep the registry they were built on. The cosmology
//! handle is carried across the swap, so a later redshift update reaches old
//! and new quantities alike.

use std::sync::Arc;

use tracing::info;

use crate::array::QuantityArray;
use crate::cosmology::CosmologyContext;
use crate::error::Result;
use crate::overrides::{CodeUnitBases, OverrideResolver, OverrideState, UnitOverrides};
use crate::quantity::Quantity;
use crate::registry::UnitRegistry;

/// A dataset's bound registry plus convenience constructors.
#[derive(Debug, Clone)]
pub struct UnitSystem {
    name: String,
    registry: Arc<UnitRegistry>,
    override_state: OverrideState,
}

impl UnitSystem {
    /// Non-cosmological system with code units derived from `bases`.
    pub fn new(name: impl Into<String>, bases: &CodeUnitBases) -> Result<Self> {
        let mut registry = UnitRegistry::new();
        registry.derive_code_units(bases)?;
        Ok(Self::bind(name.into(), registry))
    }

    /// Cosmological system: comoving variants and `h` are registered and the
    /// redshift is set before the bases are resolved, so bases may be given
    /// in units such as `Mpccm/h`.
    pub fn cosmological(
        name: impl Into<String>,
        bases: &CodeUnitBases,
        cosmology: CosmologyContext,
    ) -> Result<Self> {
        cosmology.validate()?;
        let mut registry = UnitRegistry::new();
        registry.add_comoving_and_hubble(cosmology.hubble_constant)?;
        registry.set_redshift(cosmology.redshift)?;
        registry.derive_code_units(bases)?;
        Ok(Self::bind(name.into(), registry))
    }

    /// Wrap an existing registry.
    pub fn from_registry(name: impl Into<String>, registry: UnitRegistry) -> Self {
        Self::bind(name.into(), registry)
    }

    fn bind(name: String, registry: UnitRegistry) -> Self {
        info!(
            system = %name,
            symbols = registry.symbols().count(),
            cosmological = registry.has_cosmology(),
            "unit system bound"
        );
        Self {
            name,
            registry: Arc::new(registry),
            override_state: OverrideState::Unbound,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry new quantities bind to.
    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.registry
    }

    pub fn quantity(&self, value: f64, units: &str) -> Result<Quantity> {
        Quantity::new(value, units, &self.registry)
    }

    pub fn array(&self, values: impl Into<Vec<f64>>, units: &str) -> Result<QuantityArray> {
        QuantityArray::new(values, units, &self.registry)
    }

    /// One `code_length`, in CGS.
    pub fn length_unit(&self) -> Result<Quantity> {
        self.code_unit("code_length")
    }

    pub fn mass_unit(&self) -> Result<Quantity> {
        self.code_unit("code_mass")
    }

    pub fn time_unit(&self) -> Result<Quantity> {
        self.code_unit("code_time")
    }

    pub fn velocity_unit(&self) -> Result<Quantity> {
        self.code_unit("code_velocity")
    }

    pub fn magnetic_unit(&self) -> Result<Quantity> {
        self.code_unit("code_magnetic")
    }

    pub fn temperature_unit(&self) -> Result<Quantity> {
        self.code_unit("code_temperature")
    }

    fn code_unit(&self, symbol: &str) -> Result<Quantity> {
        self.quantity(1.0, symbol)?.to_cgs()
    }

    pub fn redshift(&self) -> f64 {
        self.registry.cosmology().redshift()
    }

    /// Update the redshift seen by every quantity of this system.
    pub fn set_redshift(&self, redshift: f64) -> Result<()> {
        self.registry.set_redshift(redshift)?;
        info!(system = %self.name, redshift, "redshift set");
        Ok(())
    }

    /// Replace the code units from an override mapping.
    ///
    /// The new registry is built on a copy and published only on success.
    /// An empty mapping changes nothing, including [`UnitSystem::override_state`].
    pub fn override_code_units(&mut self, overrides: &UnitOverrides) -> Result<()> {
        if overrides.is_empty() {
            return Ok(());
        }

        let mut registry = UnitRegistry::clone(&self.registry);
        let mut resolver = OverrideResolver::new(overrides);
        let outcome = resolver.bind(&mut registry);
        self.override_state = resolver.state().clone();
        outcome?;

        if self.override_state == OverrideState::Bound {
            self.registry = Arc::new(registry);
            info!(system = %self.name, keys = overrides.len(), "code units overridden");
        }
        Ok(())
    }

    /// Outcome of the most recent override.
    pub fn override_state(&self) -> &OverrideState {
        &self.override_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnitError;
    use crate::symbols::constants::PARSEC_CM;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs()
    }

    fn bases() -> CodeUnitBases {
        CodeUnitBases::new((1.0, "Mpc"), (1.0e14, "Msun"), (1.0, "Myr"))
    }

    #[test]
    fn test_unit_accessors_are_cgs() {
        let system = UnitSystem::new("box", &bases()).unwrap();
        let length = system.length_unit().unwrap();
        assert_eq!(length.units().to_string(), "cm");
        assert!(close(length.value(), 1e6 * PARSEC_CM));

        let magnetic = system.magnetic_unit().unwrap();
        assert_eq!(magnetic.units().to_string(), "G");

        let temperature = system.temperature_unit().unwrap();
        assert_eq!(temperature.value(), 1.0);
        assert_eq!(temperature.units().to_string(), "K");

        let velocity = system.velocity_unit().unwrap();
        assert_eq!(velocity.units().to_string(), "cm/s");
    }

    #[test]
    fn test_cosmological_bases_use_comoving_units() {
        let context = CosmologyContext::new(1.0, 0.5).unwrap();
        let bases = CodeUnitBases::new((1.0, "Mpccm/h"), (1.0, "Msun/h"), (1.0, "Myr"));
        let system = UnitSystem::cosmological("box", &bases, context).unwrap();

        // 1 Mpccm/h at z = 1, h = 0.5 is 1 physical Mpc
        let length = system.length_unit().unwrap();
        assert!(close(length.value(), 1e6 * PARSEC_CM));
        assert!(close(system.quantity(1.0, "code_length").unwrap().in_units("Mpc").unwrap(), 1.0));
    }

    #[test]
    fn test_override_swaps_registry() {
        let mut system = UnitSystem::new("box", &bases()).unwrap();
        let before = system.quantity(1.0, "code_length").unwrap();

        let overrides = UnitOverrides::new().with("length_unit", (2.0, "Mpc"));
        system.override_code_units(&overrides).unwrap();
        assert_eq!(system.override_state(), &OverrideState::Bound);

        let after = system.quantity(1.0, "code_length").unwrap();
        assert!(close(after.in_units("Mpc").unwrap(), 2.0));
        assert!(close(before.in_units("Mpc").unwrap(), 1.0));
        assert!(!Arc::ptr_eq(before.registry(), system.registry()));
    }

    #[test]
    fn test_empty_override_keeps_bound_state() {
        let mut system = UnitSystem::new("box", &bases()).unwrap();
        system
            .override_code_units(&UnitOverrides::new().with("length_unit", (2.0, "Mpc")))
            .unwrap();
        let registry = Arc::clone(system.registry());

        system.override_code_units(&UnitOverrides::new()).unwrap();
        assert_eq!(system.override_state(), &OverrideState::Bound);
        assert!(Arc::ptr_eq(&registry, system.registry()));
        assert!(close(system.length_unit().unwrap().in_units("Mpc").unwrap(), 2.0));
    }

    #[test]
    fn test_rejected_override_keeps_registry() {
        let mut system = UnitSystem::new("box", &bases()).unwrap();
        let registry = Arc::clone(system.registry());

        let overrides = UnitOverrides::new()
            .with("mass_unit", (1.0, "Msun"))
            .with("time_unit", (1.0, "Mpc"));
        let err = system.override_code_units(&overrides).unwrap_err();
        assert!(matches!(err, UnitError::InvalidOverride { .. }));
        assert!(matches!(system.override_state(), OverrideState::Rejected(_)));
        assert!(Arc::ptr_eq(&registry, system.registry()));
    }

    #[test]
    fn test_redshift_reaches_existing_quantities() {
        let context = CosmologyContext::new(0.0, 0.7).unwrap();
        let mut system = UnitSystem::cosmological("box", &bases(), context).unwrap();
        let q = system.quantity(1.0, "Mpccm").unwrap();

        system
            .override_code_units(&UnitOverrides::new().with("mass_unit", (1.0, "Msun")))
            .unwrap();
        system.set_redshift(3.0).unwrap();

        assert_eq!(system.redshift(), 3.0);
        assert!(close(q.in_units("Mpc").unwrap(), 0.25));
    }
}
