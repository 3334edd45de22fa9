//! Unit registry: symbol → (CGS factor, dimension).
//!
//! A registry starts from the [default symbol table](crate::symbols) and can
//! be extended three ways:
//!
//! - [`UnitRegistry::register`] for individual symbols
//! - [`UnitRegistry::derive_code_units`] for the `code_*` family of a dataset
//! - [`UnitRegistry::add_comoving_and_hubble`] for `…cm` comoving variants and
//!   the reduced Hubble symbol `h`
//!
//! Multi-entry updates validate everything before touching the table, so a
//! failure leaves the registry exactly as it was.
//!
//! # Lookup
//!
//! [`UnitRegistry::lookup`] tries an exact match first and then SI-prefix
//! decomposition on prefixable symbols. Comoving variants inherit the
//! prefixability of their physical symbol, so `Mpccm` is `M` + `pccm`.

use std::sync::{Arc, OnceLock};

use codeunits_types::Dimension;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::cosmology::{Cosmology, CosmologyContext};
use crate::error::{Result, UnitError};
use crate::expr::UnitExpression;
use crate::overrides::{CodeUnitBases, ResolvedBases};
use crate::symbols::{prefix_splits, DEFAULT_SYMBOLS};

/// Default relative precision for comparing CGS-normalized values.
pub const DEFAULT_PRECISION: f64 = 1e-12;

/// Suffix marking a comoving length symbol.
pub const COMOVING_SUFFIX: &str = "cm";

/// Prefix shared by all simulation code units.
pub const CODE_PREFIX: &str = "code_";

/// Symbol of the reduced Hubble parameter.
pub const HUBBLE_SYMBOL: &str = "h";

/// How a symbol's factor depends on the cosmology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scaling {
    /// Factor is the stored CGS factor.
    Fixed,
    /// Comoving length: stored physical factor divided by `1 + z`.
    Comoving,
    /// Reduced Hubble parameter: factor is the current `h`.
    Hubble,
}

/// A registered (or prefix-resolved) symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitEntry {
    /// CGS factor. For comoving symbols this is the physical factor; for `h`
    /// it records the value given at registration while conversions read the
    /// live value from the cosmology.
    pub cgs_factor: f64,
    pub dimension: Dimension,
    pub scaling: Scaling,
    /// Whether SI prefixes may be attached.
    pub prefixable: bool,
}

impl UnitEntry {
    pub fn fixed(cgs_factor: f64, dimension: Dimension) -> Self {
        Self {
            cgs_factor,
            dimension,
            scaling: Scaling::Fixed,
            prefixable: false,
        }
    }

    pub fn prefixable(mut self) -> Self {
        self.prefixable = true;
        self
    }

    /// CGS factor under `cosmology`.
    pub fn factor(&self, cosmology: &CosmologyContext) -> f64 {
        factor(self, cosmology)
    }
}

/// Evaluate the CGS factor of `entry` for the given cosmology.
pub fn factor(entry: &UnitEntry, cosmology: &CosmologyContext) -> f64 {
    match entry.scaling {
        Scaling::Fixed => entry.cgs_factor,
        Scaling::Comoving => entry.cgs_factor / (1.0 + cosmology.redshift),
        Scaling::Hubble => cosmology.hubble_constant,
    }
}

fn check_factor(symbol: &str, factor: f64) -> Result<()> {
    if factor.is_finite() && factor > 0.0 {
        Ok(())
    } else {
        Err(UnitError::NonPositiveFactor {
            symbol: symbol.to_string(),
            factor,
        })
    }
}

/// Symbol table plus the cosmology its comoving symbols read.
///
/// `Clone` shares the cosmology handle, which is what a dataset wants when it
/// swaps in a re-derived copy of its own registry. Use [`UnitRegistry::fork`]
/// for an independent registry.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    symbols: IndexMap<String, UnitEntry>,
    code_bases: Option<ResolvedBases>,
    cosmology: Cosmology,
    precision: f64,
}

static DEFAULT_REGISTRY: OnceLock<Arc<UnitRegistry>> = OnceLock::new();

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    /// Registry holding the default symbol table.
    pub fn new() -> Self {
        let symbols = DEFAULT_SYMBOLS
            .iter()
            .map(|def| {
                let entry = UnitEntry {
                    cgs_factor: def.cgs_factor,
                    dimension: def.dimension,
                    scaling: Scaling::Fixed,
                    prefixable: def.prefixable,
                };
                (def.symbol.to_string(), entry)
            })
            .collect();

        Self {
            symbols,
            code_bases: None,
            cosmology: Cosmology::default(),
            precision: DEFAULT_PRECISION,
        }
    }

    /// Registry with no symbols at all.
    pub fn empty() -> Self {
        Self {
            symbols: IndexMap::new(),
            code_bases: None,
            cosmology: Cosmology::default(),
            precision: DEFAULT_PRECISION,
        }
    }

    /// Process-wide default registry.
    ///
    /// Built once on first use and never mutated. Dataset registries are
    /// separate instances.
    pub fn global() -> Arc<UnitRegistry> {
        DEFAULT_REGISTRY
            .get_or_init(|| {
                info!(symbols = DEFAULT_SYMBOLS.len(), "default unit registry initialized");
                Arc::new(UnitRegistry::new())
            })
            .clone()
    }

    /// Copy of this registry with its own cosmology state.
    pub fn fork(&self) -> Self {
        Self {
            cosmology: self.cosmology.detached(),
            ..self.clone()
        }
    }

    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    /// Relative tolerance used when comparing quantities.
    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn cosmology(&self) -> &Cosmology {
        &self.cosmology
    }

    pub fn set_redshift(&self, redshift: f64) -> Result<()> {
        self.cosmology.set_redshift(redshift)
    }

    /// Register a fixed, non-prefixable symbol.
    ///
    /// Re-registering an identical definition is a no-op.
    pub fn register(&mut self, symbol: &str, cgs_factor: f64, dimension: Dimension) -> Result<()> {
        self.register_entry(symbol, UnitEntry::fixed(cgs_factor, dimension))
    }

    pub fn register_entry(&mut self, symbol: &str, entry: UnitEntry) -> Result<()> {
        check_symbol(symbol)?;
        check_factor(symbol, entry.cgs_factor)?;
        insert_checked(&mut self.symbols, symbol, entry)?;
        debug!(symbol, factor = entry.cgs_factor, dimension = %entry.dimension, "unit registered");
        Ok(())
    }

    /// Resolve a single symbol, exact match first, then SI prefixes.
    pub fn lookup(&self, symbol: &str) -> Result<UnitEntry> {
        if let Some(entry) = self.symbols.get(symbol) {
            return Ok(*entry);
        }

        prefix_splits(symbol)
            .into_iter()
            .find_map(|(scale, base)| {
                self.symbols
                    .get(base)
                    .filter(|entry| entry.prefixable)
                    .map(|entry| UnitEntry {
                        cgs_factor: entry.cgs_factor * scale,
                        prefixable: false,
                        ..*entry
                    })
            })
            .ok_or_else(|| UnitError::unknown(symbol))
    }

    /// Whether `symbol` resolves, including through a prefix.
    pub fn contains(&self, symbol: &str) -> bool {
        self.lookup(symbol).is_ok()
    }

    /// Current CGS factor of `symbol`, with cosmology applied.
    pub fn factor_of(&self, symbol: &str) -> Result<f64> {
        Ok(factor(&self.lookup(symbol)?, &self.cosmology.snapshot()))
    }

    /// Registered symbols in registration order.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, &UnitEntry)> {
        self.symbols.iter().map(|(symbol, entry)| (symbol.as_str(), entry))
    }

    /// Registered `code_*` symbols.
    pub fn code_units(&self) -> impl Iterator<Item = (&str, &UnitEntry)> {
        self.symbols().filter(|(symbol, _)| symbol.starts_with(CODE_PREFIX))
    }

    /// Base values the current code units were derived from.
    pub fn code_bases(&self) -> Option<&ResolvedBases> {
        self.code_bases.as_ref()
    }

    pub fn has_cosmology(&self) -> bool {
        self.symbols.contains_key(HUBBLE_SYMBOL)
    }

    /// Parse a unit string against this registry.
    pub fn parse(&self, units: &str) -> Result<UnitExpression> {
        UnitExpression::parse(units, self)
    }

    /// Resolve `bases` and install the full `code_*` family.
    ///
    /// Either every code unit is replaced or none is.
    pub fn derive_code_units(&mut self, bases: &CodeUnitBases) -> Result<()> {
        let resolved = bases.resolve(self)?;
        self.install_code_units(resolved)
    }

    pub(crate) fn install_code_units(&mut self, bases: ResolvedBases) -> Result<()> {
        let entries = bases.code_entries()?;

        for (symbol, factor, dimension) in &entries {
            self.symbols
                .insert(symbol.to_string(), UnitEntry::fixed(*factor, *dimension));
        }
        self.code_bases = Some(bases);

        debug!(
            length = bases.length,
            mass = bases.mass,
            time = bases.time,
            count = entries.len(),
            "code units derived"
        );
        Ok(())
    }

    /// Register a comoving `…cm` variant of every physical length symbol and
    /// the dimensionless Hubble symbol `h`.
    ///
    /// Code units get no comoving variant. Calling this again is harmless:
    /// the variants are identical and only the value of `h` changes.
    pub fn add_comoving_and_hubble(&mut self, hubble_constant: f64) -> Result<()> {
        let additions: Vec<(String, UnitEntry)> = self
            .symbols
            .iter()
            .filter(|(symbol, entry)| {
                entry.scaling == Scaling::Fixed
                    && entry.dimension == Dimension::LENGTH
                    && !symbol.starts_with(CODE_PREFIX)
            })
            .map(|(symbol, entry)| {
                let comoving = UnitEntry {
                    scaling: Scaling::Comoving,
                    ..*entry
                };
                (format!("{}{}", symbol, COMOVING_SUFFIX), comoving)
            })
            .collect();
        check_factor(HUBBLE_SYMBOL, hubble_constant)?;

        let mut symbols = self.symbols.clone();
        for (symbol, entry) in &additions {
            insert_checked(&mut symbols, symbol, *entry)?;
        }
        match symbols.get(HUBBLE_SYMBOL) {
            Some(existing) if existing.scaling != Scaling::Hubble => {
                return Err(UnitError::DuplicateSymbol {
                    symbol: HUBBLE_SYMBOL.to_string(),
                })
            }
            _ => {}
        }
        symbols.insert(
            HUBBLE_SYMBOL.to_string(),
            UnitEntry {
                cgs_factor: hubble_constant,
                dimension: Dimension::DIMENSIONLESS,
                scaling: Scaling::Hubble,
                prefixable: false,
            },
        );
        self.cosmology.set_hubble_constant(hubble_constant)?;
        self.symbols = symbols;

        debug!(
            comoving = additions.len(),
            h = hubble_constant,
            "comoving and hubble units registered"
        );
        Ok(())
    }
}

fn check_symbol(symbol: &str) -> Result<()> {
    let valid = !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_alphabetic() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(UnitError::malformed(symbol, "symbols may only contain letters and '_'"))
    }
}

fn insert_checked(
    symbols: &mut IndexMap<String, UnitEntry>,
    symbol: &str,
    entry: UnitEntry,
) -> Result<()> {
    match symbols.get(symbol) {
        Some(existing) if *existing == entry => Ok(()),
        Some(_) => Err(UnitError::DuplicateSymbol {
            symbol: symbol.to_string(),
        }),
        None => {
            symbols.insert(symbol.to_string(), entry);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::constants::PARSEC_CM;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs()
    }

    #[test]
    fn test_lookup_exact_before_prefix() {
        let registry = UnitRegistry::new();
        assert_eq!(registry.lookup("m").unwrap().cgs_factor, 100.0);
        assert_eq!(registry.lookup("G").unwrap().dimension, Dimension::MAGNETIC_FIELD);
        assert_eq!(registry.lookup("Gyr").unwrap().dimension, Dimension::TIME);
        assert_eq!(registry.lookup("min").unwrap().cgs_factor, 60.0);
    }

    #[test]
    fn test_lookup_prefixed() {
        let registry = UnitRegistry::new();
        assert!(close(registry.lookup("kpc").unwrap().cgs_factor, 1e3 * PARSEC_CM));
        assert_eq!(registry.lookup("km").unwrap().cgs_factor, 1e5);
        assert!(close(registry.lookup("μG").unwrap().cgs_factor, 1e-6));
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = UnitRegistry::new();
        assert_eq!(
            registry.lookup("furlong").unwrap_err(),
            UnitError::UnknownUnit {
                symbol: "furlong".to_string()
            }
        );
        // Msun is not prefixable
        assert!(registry.lookup("kMsun").is_err());
        // no cosmology yet
        assert!(registry.lookup("h").is_err());
        assert!(registry.lookup("Mpccm").is_err());
    }

    #[test]
    fn test_register_is_idempotent_but_rejects_conflicts() {
        let mut registry = UnitRegistry::new();
        registry.register("furlong", 20_116.8, Dimension::LENGTH).unwrap();
        registry.register("furlong", 20_116.8, Dimension::LENGTH).unwrap();

        let err = registry
            .register("furlong", 20_000.0, Dimension::LENGTH)
            .unwrap_err();
        assert!(matches!(err, UnitError::DuplicateSymbol { .. }));

        let err = registry.register("cm", 1.0, Dimension::TIME).unwrap_err();
        assert!(matches!(err, UnitError::DuplicateSymbol { .. }));
    }

    #[test]
    fn test_register_rejects_bad_factor_and_symbol() {
        let mut registry = UnitRegistry::new();
        assert!(matches!(
            registry.register("bad", 0.0, Dimension::LENGTH),
            Err(UnitError::NonPositiveFactor { .. })
        ));
        assert!(matches!(
            registry.register("bad", f64::INFINITY, Dimension::LENGTH),
            Err(UnitError::NonPositiveFactor { .. })
        ));
        assert!(registry.register("two words", 1.0, Dimension::LENGTH).is_err());
        assert!(!registry.contains("bad"));
    }

    #[test]
    fn test_comoving_factor_tracks_redshift() {
        let mut registry = UnitRegistry::new();
        registry.add_comoving_and_hubble(0.7).unwrap();

        let physical = registry.factor_of("Mpc").unwrap();
        assert_eq!(registry.factor_of("Mpccm").unwrap(), physical);

        registry.set_redshift(1.0).unwrap();
        assert_eq!(registry.factor_of("Mpccm").unwrap(), physical / 2.0);

        registry.set_redshift(3.0).unwrap();
        assert_eq!(registry.factor_of("Mpccm").unwrap(), physical / 4.0);
        // stored factor stays physical
        assert_eq!(registry.lookup("Mpccm").unwrap().cgs_factor, physical);
    }

    #[test]
    fn test_hubble_symbol() {
        let mut registry = UnitRegistry::new();
        registry.add_comoving_and_hubble(0.71).unwrap();
        assert!(registry.has_cosmology());
        assert_eq!(registry.factor_of("h").unwrap(), 0.71);
        assert_eq!(registry.lookup("h").unwrap().cgs_factor, 0.71);
        assert!(registry.lookup("h").unwrap().dimension.is_dimensionless());

        registry.add_comoving_and_hubble(0.68).unwrap();
        assert_eq!(registry.factor_of("h").unwrap(), 0.68);
    }

    #[test]
    fn test_comoving_variants_skip_code_units() {
        let mut registry = UnitRegistry::new();
        registry.derive_code_units(&CodeUnitBases::default()).unwrap();
        registry.add_comoving_and_hubble(0.7).unwrap();
        assert!(registry.contains("pccm"));
        assert!(registry.contains("kpccm"));
        assert!(registry.contains("AUcm"));
        assert!(!registry.contains("code_lengthcm"));
    }

    #[test]
    fn test_invalid_hubble_leaves_registry_untouched() {
        let mut registry = UnitRegistry::new();
        let before = registry.symbols().count();
        assert!(registry.add_comoving_and_hubble(-1.0).is_err());
        assert_eq!(registry.symbols().count(), before);
        assert!(!registry.has_cosmology());
    }

    #[test]
    fn test_fork_detaches_cosmology() {
        let mut registry = UnitRegistry::new();
        registry.add_comoving_and_hubble(0.7).unwrap();
        let fork = registry.fork();
        let clone = registry.clone();

        registry.set_redshift(1.0).unwrap();
        assert_eq!(clone.cosmology().redshift(), 1.0);
        assert_eq!(fork.cosmology().redshift(), 0.0);
    }

    #[test]
    fn test_global_registry_is_shared() {
        let a = UnitRegistry::global();
        let b = UnitRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.contains("Mpc"));
        assert_eq!(a.code_units().count(), 0);
    }
}
