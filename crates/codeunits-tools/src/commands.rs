//! Subcommand implementations.
//!
//! Each command returns its output as a string so it can be tested without
//! capturing stdout.

use std::fmt::Write;
use std::path::PathBuf;

use clap::Args;
use codeunits::{
    CodeUnitBases, ConfigError, CosmologyContext, UnitError, UnitSystem, UnitSystemConfig,
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("failed to format output: {0}")]
    Format(#[from] std::fmt::Error),
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct SystemArgs {
    /// Unit system YAML file (default: CGS bases with comoving units, h = 1)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Redshift to evaluate comoving units at
    #[arg(short, long, global = true, allow_hyphen_values = true)]
    pub redshift: Option<f64>,
}

impl SystemArgs {
    /// Build the unit system these options describe.
    pub fn load(&self) -> ToolResult<UnitSystem> {
        let system = match &self.config {
            Some(path) => {
                debug!(path = %path.display(), "loading unit system config");
                UnitSystemConfig::load(path)?.build()?
            }
            None => UnitSystem::cosmological(
                "default",
                &CodeUnitBases::default(),
                CosmologyContext::default(),
            )?,
        };

        if let Some(redshift) = self.redshift {
            if !system.registry().has_cosmology() {
                return Err(UnitError::InvalidCosmology {
                    reason: format!("unit system '{}' has no cosmology", system.name()),
                }
                .into());
            }
            system.set_redshift(redshift)?;
        }
        Ok(system)
    }
}

/// `convert VALUE FROM TO`
pub fn convert(system: &UnitSystem, value: f64, from: &str, to: &str) -> ToolResult<String> {
    let converted = system.quantity(value, from)?.convert_to(to)?;
    Ok(converted.to_string())
}

/// `cgs VALUE UNIT`
pub fn cgs(system: &UnitSystem, value: f64, units: &str) -> ToolResult<String> {
    let converted = system.quantity(value, units)?.to_cgs()?;
    Ok(converted.to_string())
}

/// `show`: the system's code units and cosmology.
pub fn show(system: &UnitSystem) -> ToolResult<String> {
    let registry = system.registry();
    let mut out = String::new();

    writeln!(out, "unit system: {}", system.name())?;
    if registry.has_cosmology() {
        let cosmology = registry.cosmology().snapshot();
        writeln!(
            out,
            "cosmology: z = {}, h = {}",
            cosmology.redshift, cosmology.hubble_constant
        )?;
    }

    let width = registry
        .code_units()
        .map(|(symbol, _)| symbol.len())
        .max()
        .unwrap_or(0);
    for (symbol, _) in registry.code_units() {
        let cgs = system.quantity(1.0, symbol)?.to_cgs()?;
        writeln!(out, "  {:<width$}  {}", symbol, cgs, width = width)?;
    }
    Ok(out)
}
