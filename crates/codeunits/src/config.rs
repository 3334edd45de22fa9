//! YAML description of a dataset unit system.
//!
//! ```yaml
//! apiVersion: codeunits/v1
//! kind: UnitSystem
//! metadata:
//!   name: cosmology_box
//! base:
//!   length_unit: [1.0, Mpccm/h]
//!   time_unit: [1.0, Myr]
//!   mass_unit: [1.0e14, Msun]
//! cosmology:
//!   redshift: 1.0
//!   hubble_constant: 0.7
//! units_override:
//!   length_unit: [2.0, Mpc]
//! ```
//!
//! Base and override values are either a bare number (already CGS) or a
//! `[value, unit]` pair. Missing base keys default to 1 cm, 1 g and 1 s.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cosmology::CosmologyContext;
use crate::error::UnitError;
use crate::overrides::{CodeUnitBases, UnitOverrides, UnitValue};
use crate::system::UnitSystem;

const API_VERSION: &str = "codeunits/v1";
const KIND: &str = "UnitSystem";

/// Errors that can occur when loading or building a unit system config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read unit system config: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse the config YAML.
    #[error("failed to parse unit system YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("invalid apiVersion: expected 'codeunits/v1', got '{0}'")]
    InvalidApiVersion(String),

    #[error("invalid kind: expected 'UnitSystem', got '{0}'")]
    InvalidKind(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    /// The described system is not valid.
    #[error(transparent)]
    Unit(#[from] UnitError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Serialized form of a [`UnitSystem`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSystemConfig {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default)]
    pub metadata: ConfigMetadata,

    /// Base units, keyed like overrides.
    #[serde(default)]
    pub base: UnitOverrides,

    /// Enables comoving symbols and `h` when present.
    #[serde(default)]
    pub cosmology: Option<CosmologyContext>,

    #[serde(default, rename = "units_override")]
    pub units_override: UnitOverrides,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Machine identifier.
    pub name: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl UnitSystemConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ConfigMetadata {
                name: name.into(),
                title: None,
                description: None,
            },
            base: UnitOverrides::new(),
            cosmology: None,
            units_override: UnitOverrides::new(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: UnitSystemConfig = serde_yaml::from_str(yaml)?;
        config.validate_schema()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn validate_schema(&self) -> ConfigResult<()> {
        if self.api_version != API_VERSION {
            return Err(ConfigError::InvalidApiVersion(self.api_version.clone()));
        }
        if self.kind != KIND {
            return Err(ConfigError::InvalidKind(self.kind.clone()));
        }
        if self.metadata.name.is_empty() {
            return Err(ConfigError::MissingField("metadata.name".to_string()));
        }
        Ok(())
    }

    /// Build the unit system: bases, then cosmology, then overrides.
    pub fn build(&self) -> ConfigResult<UnitSystem> {
        let bases = CodeUnitBases::from_mapping(&self.base)?;
        let name = self.metadata.name.as_str();
        let mut system = match self.cosmology {
            Some(cosmology) => UnitSystem::cosmological(name, &bases, cosmology)?,
            None => UnitSystem::new(name, &bases)?,
        };
        system.override_code_units(&self.units_override)?;
        Ok(system)
    }

    pub fn with_base(mut self, key: impl Into<String>, value: impl Into<UnitValue>) -> Self {
        self.base.insert(key, value);
        self
    }

    pub fn with_cosmology(mut self, cosmology: CosmologyContext) -> Self {
        self.cosmology = Some(cosmology);
        self
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<UnitValue>) -> Self {
        self.units_override.insert(key, value);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::OverrideState;
    use std::io::Write;

    const BOX: &str = r#"
apiVersion: codeunits/v1
kind: UnitSystem
metadata:
  name: cosmology_box
  title: 64 Mpc/h box
base:
  length_unit: [1.0, Mpccm/h]
  time_unit: [1.0, Myr]
  mass_unit: [1.0e14, Msun]
cosmology:
  redshift: 1.0
  hubble_constant: 0.5
"#;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs()
    }

    #[test]
    fn test_parse_and_build() {
        let config = UnitSystemConfig::from_yaml(BOX).unwrap();
        assert_eq!(config.metadata.name, "cosmology_box");
        assert_eq!(config.metadata.title.as_deref(), Some("64 Mpc/h box"));
        assert_eq!(config.base.len(), 3);
        assert!(config.units_override.is_empty());

        let system = config.build().unwrap();
        assert_eq!(system.name(), "cosmology_box");
        assert_eq!(system.redshift(), 1.0);
        let length = system.quantity(1.0, "code_length").unwrap();
        assert!(close(length.in_units("Mpc").unwrap(), 1.0));
        assert_eq!(system.override_state(), &OverrideState::Unbound);
    }

    #[test]
    fn test_override_section_is_applied() {
        let yaml = format!("{}units_override:\n  time_unit: [2.0, Myr]\n", BOX);
        let system = UnitSystemConfig::from_yaml(&yaml).unwrap().build().unwrap();
        assert_eq!(system.override_state(), &OverrideState::Bound);
        let time = system.quantity(1.0, "code_time").unwrap();
        assert!(close(time.in_units("Myr").unwrap(), 2.0));
    }

    #[test]
    fn test_defaults_to_cgs_bases() {
        let yaml = "apiVersion: codeunits/v1\nkind: UnitSystem\nmetadata:\n  name: plain\n";
        let system = UnitSystemConfig::from_yaml(yaml).unwrap().build().unwrap();
        assert_eq!(system.length_unit().unwrap().value(), 1.0);
        assert!(!system.registry().has_cosmology());
    }

    #[test]
    fn test_schema_errors() {
        let err = UnitSystemConfig::from_yaml("apiVersion: other/v2\nmetadata:\n  name: x\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidApiVersion(v) if v == "other/v2"));

        let err = UnitSystemConfig::from_yaml("kind: Scenario\nmetadata:\n  name: x\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKind(_)));

        let err = UnitSystemConfig::from_yaml("kind: UnitSystem\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(field) if field == "metadata.name"));
    }

    #[test]
    fn test_unit_errors_surface() {
        let config = UnitSystemConfig::new("bad").with_base("length_unit", (1.0, "Msun"));
        assert!(matches!(
            config.build(),
            Err(ConfigError::Unit(UnitError::InvalidOverride { .. }))
        ));

        let config = UnitSystemConfig::new("bad").with_override("density_unit", 1.0);
        assert!(matches!(
            config.build(),
            Err(ConfigError::Unit(UnitError::InvalidOverrideKey { .. }))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BOX.as_bytes()).unwrap();

        let config = UnitSystemConfig::load(file.path()).unwrap();
        assert_eq!(config.cosmology, Some(CosmologyContext::new(1.0, 0.5).unwrap()));

        let missing = UnitSystemConfig::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_builder_round_trips_through_yaml() {
        let config = UnitSystemConfig::new("galaxy")
            .with_title("isolated galaxy")
            .with_base("length_unit", (1.0, "kpc"))
            .with_base("mass_unit", 1.989e43);
        let yaml = config.to_yaml().unwrap();
        let parsed = UnitSystemConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.metadata.name, "galaxy");
        assert_eq!(parsed.base.len(), 2);

        let system = parsed.build().unwrap();
        assert!(close(system.mass_unit().unwrap().value(), 1.989e43));
    }
}
