//! Cosmological state read by comoving and Hubble-scaled symbols.
//!
//! A [`Cosmology`] handle is shared by a registry and every expression parsed
//! against it. Conversions read it at evaluation time, so a redshift update is
//! seen by conversions that happen afterwards without re-parsing anything.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, UnitError};

/// Redshift and dimensionless Hubble parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CosmologyContext {
    /// Current redshift `z`. Must satisfy `1 + z > 0`.
    pub redshift: f64,
    /// Reduced Hubble parameter `h` (H0 / 100 km/s/Mpc).
    pub hubble_constant: f64,
}

impl Default for CosmologyContext {
    fn default() -> Self {
        Self {
            redshift: 0.0,
            hubble_constant: 1.0,
        }
    }
}

impl CosmologyContext {
    pub fn new(redshift: f64, hubble_constant: f64) -> Result<Self> {
        let context = Self {
            redshift,
            hubble_constant,
        };
        context.validate()?;
        Ok(context)
    }

    pub fn validate(&self) -> Result<()> {
        validate_redshift(self.redshift)?;
        validate_hubble(self.hubble_constant)
    }

    /// Expansion factor `a = 1 / (1 + z)`.
    pub fn scale_factor(&self) -> f64 {
        1.0 / (1.0 + self.redshift)
    }
}

fn validate_redshift(z: f64) -> Result<()> {
    if !z.is_finite() || 1.0 + z <= 0.0 {
        return Err(UnitError::InvalidCosmology {
            reason: format!("redshift must be finite with 1 + z > 0, got {}", z),
        });
    }
    Ok(())
}

fn validate_hubble(h: f64) -> Result<()> {
    if !h.is_finite() || h <= 0.0 {
        return Err(UnitError::InvalidCosmology {
            reason: format!("hubble constant must be positive, got {}", h),
        });
    }
    Ok(())
}

/// Shared, lock-protected [`CosmologyContext`].
///
/// Cloning the handle shares the state; [`Cosmology::detached`] copies it.
#[derive(Debug, Clone, Default)]
pub struct Cosmology(Arc<RwLock<CosmologyContext>>);

impl Cosmology {
    pub fn new(context: CosmologyContext) -> Self {
        Self(Arc::new(RwLock::new(context)))
    }

    /// Current values.
    pub fn snapshot(&self) -> CosmologyContext {
        *self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn redshift(&self) -> f64 {
        self.snapshot().redshift
    }

    pub fn hubble_constant(&self) -> f64 {
        self.snapshot().hubble_constant
    }

    pub fn set_redshift(&self, redshift: f64) -> Result<()> {
        validate_redshift(redshift)?;
        let mut context = self.0.write().unwrap_or_else(PoisonError::into_inner);
        debug!(from = context.redshift, to = redshift, "redshift updated");
        context.redshift = redshift;
        Ok(())
    }

    pub fn set_hubble_constant(&self, hubble_constant: f64) -> Result<()> {
        validate_hubble(hubble_constant)?;
        let mut context = self.0.write().unwrap_or_else(PoisonError::into_inner);
        debug!(h = hubble_constant, "hubble constant updated");
        context.hubble_constant = hubble_constant;
        Ok(())
    }

    /// Independent copy of the current state.
    pub fn detached(&self) -> Self {
        Self::new(self.snapshot())
    }

    /// Whether two handles share state.
    pub fn ptr_eq(&self, other: &Cosmology) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unphysical_values() {
        assert!(CosmologyContext::new(-1.0, 0.7).is_err());
        assert!(CosmologyContext::new(0.5, 0.0).is_err());
        assert!(CosmologyContext::new(f64::NAN, 0.7).is_err());
        assert!(CosmologyContext::new(3.0, 0.7).is_ok());
    }

    #[test]
    fn test_scale_factor() {
        let context = CosmologyContext::new(1.0, 0.7).unwrap();
        assert_eq!(context.scale_factor(), 0.5);
    }

    #[test]
    fn test_clones_share_and_detached_copies_do_not() {
        let cosmology = Cosmology::default();
        let shared = cosmology.clone();
        let detached = cosmology.detached();

        shared.set_redshift(2.0).unwrap();
        assert_eq!(cosmology.redshift(), 2.0);
        assert_eq!(detached.redshift(), 0.0);
        assert!(cosmology.ptr_eq(&shared));
        assert!(!cosmology.ptr_eq(&detached));
    }

    #[test]
    fn test_failed_update_keeps_previous_value() {
        let cosmology = Cosmology::new(CosmologyContext::new(0.5, 0.7).unwrap());
        assert!(cosmology.set_redshift(-3.0).is_err());
        assert!(cosmology.set_hubble_constant(-0.7).is_err());
        assert_eq!(cosmology.snapshot(), CosmologyContext::new(0.5, 0.7).unwrap());
    }
}
