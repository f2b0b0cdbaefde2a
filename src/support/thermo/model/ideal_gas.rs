//! Ideal gas mixture model.
//!
//! # Assumptions
//!
//! - Ideal gas equation of state: `v = R·T / P`, independent of composition
//! - Constant pure-component heat capacities taken from each substance
//! - Mixture viscosity from a [`ViscosityMixingRule`] (Herning–Zipperer by default)

use uom::si::{
    f64::{DynamicViscosity, MolarHeatCapacity, MolarVolume},
    molar_volume::cubic_meter_per_mole,
    pressure::pascal,
    thermodynamic_temperature::kelvin,
};

use crate::support::{
    thermo::{MixtureModel, MixtureView, PropertyError},
    units::GAS_CONSTANT,
};

use super::{ViscosityMixingRule, constant_heat_capacities};

/// Ideal gas mixture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdealGas {
    pub viscosity_rule: ViscosityMixingRule,
}

impl IdealGas {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_viscosity_rule(mut self, rule: ViscosityMixingRule) -> Self {
        self.viscosity_rule = rule;
        self
    }
}

impl MixtureModel for IdealGas {
    fn molar_volume(&self, mixture: &MixtureView<'_>) -> Result<MolarVolume, PropertyError> {
        let t = mixture.temperature.get::<kelvin>();
        let p = mixture.pressure.get::<pascal>();

        if !(t.is_finite() && t > 0.0) {
            return Err(PropertyError::OutOfDomain {
                context: format!("ideal gas requires a positive temperature, got {t} K"),
            });
        }
        if !(p.is_finite() && p > 0.0) {
            return Err(PropertyError::OutOfDomain {
                context: format!("ideal gas requires a positive pressure, got {p} Pa"),
            });
        }

        Ok(MolarVolume::new::<cubic_meter_per_mole>(GAS_CONSTANT * t / p))
    }

    fn heat_capacities(
        &self,
        mixture: &MixtureView<'_>,
    ) -> Result<Vec<MolarHeatCapacity>, PropertyError> {
        constant_heat_capacities(mixture)
    }

    fn viscosity(&self, mixture: &MixtureView<'_>) -> Result<DynamicViscosity, PropertyError> {
        self.viscosity_rule.blend(mixture)
    }
}
