//! Ideal liquid solution model.
//!
//! The mixture molar volume is the mole-fraction weighted mean of the pure
//! liquid molar volumes (no excess volume), independent of temperature and
//! pressure.
//! Heat capacities are the constant per-substance values; viscosity blends
//! linearly unless another [`ViscosityMixingRule`] is chosen.

use uom::si::{
    f64::{DynamicViscosity, MolarHeatCapacity, MolarVolume},
    molar_volume::cubic_meter_per_mole,
};

use crate::support::thermo::{MixtureModel, MixtureView, PropertyError};

use super::{ViscosityMixingRule, constant_heat_capacities};

/// Ideal liquid solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdealSolution {
    pub viscosity_rule: ViscosityMixingRule,
}

impl Default for IdealSolution {
    fn default() -> Self {
        Self {
            viscosity_rule: ViscosityMixingRule::Linear,
        }
    }
}

impl IdealSolution {
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

impl MixtureModel for IdealSolution {
    fn molar_volume(&self, mixture: &MixtureView<'_>) -> Result<MolarVolume, PropertyError> {
        let v = mixture.weighted_sum("liquid molar volume", |s| {
            s.liquid_molar_volume.map(|v| v.get::<cubic_meter_per_mole>())
        })?;
        Ok(MolarVolume::new::<cubic_meter_per_mole>(v))
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

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        dynamic_viscosity::pascal_second,
        f64::{MassDensity, MolarMass, Pressure, ThermodynamicTemperature},
        mass_density::kilogram_per_cubic_meter,
        molar_mass::gram_per_mole,
        molar_volume::cubic_centimeter_per_mole,
        pressure::bar,
        thermodynamic_temperature::kelvin,
    };

    use crate::support::thermo::Substance;

    fn water_ethanol() -> Vec<Substance> {
        vec![
            Substance::new("water")
                .with_molar_mass(MolarMass::new::<gram_per_mole>(18.0))
                .with_liquid_molar_volume(MolarVolume::new::<cubic_centimeter_per_mole>(18.0))
                .with_viscosity(DynamicViscosity::new::<pascal_second>(1.0e-3)),
            Substance::new("ethanol")
                .with_molar_mass(MolarMass::new::<gram_per_mole>(46.0))
                .with_liquid_molar_volume(MolarVolume::new::<cubic_centimeter_per_mole>(58.0))
                .with_viscosity(DynamicViscosity::new::<pascal_second>(1.2e-3)),
        ]
    }

    fn at(substances: &[Substance], x: &'static [f64], t: f64) -> f64 {
        let mixture = MixtureView::new(
            substances,
            x,
            ThermodynamicTemperature::new::<kelvin>(t),
            Pressure::new::<bar>(1.0),
        );
        IdealSolution::new()
            .molar_volume(&mixture)
            .unwrap()
            .get::<cubic_centimeter_per_mole>()
    }

    #[test]
    fn molar_volume_is_linear_in_composition() {
        let substances = water_ethanol();
        assert_relative_eq!(at(&substances, &[1.0, 0.0], 300.0), 18.0, max_relative = 1e-12);
        assert_relative_eq!(at(&substances, &[0.5, 0.5], 300.0), 38.0, max_relative = 1e-12);
    }

    #[test]
    fn molar_volume_ignores_temperature() {
        let substances = water_ethanol();
        assert_relative_eq!(
            at(&substances, &[0.25, 0.75], 280.0),
            at(&substances, &[0.25, 0.75], 350.0)
        );
    }

    #[test]
    fn pure_water_density() {
        let substances = water_ethanol();
        let x = [1.0, 0.0];
        let mixture = MixtureView::new(
            &substances,
            &x,
            ThermodynamicTemperature::new::<kelvin>(298.15),
            Pressure::new::<bar>(1.0),
        );

        let rho: MassDensity = IdealSolution::new().mass_density(&mixture).unwrap();
        assert_relative_eq!(
            rho.get::<kilogram_per_cubic_meter>(),
            1000.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn linear_viscosity_by_default() {
        let substances = water_ethanol();
        let x = [0.5, 0.5];
        let mixture = MixtureView::new(
            &substances,
            &x,
            ThermodynamicTemperature::new::<kelvin>(298.15),
            Pressure::new::<bar>(1.0),
        );

        let mu = IdealSolution::new().viscosity(&mixture).unwrap();
        assert_relative_eq!(mu.get::<pascal_second>(), 1.1e-3, max_relative = 1e-12);
    }

    #[test]
    fn missing_liquid_volume_is_undefined() {
        let substances = vec![Substance::new("solute")];
        let x = [1.0];
        let mixture = MixtureView::new(
            &substances,
            &x,
            ThermodynamicTemperature::new::<kelvin>(298.15),
            Pressure::new::<bar>(1.0),
        );

        let err = IdealSolution::new().molar_volume(&mixture).unwrap_err();
        assert!(matches!(err, PropertyError::Undefined { .. }));
    }
}
