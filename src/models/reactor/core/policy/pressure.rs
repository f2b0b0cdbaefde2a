use std::fmt::Debug;

use uom::si::{
    dynamic_viscosity::pascal_second,
    f64::{DynamicViscosity, Length, MassDensity, Velocity},
    length::meter,
    mass_density::kilogram_per_cubic_meter,
    velocity::meter_per_second,
};

use crate::support::{
    constraint::{Constrained, ConstraintError, StrictlyPositive, UnitInterval},
    thermo::{MixtureModel, MixtureView, PropertyError},
};

/// A pressure-drop correlation for flow through a reactor.
pub trait PressureDrop: Debug + Send + Sync {
    /// Returns `dP/dz` in Pa/m; negative when pressure falls along the flow.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] if a required mixture property is unavailable.
    fn gradient(&self, flow: &FlowContext<'_>) -> Result<f64, PropertyError>;
}

/// Flow conditions at one point of a plug-flow reactor.
///
/// Mixture properties are evaluated on request, so a correlation only pays
/// for what it uses.
#[derive(Clone, Copy)]
pub struct FlowContext<'a> {
    pub mixture: MixtureView<'a>,
    pub properties: &'a dyn MixtureModel,

    /// m³/s.
    pub volumetric_flow: f64,

    /// m².
    pub cross_section: f64,
}

impl FlowContext<'_> {
    #[must_use]
    pub fn superficial_velocity(&self) -> Velocity {
        Velocity::new::<meter_per_second>(self.volumetric_flow / self.cross_section)
    }

    /// # Errors
    ///
    /// Propagates the property model's error.
    pub fn density(&self) -> Result<MassDensity, PropertyError> {
        self.properties.mass_density(&self.mixture)
    }

    /// # Errors
    ///
    /// Propagates the property model's error.
    pub fn viscosity(&self) -> Result<DynamicViscosity, PropertyError> {
        self.properties.viscosity(&self.mixture)
    }
}

/// Ergun equation for flow through a packed bed:
///
/// ```text
/// dP/dz = −(u/Dp)·((1 − φ)/φ³)·(150·(1 − φ)·μ/Dp + 1.75·ρ·u)
/// ```
///
/// with `u` the superficial velocity, `φ` the bed porosity and `Dp` the
/// particle diameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ergun {
    porosity: Constrained<f64, UnitInterval>,
    particle_diameter: Constrained<Length, StrictlyPositive>,
}

impl Ergun {
    /// # Errors
    ///
    /// Returns [`ConstraintError`] if the porosity is not in `(0, 1]` or the
    /// particle diameter is not strictly positive.
    pub fn new(porosity: f64, particle_diameter: Length) -> Result<Self, ConstraintError> {
        if porosity == 0.0 {
            return Err(ConstraintError::Zero);
        }
        Ok(Self {
            porosity: UnitInterval::new(porosity)?,
            particle_diameter: StrictlyPositive::new(particle_diameter)?,
        })
    }

    #[must_use]
    pub fn porosity(&self) -> f64 {
        *self.porosity.as_ref()
    }

    #[must_use]
    pub fn particle_diameter(&self) -> Length {
        *self.particle_diameter.as_ref()
    }
}

impl PressureDrop for Ergun {
    fn gradient(&self, flow: &FlowContext<'_>) -> Result<f64, PropertyError> {
        let phi = self.porosity();
        let dp = self.particle_diameter().get::<meter>();
        let u = flow.superficial_velocity().get::<meter_per_second>();
        let rho = flow.density()?.get::<kilogram_per_cubic_meter>();
        let mu = flow.viscosity()?.get::<pascal_second>();

        let bed = (1.0 - phi) / phi.powi(3);
        Ok(-(u / dp) * bed * (150.0 * (1.0 - phi) * mu / dp + 1.75 * rho * u))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        f64::{MolarMass, MolarVolume, Pressure, ThermodynamicTemperature},
        length::millimeter,
        molar_mass::kilogram_per_mole,
        molar_volume::cubic_meter_per_mole,
        pressure::bar,
        thermodynamic_temperature::kelvin,
    };

    use crate::support::thermo::{Substance, model::IdealSolution};

    #[test]
    fn rejects_bad_parameters() {
        let d = Length::new::<millimeter>(3.0);
        assert_eq!(Ergun::new(0.0, d), Err(ConstraintError::Zero));
        assert_eq!(Ergun::new(1.2, d), Err(ConstraintError::AboveMaximum));
        assert!(Ergun::new(0.4, Length::new::<meter>(0.0)).is_err());
    }

    #[test]
    fn matches_hand_calculation() {
        let liquid = [Substance::new("water")
            .with_molar_mass(MolarMass::new::<kilogram_per_mole>(0.018))
            .with_liquid_molar_volume(MolarVolume::new::<cubic_meter_per_mole>(1.8e-5))
            .with_viscosity(DynamicViscosity::new::<pascal_second>(1.0e-3))];
        let x = [1.0];
        let properties = IdealSolution::new();
        let flow = FlowContext {
            mixture: MixtureView::new(
                &liquid,
                &x,
                ThermodynamicTemperature::new::<kelvin>(300.0),
                Pressure::new::<bar>(5.0),
            ),
            properties: &properties,
            volumetric_flow: 0.002,
            cross_section: 0.01,
        };

        let ergun = Ergun::new(0.4, Length::new::<millimeter>(2.0)).unwrap();
        let gradient = ergun.gradient(&flow).unwrap();

        // u = 0.2 m/s, ρ = 1000 kg/m³, μ = 1e-3 Pa·s, Dp = 2e-3 m, φ = 0.4.
        let viscous = 150.0 * 0.6 * 1.0e-3 / 2.0e-3;
        let inertial = 1.75 * 1000.0 * 0.2;
        let expected = -(0.2 / 2.0e-3) * (0.6 / 0.064) * (viscous + inertial);
        assert_relative_eq!(gradient, expected, max_relative = 1e-12);
    }
}
