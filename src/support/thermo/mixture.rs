use uom::si::{
    f64::{
        DynamicViscosity, MassDensity, MolarEnergy, MolarHeatCapacity, MolarVolume, Pressure,
        ThermodynamicTemperature,
    },
    mass_density::kilogram_per_cubic_meter,
    molar_energy::joule_per_mole,
    molar_heat_capacity::joule_per_kelvin_mole,
    molar_mass::kilogram_per_mole,
    molar_volume::cubic_meter_per_mole,
    thermodynamic_temperature::kelvin,
};

use super::{PropertyError, Substance};

/// A borrowed view of a mixture at a given temperature and pressure.
///
/// `mole_fractions` is aligned with `substances`.
#[derive(Debug, Clone, Copy)]
pub struct MixtureView<'a> {
    pub substances: &'a [Substance],
    pub mole_fractions: &'a [f64],
    pub temperature: ThermodynamicTemperature,
    pub pressure: Pressure,
}

impl<'a> MixtureView<'a> {
    #[must_use]
    pub fn new(
        substances: &'a [Substance],
        mole_fractions: &'a [f64],
        temperature: ThermodynamicTemperature,
        pressure: Pressure,
    ) -> Self {
        Self {
            substances,
            mole_fractions,
            temperature,
            pressure,
        }
    }

    /// Returns the mole-fraction weighted sum of a per-substance value.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::Undefined`] naming the first substance for
    /// which `value` returns `None`.
    pub fn weighted_sum(
        &self,
        property: &str,
        value: impl Fn(&Substance) -> Option<f64>,
    ) -> Result<f64, PropertyError> {
        self.substances
            .iter()
            .zip(self.mole_fractions)
            .try_fold(0.0, |sum, (substance, &x)| {
                let v = value(substance)
                    .ok_or_else(|| PropertyError::missing(property, &substance.name))?;
                Ok(sum + x * v)
            })
    }
}

/// Mixture property collaborator consumed by reactor balances.
///
/// Only [`MixtureModel::molar_volume`] is mandatory.
/// The remaining capabilities default to [`PropertyError::Undefined`], so a
/// model used only for isothermic, isobaric reactors stays small.
/// Energy balances call [`MixtureModel::heat_capacities`] and
/// [`MixtureModel::heat_capacity_integrals`]; pressure-drop correlations call
/// [`MixtureModel::viscosity`] and [`MixtureModel::mass_density`].
/// Gas-phase kinetics call [`MixtureModel::partial_pressures`].
pub trait MixtureModel {
    /// Returns the molar volume of the mixture.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] if the molar volume cannot be calculated.
    fn molar_volume(&self, mixture: &MixtureView<'_>) -> Result<MolarVolume, PropertyError>;

    /// Returns the pure-component molar heat capacities, aligned with the
    /// mixture's substances.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] if a heat capacity cannot be calculated.
    fn heat_capacities(
        &self,
        mixture: &MixtureView<'_>,
    ) -> Result<Vec<MolarHeatCapacity>, PropertyError> {
        let _ = mixture;
        Err(PropertyError::Undefined {
            context: "heat capacities are not provided by this model".into(),
        })
    }

    /// Returns `∫cp dT` for each substance, from `from` to the mixture temperature.
    ///
    /// The default evaluates [`MixtureModel::heat_capacities`] at the mixture
    /// temperature, which is exact for constant heat capacities.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] if the heat capacities cannot be calculated.
    fn heat_capacity_integrals(
        &self,
        mixture: &MixtureView<'_>,
        from: ThermodynamicTemperature,
    ) -> Result<Vec<MolarEnergy>, PropertyError> {
        let delta_t = mixture.temperature.get::<kelvin>() - from.get::<kelvin>();
        Ok(self
            .heat_capacities(mixture)?
            .into_iter()
            .map(|cp| {
                MolarEnergy::new::<joule_per_mole>(cp.get::<joule_per_kelvin_mole>() * delta_t)
            })
            .collect())
    }

    /// Returns the partial pressure of each substance, aligned with the
    /// mixture's substances.
    ///
    /// The default is Dalton's law, `pᵢ = xᵢ·P`, exact for an ideal gas.
    /// Models with fugacity corrections override it.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] if a partial pressure cannot be calculated.
    fn partial_pressures(&self, mixture: &MixtureView<'_>) -> Result<Vec<Pressure>, PropertyError> {
        Ok(mixture
            .mole_fractions
            .iter()
            .map(|&x| x * mixture.pressure)
            .collect())
    }

    /// Returns the dynamic viscosity of the mixture.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] if the viscosity cannot be calculated.
    fn viscosity(&self, mixture: &MixtureView<'_>) -> Result<DynamicViscosity, PropertyError> {
        let _ = mixture;
        Err(PropertyError::Undefined {
            context: "viscosity is not provided by this model".into(),
        })
    }

    /// Returns the mass density of the mixture.
    ///
    /// The default divides the mean molar mass by [`MixtureModel::molar_volume`].
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] if a molar mass is missing or the molar
    /// volume cannot be calculated.
    fn mass_density(&self, mixture: &MixtureView<'_>) -> Result<MassDensity, PropertyError> {
        let molar_mass = mixture.weighted_sum("molar mass", |s| {
            s.molar_mass.map(|m| m.get::<kilogram_per_mole>())
        })?;
        let molar_volume = self.molar_volume(mixture)?.get::<cubic_meter_per_mole>();
        if molar_volume <= 0.0 {
            return Err(PropertyError::OutOfDomain {
                context: format!("non-positive molar volume {molar_volume} m3/mol"),
            });
        }
        Ok(MassDensity::new::<kilogram_per_cubic_meter>(molar_mass / molar_volume))
    }
}
