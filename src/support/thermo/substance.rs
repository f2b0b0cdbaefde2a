use uom::si::f64::{DynamicViscosity, MolarEnergy, MolarHeatCapacity, MolarMass, MolarVolume};

/// A pure substance and its constant physical data.
///
/// Only the name is required.
/// Which of the optional values must be present depends on the property
/// model and on the balances in use: an isothermic reactor never asks for a
/// heat capacity, an ideal solution always needs a liquid molar volume.
///
/// # Example
///
/// ```
/// use twine_reactors::support::thermo::Substance;
/// use uom::si::{
///     f64::{MolarHeatCapacity, MolarMass},
///     molar_heat_capacity::joule_per_kelvin_mole,
///     molar_mass::gram_per_mole,
/// };
///
/// let methane = Substance::new("methane")
///     .with_molar_mass(MolarMass::new::<gram_per_mole>(16.04))
///     .with_heat_capacity(MolarHeatCapacity::new::<joule_per_kelvin_mole>(35.7));
///
/// assert_eq!(methane.name, "methane");
/// assert!(methane.viscosity.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Substance {
    pub name: String,
    pub molar_mass: Option<MolarMass>,

    /// Standard enthalpy of formation at 298.15 K.
    pub formation_enthalpy: Option<MolarEnergy>,

    /// Constant molar heat capacity at constant pressure.
    pub heat_capacity: Option<MolarHeatCapacity>,

    /// Molar volume of the pure liquid.
    pub liquid_molar_volume: Option<MolarVolume>,

    /// Dynamic viscosity of the pure substance.
    pub viscosity: Option<DynamicViscosity>,
}

impl Substance {
    /// Creates a substance with no physical data beyond its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            molar_mass: None,
            formation_enthalpy: None,
            heat_capacity: None,
            liquid_molar_volume: None,
            viscosity: None,
        }
    }

    #[must_use]
    pub fn with_molar_mass(mut self, molar_mass: MolarMass) -> Self {
        self.molar_mass = Some(molar_mass);
        self
    }

    #[must_use]
    pub fn with_formation_enthalpy(mut self, formation_enthalpy: MolarEnergy) -> Self {
        self.formation_enthalpy = Some(formation_enthalpy);
        self
    }

    #[must_use]
    pub fn with_heat_capacity(mut self, heat_capacity: MolarHeatCapacity) -> Self {
        self.heat_capacity = Some(heat_capacity);
        self
    }

    #[must_use]
    pub fn with_liquid_molar_volume(mut self, molar_volume: MolarVolume) -> Self {
        self.liquid_molar_volume = Some(molar_volume);
        self
    }

    #[must_use]
    pub fn with_viscosity(mut self, viscosity: DynamicViscosity) -> Self {
        self.viscosity = Some(viscosity);
        self
    }
}
