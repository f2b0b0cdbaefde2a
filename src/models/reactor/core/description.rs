//! Declarative, caller-facing reactor description.
//!
//! A [`ReactorDescription`] records the caller's choices on every axis
//! together with whatever parameters they supplied.
//! Nothing is checked here; [`ReactorConfiguration::new`](super::ReactorConfiguration::new)
//! validates the description against a reaction network.

use std::{fmt, sync::Arc};

use uom::si::f64::{
    Area, HeatTransfer, Length, MassDensity, MassRate, Pressure, SpecificHeatCapacity,
    ThermodynamicTemperature, Time, Volume, VolumeRate,
};

use super::policy::{Operation, PressureDrop, ReactionSite};

/// Flow pattern of the vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Plug-flow reactor (PFR): no axial mixing, state varies along the length.
    PlugFlow,

    /// Stirred-tank reactor (STR): well mixed, state uniform in space.
    StirredTank,
}

/// Stationary (steady) or transient (time-evolving) operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Stationary,
    Transient,
}

/// Energy balance choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyBalance {
    Isothermic,
    NonIsothermic,
    Adiabatic,
}

/// Pressure balance choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureBalance {
    Isobaric,
    NonIsobaric,
}

/// Direction of a coolant stream relative to the reacting flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoolantFlow {
    /// The coolant enters next to the reactor inlet.
    CoCurrent,

    /// The coolant enters next to the reactor outlet.
    CounterCurrent,
}

/// A coolant stream that heats up or cools down along a plug-flow reactor.
///
/// Without one, the coolant temperature is uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coolant {
    pub mass_flow: MassRate,
    pub specific_heat: SpecificHeatCapacity,
    pub flow: CoolantFlow,
}

/// The kind of state variable fixed at the reactor outlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutletVariable {
    Temperature,
    Pressure,
    MolarFlow,

    /// Imposed by a counter-current coolant, whose inlet sits at the reactor outlet.
    CoolantTemperature,
}

impl fmt::Display for OutletVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => f.write_str("temperature"),
            Self::Pressure => f.write_str("pressure"),
            Self::MolarFlow => f.write_str("molar flow"),
            Self::CoolantTemperature => f.write_str("coolant temperature"),
        }
    }
}

/// A value imposed at the outlet of a stationary plug-flow reactor.
///
/// Each condition leaves the inlet value of the same variable unknown.
/// A single temperature or pressure condition is met by bisection within
/// `bracket`; several conditions, or a molar flow, by Newton iteration on
/// all unknown inlet values at once.
#[derive(Debug, Clone, PartialEq)]
pub enum OutletCondition {
    Temperature {
        target: ThermodynamicTemperature,
        bracket: [ThermodynamicTemperature; 2],
    },
    Pressure {
        target: Pressure,
        bracket: [Pressure; 2],
    },

    /// Outlet molar flow of one substance, mol/s.
    MolarFlow { substance: String, target: f64 },
}

impl OutletCondition {
    #[must_use]
    pub fn variable(&self) -> OutletVariable {
        match self {
            Self::Temperature { .. } => OutletVariable::Temperature,
            Self::Pressure { .. } => OutletVariable::Pressure,
            Self::MolarFlow { .. } => OutletVariable::MolarFlow,
        }
    }
}

/// Vessel dimensions.
///
/// A plug-flow reactor needs a cross-section and either a length or a
/// volume (or both, if consistent); a stirred tank needs a volume.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geometry {
    pub length: Option<Length>,
    pub cross_section: Option<Area>,
    pub volume: Option<Volume>,
}

/// Operating parameters; which are required depends on the chosen policies.
#[derive(Debug, Clone, Default)]
pub struct OperatingParameters {
    /// Volumetric flow through the reactor.
    ///
    /// Required for a continuous stirred tank.
    /// Optional for a plug-flow reactor, where it is otherwise derived from
    /// the molar flows and the mixture molar volume at every point.
    pub volumetric_flow: Option<VolumeRate>,

    /// Catalyst mass per reactor volume, for heterogeneous reactions.
    pub catalyst_loading: Option<MassDensity>,

    pub heat_transfer_coefficient: Option<HeatTransfer>,
    pub heat_exchange_area: Option<Area>,

    /// Uniform coolant temperature, or the coolant inlet temperature when a
    /// [`Coolant`] stream is given.
    pub coolant_temperature: Option<ThermodynamicTemperature>,
    pub coolant: Option<Coolant>,

    /// Pressure-drop correlation for non-isobaric operation.
    pub pressure_drop: Option<Arc<dyn PressureDrop>>,

    /// Integration horizon for transient operation.
    pub end_time: Option<Time>,
}

/// Inlet, initial and outlet conditions.
///
/// Amounts are keyed by substance name, in SI units: mol/s for continuous
/// operation (inlet molar flows), mol for a closed vessel (initial charge).
/// Substances not listed start at zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryConditions {
    pub inlet_amounts: Vec<(String, f64)>,
    pub inlet_temperature: Option<ThermodynamicTemperature>,
    pub inlet_pressure: Option<Pressure>,

    /// Tank contents at time zero for a transient continuous stirred tank,
    /// mol; the tank starts filled with feed when absent.
    pub initial_holdup: Option<Vec<(String, f64)>>,

    /// Tank temperature at time zero; defaults to the inlet temperature.
    pub initial_temperature: Option<ThermodynamicTemperature>,

    pub outlets: Vec<OutletCondition>,
}

/// A declarative reactor description.
///
/// # Example
///
/// ```
/// use twine_reactors::models::reactor::{EnergyBalance, ReactorDescription, Regime, Topology};
/// use uom::si::{
///     area::square_meter, f64::{Area, Length, Pressure, ThermodynamicTemperature},
///     length::meter, pressure::bar, thermodynamic_temperature::kelvin,
/// };
///
/// let pfr = ReactorDescription::new(Topology::PlugFlow, Regime::Stationary)
///     .with_energy(EnergyBalance::Adiabatic)
///     .with_length(Length::new::<meter>(2.0))
///     .with_cross_section(Area::new::<square_meter>(0.01))
///     .with_inlet_amount("A", 1.0)
///     .with_inlet_temperature(ThermodynamicTemperature::new::<kelvin>(350.0))
///     .with_inlet_pressure(Pressure::new::<bar>(1.0));
///
/// assert_eq!(pfr.energy, EnergyBalance::Adiabatic);
/// ```
#[derive(Debug, Clone)]
pub struct ReactorDescription {
    pub topology: Topology,
    pub regime: Regime,
    pub site: ReactionSite,
    pub operation: Operation,
    pub energy: EnergyBalance,
    pub pressure: PressureBalance,
    pub geometry: Geometry,
    pub parameters: OperatingParameters,
    pub conditions: BoundaryConditions,
}

impl ReactorDescription {
    /// Starts a homogeneous, continuous, isothermic, isobaric description.
    #[must_use]
    pub fn new(topology: Topology, regime: Regime) -> Self {
        Self {
            topology,
            regime,
            site: ReactionSite::Homogeneous,
            operation: Operation::Continuous,
            energy: EnergyBalance::Isothermic,
            pressure: PressureBalance::Isobaric,
            geometry: Geometry::default(),
            parameters: OperatingParameters::default(),
            conditions: BoundaryConditions::default(),
        }
    }

    #[must_use]
    pub fn with_site(mut self, site: ReactionSite) -> Self {
        self.site = site;
        self
    }

    #[must_use]
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    #[must_use]
    pub fn with_energy(mut self, energy: EnergyBalance) -> Self {
        self.energy = energy;
        self
    }

    #[must_use]
    pub fn with_pressure(mut self, pressure: PressureBalance) -> Self {
        self.pressure = pressure;
        self
    }

    #[must_use]
    pub fn with_length(mut self, length: Length) -> Self {
        self.geometry.length = Some(length);
        self
    }

    #[must_use]
    pub fn with_cross_section(mut self, area: Area) -> Self {
        self.geometry.cross_section = Some(area);
        self
    }

    #[must_use]
    pub fn with_volume(mut self, volume: Volume) -> Self {
        self.geometry.volume = Some(volume);
        self
    }

    #[must_use]
    pub fn with_volumetric_flow(mut self, flow: VolumeRate) -> Self {
        self.parameters.volumetric_flow = Some(flow);
        self
    }

    #[must_use]
    pub fn with_catalyst_loading(mut self, loading: MassDensity) -> Self {
        self.parameters.catalyst_loading = Some(loading);
        self
    }

    /// Sets the wall heat exchange: coefficient, total area and coolant temperature.
    #[must_use]
    pub fn with_heat_exchange(
        mut self,
        coefficient: HeatTransfer,
        area: Area,
        coolant: ThermodynamicTemperature,
    ) -> Self {
        self.parameters.heat_transfer_coefficient = Some(coefficient);
        self.parameters.heat_exchange_area = Some(area);
        self.parameters.coolant_temperature = Some(coolant);
        self
    }

    /// Lets the coolant temperature vary along a plug-flow reactor.
    #[must_use]
    pub fn with_coolant(
        mut self,
        mass_flow: MassRate,
        specific_heat: SpecificHeatCapacity,
        flow: CoolantFlow,
    ) -> Self {
        self.parameters.coolant = Some(Coolant {
            mass_flow,
            specific_heat,
            flow,
        });
        self
    }

    #[must_use]
    pub fn with_pressure_drop(mut self, correlation: impl PressureDrop + 'static) -> Self {
        self.parameters.pressure_drop = Some(Arc::new(correlation));
        self
    }

    #[must_use]
    pub fn with_end_time(mut self, end_time: Time) -> Self {
        self.parameters.end_time = Some(end_time);
        self
    }

    #[must_use]
    pub fn with_inlet_amount(mut self, substance: impl Into<String>, amount: f64) -> Self {
        self.conditions.inlet_amounts.push((substance.into(), amount));
        self
    }

    #[must_use]
    pub fn with_inlet_temperature(mut self, temperature: ThermodynamicTemperature) -> Self {
        self.conditions.inlet_temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn with_inlet_pressure(mut self, pressure: Pressure) -> Self {
        self.conditions.inlet_pressure = Some(pressure);
        self
    }

    #[must_use]
    pub fn with_initial_holdup(mut self, holdup: Vec<(String, f64)>) -> Self {
        self.conditions.initial_holdup = Some(holdup);
        self
    }

    #[must_use]
    pub fn with_initial_temperature(mut self, temperature: ThermodynamicTemperature) -> Self {
        self.conditions.initial_temperature = Some(temperature);
        self
    }

    /// Adds an outlet condition; conditions accumulate.
    #[must_use]
    pub fn with_outlet(mut self, condition: OutletCondition) -> Self {
        self.conditions.outlets.push(condition);
        self
    }
}
