//! Chemical reactor models.
//!
//! [`Reactor`] is the [`twine_core::Model`] adapter: it holds a reaction
//! network, a mixture property model and an ODE solver, and maps a
//! validated [`ReactorConfiguration`] to a [`ProfileResult`].
//! The computational core is in the internal [`core`] module.
//!
//! # Example
//!
//! ```
//! use twine_core::Model;
//! use twine_reactors::{
//!     models::reactor::{Reactor, ReactorDescription, Regime, Topology},
//!     support::{
//!         kinetics::{Arrhenius, PowerLaw, Reaction, ReactionNetwork},
//!         thermo::{Substance, model::IdealSolution},
//!     },
//! };
//! use uom::si::{
//!     area::square_meter,
//!     f64::{Area, Length, MolarVolume, Pressure, ThermodynamicTemperature, VolumeRate},
//!     length::meter,
//!     molar_volume::cubic_meter_per_mole,
//!     pressure::bar,
//!     thermodynamic_temperature::kelvin,
//!     volume_rate::cubic_meter_per_second,
//! };
//!
//! let liquid = |name: &str| {
//!     Substance::new(name)
//!         .with_liquid_molar_volume(MolarVolume::new::<cubic_meter_per_mole>(5.0e-5))
//! };
//! let network = ReactionNetwork::new(
//!     vec![liquid("A"), liquid("B")],
//!     vec![
//!         Reaction::new("A->B", PowerLaw::new(Arrhenius::constant(0.1)).with_order(0, 1.0))
//!             .with_coefficient("A", -1.0)
//!             .with_coefficient("B", 1.0),
//!     ],
//! )?;
//!
//! // τ = V/Q = 5 s.
//! let description = ReactorDescription::new(Topology::PlugFlow, Regime::Stationary)
//!     .with_length(Length::new::<meter>(1.0))
//!     .with_cross_section(Area::new::<square_meter>(1.0))
//!     .with_volumetric_flow(VolumeRate::new::<cubic_meter_per_second>(0.2))
//!     .with_inlet_amount("A", 1.0)
//!     .with_inlet_temperature(ThermodynamicTemperature::new::<kelvin>(300.0))
//!     .with_inlet_pressure(Pressure::new::<bar>(1.0));
//!
//! let reactor = Reactor::new(network, IdealSolution::new());
//! let config = reactor.configure(&description)?;
//! let profile = reactor.call(&config)?;
//!
//! let conversion = profile.conversion("A")?.into_inner();
//! assert!((conversion - (1.0 - (-0.5_f64).exp())).abs() < 1e-6);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub(crate) mod core;

pub use self::core::{
    AmountBasis, AssembledSystem, Axis, BoundaryConditions, Choice, ConfigurationError, Coolant,
    CoolantFlow, CoolantStream, DriverState, EnergyBalance, EnergyPolicy, Ergun, Field,
    FlowContext, Geometry, HeatExchange, IntegrationDriver, IntegrationError, IntegrationSettings,
    MassPolicy, MixtureState, NumericalDomainError, OperatingParameters, Operation,
    OutletCondition, OutletTarget, OutletVariable, PhysicalConstraintError, PressureBalance,
    PressureDrop, PressurePolicy, ProfileResult, ReactionSite, ReactorConfiguration,
    ReactorDescription, ReactorError, Regime, ShootingConfig, StateVariable, SteadyStateConfig,
    Topology, UndefinedQuantityError, Vessel, assemble,
};

use twine_core::Model;

use crate::support::{
    kinetics::ReactionNetwork,
    ode::{Dopri5, OdeSolver},
    thermo::MixtureModel,
};

/// A reactor model bound to one reaction network and property model.
///
/// Every call is an independent solve; a `Reactor` can be shared across
/// threads to run parameter sweeps in parallel.
#[derive(Debug, Clone)]
pub struct Reactor<P, S = Dopri5> {
    network: ReactionNetwork,
    properties: P,
    solver: S,
    settings: IntegrationSettings,
}

impl<P: MixtureModel> Reactor<P> {
    /// Creates a reactor integrated with the adaptive [`Dopri5`] solver.
    #[must_use]
    pub fn new(network: ReactionNetwork, properties: P) -> Self {
        Self::with_solver(network, properties, Dopri5::new())
    }
}

impl<P: MixtureModel, S: OdeSolver> Reactor<P, S> {
    #[must_use]
    pub fn with_solver(network: ReactionNetwork, properties: P, solver: S) -> Self {
        Self {
            network,
            properties,
            solver,
            settings: IntegrationSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: IntegrationSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn network(&self) -> &ReactionNetwork {
        &self.network
    }

    /// Validates `description` against this reactor's network.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for incompatible choices, missing or
    /// invalid parameters, and amounts that do not match the network.
    pub fn configure(
        &self,
        description: &ReactorDescription,
    ) -> Result<ReactorConfiguration, ConfigurationError> {
        ReactorConfiguration::new(description, &self.network)
    }
}

impl<P: MixtureModel, S: OdeSolver> Model for Reactor<P, S> {
    type Input = ReactorConfiguration;
    type Output = ProfileResult;
    type Error = ReactorError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        IntegrationDriver::new(input, &self.network, &self.properties, &self.solver)
            .with_settings(self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    use approx::assert_relative_eq;
    use uom::si::{
        area::square_meter,
        f64::{
            Area, HeatTransfer, MassRate, SpecificHeatCapacity, ThermodynamicTemperature,
            VolumeRate,
        },
        heat_transfer::watt_per_square_meter_kelvin,
        mass_rate::kilogram_per_second,
        specific_heat_capacity::joule_per_kilogram_kelvin,
        thermodynamic_temperature::kelvin,
        volume_rate::cubic_meter_per_second,
    };

    use crate::support::{
        constraint::ConstraintError,
        kinetics::{Arrhenius, PowerLaw, Reaction},
        ode::Rk4,
        thermo::model::IdealSolution,
    };

    use super::core::test_support::{first_order, inert, pfr, substances};

    fn first_order_conversion(k: f64) -> f64 {
        let reactor = Reactor::new(first_order(k), IdealSolution::new());
        let config = reactor.configure(&pfr()).unwrap();
        reactor.call(&config).unwrap().conversion("A").unwrap().into_inner()
    }

    #[test]
    fn first_order_plug_flow_closes_mass_balance() {
        let reactor = Reactor::new(first_order(0.1), IdealSolution::new());
        let config = reactor.configure(&pfr()).unwrap();
        let profile = reactor.call(&config).unwrap();

        let expected = 1.0 - (-0.5_f64).exp();
        assert_relative_eq!(
            profile.conversion("A").unwrap().into_inner(),
            expected,
            max_relative = 1e-6
        );
        let formed = profile.profile("B").unwrap();
        assert_relative_eq!(formed[formed.len() - 1], expected, max_relative = 1e-6);
        for state in profile.states() {
            assert_relative_eq!(state.amounts[0] + state.amounts[1], 1.0, max_relative = 1e-9);
        }
        assert_eq!(profile.limiting_reactant().unwrap(), "A");
        assert_relative_eq!(
            profile.selectivity("B", "A").unwrap().into_inner(),
            1.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn repeated_calls_are_identical() {
        let reactor = Reactor::new(first_order(0.1), IdealSolution::new());
        let config = reactor.configure(&pfr()).unwrap();

        let first = reactor.call(&config).unwrap();
        let again = reactor.call(&config).unwrap();
        assert_eq!(first.states(), again.states());
    }

    #[test]
    fn fixed_step_solver_agrees() {
        let reactor = Reactor::with_solver(first_order(0.1), IdealSolution::new(), Rk4::new(200));
        let config = reactor.configure(&pfr()).unwrap();
        let profile = reactor.call(&config).unwrap();

        assert_relative_eq!(
            profile.conversion("A").unwrap().into_inner(),
            1.0 - (-0.5_f64).exp(),
            max_relative = 1e-8
        );
    }

    #[test]
    fn adiabatic_outlet_temperature_is_rejected_before_solving() {
        let reactor = Reactor::new(first_order(0.1), IdealSolution::new());
        let description = pfr().with_energy(EnergyBalance::Adiabatic).with_outlet(
            OutletCondition::Temperature {
                target: ThermodynamicTemperature::new::<kelvin>(350.0),
                bracket: [
                    ThermodynamicTemperature::new::<kelvin>(300.0),
                    ThermodynamicTemperature::new::<kelvin>(400.0),
                ],
            },
        );

        assert!(matches!(
            reactor.configure(&description),
            Err(ConfigurationError::Incompatible {
                first: Choice::Energy(EnergyBalance::Adiabatic),
                second: Choice::Outlet(OutletVariable::Temperature),
                ..
            })
        ));
    }

    #[test]
    fn cooled_equations_can_be_assembled_directly() {
        let reactor = Reactor::new(inert(), IdealSolution::new());
        let description = pfr()
            .with_energy(EnergyBalance::NonIsothermic)
            .with_heat_exchange(
                HeatTransfer::new::<watt_per_square_meter_kelvin>(10.0),
                Area::new::<square_meter>(1.0),
                ThermodynamicTemperature::new::<kelvin>(280.0),
            )
            .with_coolant(
                MassRate::new::<kilogram_per_second>(0.5),
                SpecificHeatCapacity::new::<joule_per_kilogram_kelvin>(4000.0),
                CoolantFlow::CoCurrent,
            );
        let config = reactor.configure(&description).unwrap();

        assert!(matches!(config.vessel(), Vessel::PlugFlow { .. }));
        assert!(matches!(config.pressure(), PressurePolicy::Isobaric));
        assert_eq!(config.mass().operation, Operation::Continuous);
        assert!(matches!(
            config.energy(),
            EnergyPolicy::NonIsothermic(HeatExchange {
                stream: Some(CoolantStream {
                    flow: CoolantFlow::CoCurrent,
                    ..
                }),
                ..
            })
        ));
        assert!(config.outlets().iter().all(|o: &OutletTarget| o.bounds()[0] >= 0.0));

        let properties = IdealSolution::new();
        let system: AssembledSystem<'_, _> =
            assemble(&config, reactor.network(), &properties).unwrap();
        assert_eq!(
            system.variables(),
            &[
                StateVariable::Amount(0),
                StateVariable::Amount(1),
                StateVariable::Temperature,
                StateVariable::CoolantTemperature,
            ]
        );

        // U·a·(Tc − T) = −200 W over Σ F cp = 100 W/K and ṁ·cp = 2000 W/K.
        let y = system.pack(&[1.0, 0.0], 300.0, 1e5);
        assert_eq!(system.coolant_temperature(&y), Some(280.0));
        let dy = system.evaluate(0.0, &y).unwrap();
        assert_relative_eq!(dy[2], -2.0);
        assert_relative_eq!(dy[3], 0.1);
    }

    #[test]
    fn unknown_substance_has_no_selectivity() {
        let reactor = Reactor::new(first_order(0.1), IdealSolution::new());
        let config = reactor.configure(&pfr()).unwrap();
        let profile = reactor.call(&config).unwrap();

        assert_eq!(
            profile.selectivity("C", "A").unwrap_err(),
            UndefinedQuantityError::UnknownSubstance { name: "C".into() }
        );
    }

    #[test]
    fn invalid_parameter_keeps_its_cause() {
        let reactor = Reactor::new(first_order(0.1), IdealSolution::new());
        let description =
            pfr().with_volumetric_flow(VolumeRate::new::<cubic_meter_per_second>(-1.0));

        assert_eq!(
            reactor.configure(&description).unwrap_err(),
            ConfigurationError::InvalidParameter {
                field: Field::VolumetricFlow,
                source: ConstraintError::Negative,
            }
        );
    }

    #[test]
    fn parallel_sweep_matches_serial() {
        let rates = [0.05, 0.1, 0.2, 0.4];
        let serial: Vec<f64> = rates.iter().map(|&k| first_order_conversion(k)).collect();

        let parallel: Vec<f64> = thread::scope(|scope| {
            let handles: Vec<_> = rates
                .iter()
                .map(|&k| scope.spawn(move || first_order_conversion(k)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(serial, parallel);
    }

    #[test]
    fn shared_reactor_runs_on_threads() {
        let network = ReactionNetwork::new(
            substances(),
            vec![
                Reaction::new("A->B", PowerLaw::new(Arrhenius::constant(0.1)).with_order(0, 1.0))
                    .with_coefficient("A", -1.0)
                    .with_coefficient("B", 1.0),
            ],
        )
        .unwrap();
        let reactor = Reactor::new(network, IdealSolution::new());
        let config = reactor.configure(&pfr()).unwrap();
        let expected = reactor.call(&config).unwrap();

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let profile = reactor.call(&config).unwrap();
                    assert_eq!(profile.states(), expected.states());
                });
            }
        });
    }
}
