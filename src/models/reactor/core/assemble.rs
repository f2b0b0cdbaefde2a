//! Equation assembly.
//!
//! [`assemble`] selects the active state variables for a configuration and
//! binds the balance policies, the reaction network and the property model
//! into one evaluation function `(x, y) → dy/dx`.
//!
//! The state vector is laid out as
//!
//! ```text
//! [ amount_0 … amount_{n−1} | T (unless isothermic) | Tc (coolant stream only) | P (unless isobaric) ]
//! ```
//!
//! in plain SI units: mol/s along a plug-flow reactor, mol in a tank.

use std::fmt;

use nalgebra::DVector;
use uom::si::{
    f64::{Pressure, ThermodynamicTemperature},
    molar_heat_capacity::joule_per_kelvin_mole,
    molar_volume::cubic_meter_per_mole,
    pressure::pascal,
    thermodynamic_temperature::kelvin,
};

use crate::support::{
    kinetics::{KineticArgument, KineticInput, ReactionNetwork},
    ode::OdeSystem,
    thermo::{MixtureModel, MixtureView, PropertyError},
};

use super::{
    ConfigurationError, Field, NumericalDomainError, ReactorConfiguration,
    policy::{Feed, FlowContext, Operation, Point, Thermal, Vessel},
};

/// One entry of the assembled state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateVariable {
    /// Amount of the substance at this network index.
    Amount(usize),
    Temperature,
    CoolantTemperature,
    Pressure,
}

impl fmt::Display for StateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(i) => write!(f, "amount #{i}"),
            Self::Temperature => f.write_str("temperature"),
            Self::CoolantTemperature => f.write_str("coolant temperature"),
            Self::Pressure => f.write_str("pressure"),
        }
    }
}

/// The governing equations of one configured reactor.
///
/// Evaluation is pure: it reads the configuration, network and property
/// model and never mutates them, so the same system can be integrated any
/// number of times.
pub struct AssembledSystem<'a, P> {
    config: &'a ReactorConfiguration,
    network: &'a ReactionNetwork,
    properties: &'a P,
    variables: Vec<StateVariable>,
    inlet_temperature: f64,
    inlet_pressure: f64,
    coolant_start: Option<f64>,
}

/// Assembles the balance equations for `config`.
///
/// # Errors
///
/// Returns [`ConfigurationError`] if the network's substances do not match
/// the configuration, or if an inlet value is still unknown (an outlet
/// condition that has not been resolved).
pub fn assemble<'a, P: MixtureModel>(
    config: &'a ReactorConfiguration,
    network: &'a ReactionNetwork,
    properties: &'a P,
) -> Result<AssembledSystem<'a, P>, ConfigurationError> {
    let n = network.substances().len();
    if config.substance_count() != n {
        return Err(ConfigurationError::NetworkMismatch {
            expected: config.substance_count(),
            actual: n,
        });
    }

    let unresolved = |field| ConfigurationError::MissingParameter {
        field,
        required_by: "equation assembly",
    };
    let inlet_temperature = config
        .inlet_temperature()
        .ok_or_else(|| unresolved(Field::InletTemperature))?;
    let inlet_pressure = config
        .inlet_pressure()
        .ok_or_else(|| unresolved(Field::InletPressure))?;

    let coolant_start = if config.energy().has_coolant_equation() {
        Some(
            config
                .coolant_start()
                .ok_or_else(|| unresolved(Field::CoolantTemperature))?,
        )
    } else {
        None
    };

    let mut variables: Vec<_> = (0..n).map(StateVariable::Amount).collect();
    if config.energy().has_temperature_equation() {
        variables.push(StateVariable::Temperature);
    }
    if coolant_start.is_some() {
        variables.push(StateVariable::CoolantTemperature);
    }
    if config.pressure().has_pressure_equation() {
        variables.push(StateVariable::Pressure);
    }

    Ok(AssembledSystem {
        config,
        network,
        properties,
        variables,
        inlet_temperature,
        inlet_pressure,
        coolant_start,
    })
}

impl<P: MixtureModel> AssembledSystem<'_, P> {
    #[must_use]
    pub fn variables(&self) -> &[StateVariable] {
        &self.variables
    }

    /// Human-readable name of state entry `k`.
    #[must_use]
    pub fn variable_name(&self, k: usize) -> String {
        match self.variables.get(k) {
            Some(StateVariable::Amount(i)) => self
                .network
                .substances()
                .get(*i)
                .map_or_else(|| format!("amount #{i}"), |s| format!("amount of {}", s.name)),
            Some(variable) => variable.to_string(),
            None => format!("state #{k}"),
        }
    }

    /// Packs amounts, temperature and pressure into a state vector,
    /// dropping the variables that have no equation.
    ///
    /// The coolant temperature, when it is a state, starts at its value at
    /// the reactor inlet.
    #[must_use]
    pub fn pack(&self, amounts: &[f64], temperature: f64, pressure: f64) -> DVector<f64> {
        DVector::from_iterator(
            self.variables.len(),
            self.variables.iter().map(|variable| match variable {
                StateVariable::Amount(i) => amounts[*i],
                StateVariable::Temperature => temperature,
                StateVariable::CoolantTemperature => self.coolant_start.unwrap_or(f64::NAN),
                StateVariable::Pressure => pressure,
            }),
        )
    }

    /// Splits a state vector into amounts, temperature (K) and pressure (Pa),
    /// filling fixed variables with their inlet values.
    #[must_use]
    pub fn unpack<'y>(&self, y: &'y DVector<f64>) -> (&'y [f64], f64, f64) {
        let n = self.config.substance_count();
        let mut temperature = self.inlet_temperature;
        let mut pressure = self.inlet_pressure;
        for (k, variable) in self.variables.iter().enumerate().skip(n) {
            match variable {
                StateVariable::Temperature => temperature = y[k],
                StateVariable::Pressure => pressure = y[k],
                StateVariable::Amount(_) | StateVariable::CoolantTemperature => {}
            }
        }
        (&y.as_slice()[..n], temperature, pressure)
    }

    /// Coolant temperature in `y`, K, when it is a state.
    #[must_use]
    pub fn coolant_temperature(&self, y: &DVector<f64>) -> Option<f64> {
        self.variables
            .iter()
            .position(|v| *v == StateVariable::CoolantTemperature)
            .map(|k| y[k])
    }

    /// Coolant temperature at the reactor inlet, K, when it is a state.
    #[must_use]
    pub fn coolant_start(&self) -> Option<f64> {
        self.coolant_start
    }

    /// Inlet (feed) temperature, K.
    #[must_use]
    pub fn inlet_temperature(&self) -> f64 {
        self.inlet_temperature
    }

    /// Inlet pressure, Pa.
    #[must_use]
    pub fn inlet_pressure(&self) -> f64 {
        self.inlet_pressure
    }

    /// Evaluates `dy/dx` at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`NumericalDomainError`] if the reactor is empty, a property
    /// cannot be evaluated, a rate is not finite, or a derivative is not finite.
    pub fn evaluate(&self, x: f64, y: &DVector<f64>) -> Result<DVector<f64>, NumericalDomainError> {
        let mut dy = DVector::zeros(self.variables.len());
        self.evaluate_into(x, y, &mut dy)?;
        Ok(dy)
    }

    fn evaluate_into(
        &self,
        x: f64,
        y: &DVector<f64>,
        dy: &mut DVector<f64>,
    ) -> Result<(), NumericalDomainError> {
        let property = |source: PropertyError| NumericalDomainError::Property {
            position: x,
            source,
        };

        let (raw_amounts, temperature, pressure) = self.unpack(y);
        let amounts: Vec<f64> = raw_amounts.iter().map(|n| n.max(0.0)).collect();
        let total: f64 = amounts.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            return Err(NumericalDomainError::EmptyMixture { position: x });
        }

        let fractions: Vec<f64> = amounts.iter().map(|n| n / total).collect();
        let mixture = MixtureView::new(
            self.network.substances(),
            &fractions,
            ThermodynamicTemperature::new::<kelvin>(temperature),
            Pressure::new::<pascal>(pressure),
        );

        let vessel = self.config.vessel();
        let argument = self.network.kinetic_argument();
        let has_pressure_equation = self.config.pressure().has_pressure_equation();

        // Plug flow needs a volumetric flow for concentrations and pressure drop.
        let volumetric_flow = match (vessel, self.config.volumetric_flow()) {
            (Vessel::PlugFlow { .. }, Some(q)) => Some(q),
            (Vessel::PlugFlow { .. }, None)
                if argument == KineticArgument::Concentration || has_pressure_equation =>
            {
                let molar_volume = self
                    .properties
                    .molar_volume(&mixture)
                    .map_err(property)?
                    .get::<cubic_meter_per_mole>();
                Some(total * molar_volume)
            }
            (Vessel::StirredTank { .. }, q) => q,
            (Vessel::PlugFlow { .. }, None) => None,
        };

        let composition: Vec<f64> = match argument {
            KineticArgument::Concentration => {
                let basis = match vessel {
                    Vessel::PlugFlow { .. } => volumetric_flow.unwrap_or(f64::NAN),
                    Vessel::StirredTank { volume } => volume,
                };
                amounts.iter().map(|n| n / basis).collect()
            }
            KineticArgument::PartialPressure => self
                .properties
                .partial_pressures(&mixture)
                .map_err(property)?
                .iter()
                .map(|p| p.get::<pascal>())
                .collect(),
        };

        let scale = self.config.mass().rate_scale();
        let input = KineticInput {
            composition: &composition,
            temperature,
            pressure,
        };
        let rates = self
            .network
            .reactions()
            .iter()
            .map(|reaction| {
                let value = reaction.rate(&input) * scale;
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(NumericalDomainError::Rate {
                        reaction: reaction.name.clone(),
                        value,
                        position: x,
                    })
                }
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let stoichiometry = self.network.stoichiometry();
        let production: Vec<f64> = (0..amounts.len())
            .map(|i| {
                rates
                    .iter()
                    .enumerate()
                    .map(|(j, r)| stoichiometry[(j, i)] * r)
                    .sum()
            })
            .collect();

        let thermal = if self.config.energy().has_temperature_equation() {
            let heat_capacities = self
                .properties
                .heat_capacities(&mixture)
                .map_err(property)?
                .iter()
                .map(|cp| cp.get::<joule_per_kelvin_mole>())
                .collect();
            let reaction_enthalpies = self
                .network
                .reaction_enthalpies(self.properties, &mixture)
                .map_err(property)?;
            Some(Thermal {
                reaction_enthalpies,
                heat_capacities,
            })
        } else {
            None
        };

        let feed = match (vessel, self.config.mass().operation, volumetric_flow) {
            (Vessel::StirredTank { .. }, Operation::Continuous, Some(q)) => Some(Feed {
                amounts: self.config.inlet_amounts(),
                temperature: self.inlet_temperature,
                volumetric_flow: q,
            }),
            _ => None,
        };

        let point = Point {
            vessel,
            feed,
            amounts: &amounts,
            temperature,
            coolant_temperature: self.coolant_temperature(y),
            rates: &rates,
            production: &production,
            thermal,
        };

        let n = amounts.len();
        self.config
            .mass()
            .contribute(&point, &mut dy.as_mut_slice()[..n]);

        for (k, variable) in self.variables.iter().enumerate().skip(n) {
            dy[k] = match variable {
                StateVariable::Temperature => self.config.energy().contribute(&point).unwrap_or(0.0),
                StateVariable::CoolantTemperature => self
                    .config
                    .energy()
                    .coolant_contribute(&point)
                    .unwrap_or(0.0),
                StateVariable::Pressure => match vessel {
                    Vessel::PlugFlow { cross_section, .. } => {
                        let flow = FlowContext {
                            mixture,
                            properties: self.properties,
                            volumetric_flow: volumetric_flow.unwrap_or(f64::NAN),
                            cross_section,
                        };
                        self.config
                            .pressure()
                            .contribute(&flow)
                            .map_err(property)?
                            .unwrap_or(0.0)
                    }
                    Vessel::StirredTank { .. } => 0.0,
                },
                StateVariable::Amount(_) => dy[k],
            };
        }

        if let Some((k, &value)) = dy.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(NumericalDomainError::Derivative {
                variable: self.variable_name(k),
                value,
                position: x,
            });
        }
        Ok(())
    }
}

impl<P: MixtureModel> OdeSystem for AssembledSystem<'_, P> {
    type Error = NumericalDomainError;

    fn dimension(&self) -> usize {
        self.variables.len()
    }

    fn derivatives(
        &self,
        x: f64,
        y: &DVector<f64>,
        dy: &mut DVector<f64>,
    ) -> Result<(), NumericalDomainError> {
        self.evaluate_into(x, y, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        area::square_meter,
        f64::{Area, HeatTransfer, Length, MassRate, MolarVolume, SpecificHeatCapacity},
        heat_transfer::watt_per_square_meter_kelvin,
        length::millimeter,
        mass_rate::kilogram_per_second,
        specific_heat_capacity::joule_per_kilogram_kelvin,
    };

    use crate::{
        models::reactor::core::{
            CoolantFlow, EnergyBalance, Field, PressureBalance,
            policy::Ergun,
            test_support::{
                first_order, first_order_with_enthalpy, inert, pfr, stirred_tank, substances,
            },
        },
        support::{
            kinetics::{Reaction, ReactionNetwork},
            thermo::model::{IdealGas, IdealSolution},
        },
    };

    /// A gas with a uniform fugacity coefficient of one half.
    struct HalfFugacity;

    impl MixtureModel for HalfFugacity {
        fn molar_volume(&self, mixture: &MixtureView<'_>) -> Result<MolarVolume, PropertyError> {
            IdealGas::new().molar_volume(mixture)
        }

        fn partial_pressures(
            &self,
            mixture: &MixtureView<'_>,
        ) -> Result<Vec<Pressure>, PropertyError> {
            Ok(IdealGas::new()
                .partial_pressures(mixture)?
                .into_iter()
                .map(|p| 0.5 * p)
                .collect())
        }
    }

    #[test]
    fn isothermic_isobaric_has_amounts_only() {
        let config = ReactorConfiguration::new(&pfr(), &first_order(0.1)).unwrap();
        let network = first_order(0.1);
        let properties = IdealSolution::new();
        let system = assemble(&config, &network, &properties).unwrap();

        assert_eq!(
            system.variables(),
            &[StateVariable::Amount(0), StateVariable::Amount(1)]
        );

        // c_A = 1 mol/s / 0.2 m³/s = 5 mol/m³, r = 0.5, A = 1 m².
        let y = system.pack(&[1.0, 0.0], 300.0, 1e5);
        let dy = system.evaluate(0.0, &y).unwrap();
        assert_relative_eq!(dy[0], -0.5);
        assert_relative_eq!(dy[1], 0.5);
    }

    #[test]
    fn energy_and_pressure_add_variables() {
        let description = pfr()
            .with_energy(EnergyBalance::NonIsothermic)
            .with_heat_exchange(
                HeatTransfer::new::<watt_per_square_meter_kelvin>(50.0),
                Area::new::<square_meter>(2.0),
                ThermodynamicTemperature::new::<kelvin>(280.0),
            )
            .with_pressure(PressureBalance::NonIsobaric)
            .with_pressure_drop(Ergun::new(0.4, Length::new::<millimeter>(3.0)).unwrap());
        let network = first_order_with_enthalpy(0.1, -40_000.0);
        let config = ReactorConfiguration::new(&description, &network).unwrap();
        let properties = IdealSolution::new();
        let system = assemble(&config, &network, &properties).unwrap();

        assert_eq!(system.variables().len(), 4);
        assert_eq!(system.variables()[2], StateVariable::Temperature);
        assert_eq!(system.variables()[3], StateVariable::Pressure);

        let y = system.pack(&[1.0, 0.0], 300.0, 2e5);
        let (amounts, t, p) = system.unpack(&y);
        assert_eq!((amounts, t, p), (&[1.0, 0.0][..], 300.0, 2e5));

        let dy = system.evaluate(0.0, &y).unwrap();
        // (A·(−ΔH)·r + U·(a/L)·(Tc − T)) / Σ F cp
        let expected = (40_000.0 * 0.5 + 50.0 * 2.0 * (280.0 - 300.0)) / 100.0;
        assert_relative_eq!(dy[2], expected, max_relative = 1e-12);
        assert!(dy[3] < 0.0);
    }

    #[test]
    fn continuous_tank_balance() {
        let config = ReactorConfiguration::new(&stirred_tank(), &first_order(0.1)).unwrap();
        let network = first_order(0.1);
        let properties = IdealSolution::new();
        let system = assemble(&config, &network, &properties).unwrap();

        // N_A = 2 mol in 1 m³: r = 0.2; outflow N·Q/V = 0.4 mol/s.
        let y = system.pack(&[2.0, 0.0], 300.0, 1e5);
        let dy = system.evaluate(0.0, &y).unwrap();
        assert_relative_eq!(dy[0], 1.0 - 0.4 - 0.2);
        assert_relative_eq!(dy[1], 0.2);
    }

    #[test]
    fn empty_reactor_is_a_domain_error() {
        let config = ReactorConfiguration::new(&pfr(), &inert()).unwrap();
        let network = inert();
        let properties = IdealSolution::new();
        let system = assemble(&config, &network, &properties).unwrap();

        let err = system.evaluate(0.3, &system.pack(&[0.0, 0.0], 300.0, 1e5)).unwrap_err();
        assert_eq!(err, NumericalDomainError::EmptyMixture { position: 0.3 });
    }

    #[test]
    fn non_finite_rate_names_reaction() {
        let network = ReactionNetwork::new(
            substances(),
            vec![
                Reaction::new("bad", |_c: &[f64], _t: f64| f64::NAN)
                    .with_coefficient("A", -1.0)
                    .with_coefficient("B", 1.0),
            ],
        )
        .unwrap();
        let config = ReactorConfiguration::new(&pfr(), &network).unwrap();
        let properties = IdealSolution::new();
        let system = assemble(&config, &network, &properties).unwrap();

        let err = system.evaluate(0.0, &system.pack(&[1.0, 0.0], 300.0, 1e5)).unwrap_err();
        assert!(matches!(
            err,
            NumericalDomainError::Rate { ref reaction, position, .. }
                if reaction == "bad" && position == 0.0
        ));
    }

    #[test]
    fn rejects_mismatched_network() {
        let config = ReactorConfiguration::new(&pfr(), &inert()).unwrap();
        let network = ReactionNetwork::new(
            vec![crate::support::thermo::Substance::new("A")],
            Vec::new(),
        )
        .unwrap();
        let properties = IdealSolution::new();
        assert!(matches!(
            assemble(&config, &network, &properties),
            Err(ConfigurationError::NetworkMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn evaluation_is_pure() {
        let config = ReactorConfiguration::new(&pfr(), &first_order(0.1)).unwrap();
        let network = first_order(0.1);
        let properties = IdealSolution::new();
        let system = assemble(&config, &network, &properties).unwrap();

        let y = system.pack(&[0.7, 0.3], 300.0, 1e5);
        assert_eq!(system.evaluate(0.5, &y).unwrap(), system.evaluate(0.5, &y).unwrap());
    }

    #[test]
    fn partial_pressures_come_from_the_property_model() {
        let network = ReactionNetwork::new(
            substances(),
            vec![
                Reaction::new("A->B", |p: &[f64], _t: f64| 1e-6 * p[0])
                    .with_coefficient("A", -1.0)
                    .with_coefficient("B", 1.0),
            ],
        )
        .unwrap()
        .with_kinetic_argument(KineticArgument::PartialPressure);
        let config = ReactorConfiguration::new(&pfr(), &network).unwrap();

        // p_A = 0.5 bar, so r = 0.05 over 1 m².
        let ideal_gas = IdealGas::new();
        let ideal = assemble(&config, &network, &ideal_gas).unwrap();
        let y = ideal.pack(&[0.5, 0.5], 300.0, 1e5);
        assert_relative_eq!(ideal.evaluate(0.0, &y).unwrap()[0], -0.05, max_relative = 1e-12);

        let corrected = assemble(&config, &network, &HalfFugacity).unwrap();
        assert_relative_eq!(
            corrected.evaluate(0.0, &y).unwrap()[0],
            -0.025,
            max_relative = 1e-12
        );
    }

    #[test]
    fn counter_current_coolant_waits_for_its_start_value() {
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
                CoolantFlow::CounterCurrent,
            )
            .with_pressure(PressureBalance::NonIsobaric)
            .with_pressure_drop(Ergun::new(0.4, Length::new::<millimeter>(3.0)).unwrap());
        let network = inert();
        let config = ReactorConfiguration::new(&description, &network).unwrap();
        let properties = IdealSolution::new();

        assert!(matches!(
            assemble(&config, &network, &properties),
            Err(ConfigurationError::MissingParameter {
                field: Field::CoolantTemperature,
                ..
            })
        ));

        let resolved = config.with_inlet_values(&[(StateVariable::CoolantTemperature, 290.0)]);
        let system = assemble(&resolved, &network, &properties).unwrap();
        assert_eq!(
            &system.variables()[2..],
            &[
                StateVariable::Temperature,
                StateVariable::CoolantTemperature,
                StateVariable::Pressure,
            ]
        );
        assert_eq!(system.variable_name(3), "coolant temperature");

        let y = system.pack(&[1.0, 0.0], 300.0, 2e5);
        assert_eq!(y.as_slice(), &[1.0, 0.0, 300.0, 290.0, 2e5]);
        assert_eq!(system.unpack(&y), (&[1.0, 0.0][..], 300.0, 2e5));

        // The reactor loses 100 W/m; against the flow the coolant cools by 100/2000 K/m.
        let dy = system.evaluate(0.0, &y).unwrap();
        assert_relative_eq!(dy[2], -1.0);
        assert_relative_eq!(dy[3], -0.05);
    }
}
