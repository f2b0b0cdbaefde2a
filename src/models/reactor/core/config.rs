//! Validated reactor configuration.
//!
//! [`ReactorConfiguration::new`] turns a [`ReactorDescription`] into plain SI
//! values and balance policies, after checking it against the
//! [compatibility and requirement tables](rules).
//! A configuration is immutable and can be shared across threads; running
//! it never mutates it.

mod error;
mod rules;

pub use error::ConfigurationError;
pub use rules::{Choice, Field};

use uom::si::{
    area::square_meter, f64::ThermodynamicTemperature,
    heat_transfer::watt_per_square_meter_kelvin, length::meter,
    mass_density::kilogram_per_cubic_meter, mass_rate::kilogram_per_second, pressure::pascal,
    specific_heat_capacity::joule_per_kilogram_kelvin, thermodynamic_temperature::kelvin,
    time::second, volume::cubic_meter, volume_rate::cubic_meter_per_second,
};

use crate::support::{
    constraint::{ConstraintError, NonNegative, StrictlyPositive},
    kinetics::ReactionNetwork,
};

use super::{
    assemble::StateVariable,
    description::{
        Coolant, CoolantFlow, EnergyBalance, OutletCondition, OutletVariable, PressureBalance,
        ReactorDescription, Regime, Topology,
    },
    policy::{
        CoolantStream, EnergyPolicy, HeatExchange, MassPolicy, Operation, PressurePolicy,
        ReactionSite, Vessel,
    },
};

/// Relative mismatch tolerated between `A·L` and a given volume.
const GEOMETRY_TOLERANCE: f64 = 1e-9;

/// An outlet condition in SI units (mol/s, K or Pa).
///
/// The inlet value of `variable` is the unknown that meets it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutletTarget {
    pub variable: StateVariable,
    pub target: f64,

    /// Divides the outlet mismatch: the target itself, or a reference flow
    /// for molar flows (whose target may be zero).
    pub scale: f64,

    /// Search interval for the inlet value, when one was given.
    pub bracket: Option<[f64; 2]>,

    /// First inlet value tried by Newton iteration.
    pub guess: f64,
}

impl OutletTarget {
    /// Scaled mismatch `(target − value)/scale`.
    #[must_use]
    pub fn residual(&self, value: f64) -> f64 {
        (self.target - value) / self.scale
    }

    /// Admissible inlet values: the bracket, or the physical range.
    #[must_use]
    pub fn bounds(&self) -> [f64; 2] {
        match (self.bracket, self.variable) {
            (Some(bracket), _) => bracket,
            (None, StateVariable::Amount(_)) => [0.0, f64::INFINITY],
            (None, _) => [f64::MIN_POSITIVE, f64::INFINITY],
        }
    }
}

/// A validated, immutable reactor configuration.
///
/// Amount vectors are dense and follow the network's substance order.
#[derive(Debug, Clone)]
pub struct ReactorConfiguration {
    topology: Topology,
    regime: Regime,
    mass: MassPolicy,
    energy: EnergyPolicy,
    pressure: PressurePolicy,
    vessel: Vessel,
    volumetric_flow: Option<f64>,
    end_time: Option<f64>,
    inlet_amounts: Vec<f64>,
    inlet_temperature: Option<f64>,
    inlet_pressure: Option<f64>,
    initial_holdup: Option<Vec<f64>>,
    initial_temperature: Option<f64>,
    coolant_start: Option<f64>,
    outlets: Vec<OutletTarget>,
}

impl ReactorConfiguration {
    /// Validates `description` against `network`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if two choices are incompatible, a
    /// required parameter is missing or out of range, a variable is fixed at
    /// both ends, the geometry is inconsistent, or an amount names an unknown
    /// substance or is negative.
    pub fn new(
        description: &ReactorDescription,
        network: &ReactionNetwork,
    ) -> Result<Self, ConfigurationError> {
        let choices = choices(description);
        rules::check_compatibility(&choices)?;

        let conditions = &description.conditions;
        for outlet in &conditions.outlets {
            let inlet_given = match outlet {
                OutletCondition::Temperature { .. } => conditions.inlet_temperature.is_some(),
                OutletCondition::Pressure { .. } => conditions.inlet_pressure.is_some(),
                OutletCondition::MolarFlow { substance, .. } => conditions
                    .inlet_amounts
                    .iter()
                    .any(|(name, _)| name == substance),
            };
            if inlet_given {
                return Err(ConfigurationError::OverSpecified {
                    variable: outlet.variable(),
                });
            }
        }

        let geometry = &description.geometry;
        let parameters = &description.parameters;
        rules::check_requirements(&choices, |field| match field {
            Field::CrossSection => geometry.cross_section.is_some(),
            Field::LengthOrVolume => geometry.length.is_some() || geometry.volume.is_some(),
            Field::Volume => geometry.volume.is_some(),
            Field::VolumetricFlow => parameters.volumetric_flow.is_some(),
            Field::EndTime => parameters.end_time.is_some(),
            Field::CatalystLoading => parameters.catalyst_loading.is_some(),
            Field::HeatTransferCoefficient => parameters.heat_transfer_coefficient.is_some(),
            Field::HeatExchangeArea => parameters.heat_exchange_area.is_some(),
            Field::CoolantTemperature => parameters.coolant_temperature.is_some(),
            Field::PressureDrop => parameters.pressure_drop.is_some(),
            Field::ReactionEnthalpies => network.has_reaction_enthalpies(),
            Field::InletTemperature => conditions.inlet_temperature.is_some(),
            Field::InletPressure => conditions.inlet_pressure.is_some(),
            Field::InitialTemperature
            | Field::OutletTarget
            | Field::CoolantMassFlow
            | Field::CoolantSpecificHeat => true,
        })?;

        let vessel = vessel(description)?;

        let mass = MassPolicy {
            catalyst_loading: match description.site {
                ReactionSite::Homogeneous => None,
                ReactionSite::Heterogeneous => parameters
                    .catalyst_loading
                    .map(|rho| {
                        positive(Field::CatalystLoading, rho.get::<kilogram_per_cubic_meter>())
                    })
                    .transpose()?,
            },
            operation: description.operation,
        };

        let energy = match description.energy {
            EnergyBalance::Isothermic => EnergyPolicy::Isothermic,
            EnergyBalance::Adiabatic => EnergyPolicy::Adiabatic,
            EnergyBalance::NonIsothermic => EnergyPolicy::NonIsothermic(HeatExchange {
                coefficient: non_negative(
                    Field::HeatTransferCoefficient,
                    parameters
                        .heat_transfer_coefficient
                        .map_or(f64::NAN, |u| u.get::<watt_per_square_meter_kelvin>()),
                )?,
                area: non_negative(
                    Field::HeatExchangeArea,
                    parameters
                        .heat_exchange_area
                        .map_or(f64::NAN, |a| a.get::<square_meter>()),
                )?,
                coolant_temperature: positive(
                    Field::CoolantTemperature,
                    parameters.coolant_temperature.map_or(f64::NAN, |t| t.get::<kelvin>()),
                )?,
                stream: parameters.coolant.map(coolant_stream).transpose()?,
            }),
        };

        let pressure = match (description.pressure, &parameters.pressure_drop) {
            (PressureBalance::NonIsobaric, Some(correlation)) => {
                PressurePolicy::NonIsobaric(correlation.clone())
            }
            _ => PressurePolicy::Isobaric,
        };

        let continuous = description.operation == Operation::Continuous;
        let volumetric_flow = if continuous {
            parameters
                .volumetric_flow
                .map(|q| positive(Field::VolumetricFlow, q.get::<cubic_meter_per_second>()))
                .transpose()?
        } else {
            None
        };

        let end_time = match description.regime {
            Regime::Transient => parameters
                .end_time
                .map(|t| positive(Field::EndTime, t.get::<second>()))
                .transpose()?,
            Regime::Stationary => None,
        };

        let inlet_amounts = resolve_amounts(&conditions.inlet_amounts, network)?;
        let initial_holdup = conditions
            .initial_holdup
            .as_deref()
            .map(|holdup| resolve_amounts(holdup, network))
            .transpose()?;

        let mut outlets = conditions
            .outlets
            .iter()
            .map(|condition| outlet_target(condition, network, &inlet_amounts))
            .collect::<Result<Vec<_>, _>>()?;

        let flow_unknown = outlets
            .iter()
            .any(|o| matches!(o.variable, StateVariable::Amount(_)));
        if !flow_unknown && inlet_amounts.iter().all(|&a| a == 0.0) {
            return Err(ConfigurationError::NoInletMaterial);
        }

        // A counter-current coolant enters at the far end: its temperature
        // at the reactor inlet is unknown and its inlet temperature becomes
        // an outlet condition.
        let mut coolant_start = None;
        if let EnergyPolicy::NonIsothermic(HeatExchange {
            stream: Some(stream),
            coolant_temperature,
            ..
        }) = energy
        {
            match stream.flow {
                CoolantFlow::CoCurrent => coolant_start = Some(coolant_temperature),
                CoolantFlow::CounterCurrent => outlets.push(OutletTarget {
                    variable: StateVariable::CoolantTemperature,
                    target: coolant_temperature,
                    scale: coolant_temperature,
                    bracket: None,
                    guess: coolant_temperature,
                }),
            }
        }

        for (k, outlet) in outlets.iter().enumerate() {
            if outlets[..k].iter().any(|o| o.variable == outlet.variable) {
                return Err(ConfigurationError::DuplicateOutlet {
                    name: match outlet.variable {
                        StateVariable::Amount(i) => network
                            .substances()
                            .get(i)
                            .map_or_else(|| outlet.variable.to_string(), |s| s.name.clone()),
                        other => other.to_string(),
                    },
                });
            }
        }
        if initial_holdup
            .as_deref()
            .is_some_and(|holdup| holdup.iter().all(|&n| n == 0.0))
        {
            return Err(ConfigurationError::EmptyHoldup);
        }

        let temperature = |field, t: Option<ThermodynamicTemperature>| {
            t.map(|t| positive(field, t.get::<kelvin>())).transpose()
        };

        Ok(Self {
            topology: description.topology,
            regime: description.regime,
            mass,
            energy,
            pressure,
            vessel,
            volumetric_flow,
            end_time,
            inlet_amounts,
            inlet_temperature: temperature(Field::InletTemperature, conditions.inlet_temperature)?,
            inlet_pressure: conditions
                .inlet_pressure
                .map(|p| positive(Field::InletPressure, p.get::<pascal>()))
                .transpose()?,
            initial_holdup,
            initial_temperature: temperature(
                Field::InitialTemperature,
                conditions.initial_temperature,
            )?,
            coolant_start,
            outlets,
        })
    }

    #[must_use]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    #[must_use]
    pub fn regime(&self) -> Regime {
        self.regime
    }

    #[must_use]
    pub fn mass(&self) -> &MassPolicy {
        &self.mass
    }

    #[must_use]
    pub fn energy(&self) -> &EnergyPolicy {
        &self.energy
    }

    #[must_use]
    pub fn pressure(&self) -> &PressurePolicy {
        &self.pressure
    }

    #[must_use]
    pub fn vessel(&self) -> Vessel {
        self.vessel
    }

    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.mass.operation == Operation::Continuous
    }

    /// Configured volumetric flow, m³/s.
    #[must_use]
    pub fn volumetric_flow(&self) -> Option<f64> {
        self.volumetric_flow
    }

    /// Integration horizon for transient operation, s.
    #[must_use]
    pub fn end_time(&self) -> Option<f64> {
        self.end_time
    }

    /// Inlet molar flows (mol/s), or the initial charge (mol) of a closed vessel.
    #[must_use]
    pub fn inlet_amounts(&self) -> &[f64] {
        &self.inlet_amounts
    }

    /// Inlet temperature, K; `None` while an outlet temperature stands in for it.
    #[must_use]
    pub fn inlet_temperature(&self) -> Option<f64> {
        self.inlet_temperature
    }

    /// Inlet pressure, Pa; `None` while an outlet pressure stands in for it.
    #[must_use]
    pub fn inlet_pressure(&self) -> Option<f64> {
        self.inlet_pressure
    }

    /// Tank contents at time zero, mol, if given.
    #[must_use]
    pub fn initial_holdup(&self) -> Option<&[f64]> {
        self.initial_holdup.as_deref()
    }

    /// Tank temperature at time zero, K, if it differs from the inlet.
    #[must_use]
    pub fn initial_temperature(&self) -> Option<f64> {
        self.initial_temperature
    }

    /// Outlet conditions still to be met by shooting on inlet values.
    #[must_use]
    pub fn outlets(&self) -> &[OutletTarget] {
        &self.outlets
    }

    /// Coolant temperature at the reactor inlet, K, when the coolant
    /// temperature is a state; `None` while a counter-current coolant has
    /// not been resolved.
    #[must_use]
    pub fn coolant_start(&self) -> Option<f64> {
        self.coolant_start
    }

    #[must_use]
    pub fn substance_count(&self) -> usize {
        self.inlet_amounts.len()
    }

    /// Space time `V/Q`, s, when a volumetric flow is configured.
    #[must_use]
    pub fn residence_time(&self) -> Option<f64> {
        self.volumetric_flow.map(|q| self.vessel.volume() / q)
    }

    /// Returns a copy with fixed inlet values and no outlet conditions left.
    #[must_use]
    pub(crate) fn with_inlet_values(&self, values: &[(StateVariable, f64)]) -> Self {
        let mut fixed = self.clone();
        for &(variable, value) in values {
            match variable {
                StateVariable::Amount(i) => {
                    if let Some(amount) = fixed.inlet_amounts.get_mut(i) {
                        *amount = value;
                    }
                }
                StateVariable::Temperature => fixed.inlet_temperature = Some(value),
                StateVariable::CoolantTemperature => fixed.coolant_start = Some(value),
                StateVariable::Pressure => fixed.inlet_pressure = Some(value),
            }
        }
        fixed.outlets.clear();
        fixed
    }
}

fn choices(description: &ReactorDescription) -> Vec<Choice> {
    let mut choices = vec![
        Choice::Topology(description.topology),
        Choice::Regime(description.regime),
        Choice::Site(description.site),
        Choice::Operation(description.operation),
        Choice::Energy(description.energy),
        Choice::Pressure(description.pressure),
    ];
    if let Some(coolant) = &description.parameters.coolant {
        choices.push(Choice::Coolant(coolant.flow));
    }
    choices.extend(
        description
            .conditions
            .outlets
            .iter()
            .map(|outlet| Choice::Outlet(outlet.variable())),
    );
    choices
}

fn vessel(description: &ReactorDescription) -> Result<Vessel, ConfigurationError> {
    let geometry = &description.geometry;
    let volume = geometry
        .volume
        .map(|v| positive(Field::Volume, v.get::<cubic_meter>()))
        .transpose()?;

    match description.topology {
        Topology::StirredTank => Ok(Vessel::StirredTank {
            volume: volume.unwrap_or(f64::NAN),
        }),
        Topology::PlugFlow => {
            let cross_section = positive(
                Field::CrossSection,
                geometry.cross_section.map_or(f64::NAN, |a| a.get::<square_meter>()),
            )?;
            let length = geometry
                .length
                .map(|l| positive(Field::LengthOrVolume, l.get::<meter>()))
                .transpose()?;

            let length = match (length, volume) {
                (Some(length), Some(volume)) => {
                    let from_length = cross_section * length;
                    if (from_length - volume).abs() > GEOMETRY_TOLERANCE * volume.max(from_length)
                    {
                        return Err(ConfigurationError::ConflictingGeometry {
                            from_length,
                            volume,
                        });
                    }
                    length
                }
                (Some(length), None) => length,
                (None, Some(volume)) => volume / cross_section,
                (None, None) => f64::NAN,
            };
            Ok(Vessel::PlugFlow {
                cross_section,
                length,
            })
        }
    }
}

fn outlet_target(
    condition: &OutletCondition,
    network: &ReactionNetwork,
    inlet_amounts: &[f64],
) -> Result<OutletTarget, ConfigurationError> {
    let (kind, variable, target, bracket) = match condition {
        OutletCondition::Temperature { target, bracket } => (
            OutletVariable::Temperature,
            StateVariable::Temperature,
            target.get::<kelvin>(),
            bracket.map(|t| t.get::<kelvin>()),
        ),
        OutletCondition::Pressure { target, bracket } => (
            OutletVariable::Pressure,
            StateVariable::Pressure,
            target.get::<pascal>(),
            bracket.map(|p| p.get::<pascal>()),
        ),
        OutletCondition::MolarFlow { substance, target } => {
            let i = network
                .substance_index(substance)
                .ok_or_else(|| ConfigurationError::UnknownSubstance {
                    name: substance.clone(),
                })?;
            if !target.is_finite() || *target < 0.0 {
                return Err(ConfigurationError::InvalidAmount {
                    substance: substance.clone(),
                    value: *target,
                });
            }
            let reference: f64 = inlet_amounts.iter().sum();
            return Ok(OutletTarget {
                variable: StateVariable::Amount(i),
                target: *target,
                scale: target.max(reference).max(f64::MIN_POSITIVE),
                bracket: None,
                guess: *target,
            });
        }
    };

    let target = positive(Field::OutletTarget, target)?;
    let [low, high] = bracket;
    if !(low.is_finite() && high.is_finite() && low > 0.0 && low < high) {
        return Err(ConfigurationError::InvalidBracket {
            variable: kind,
            low,
            high,
        });
    }
    Ok(OutletTarget {
        variable,
        target,
        scale: target,
        bracket: Some(bracket),
        guess: 0.5 * (low + high),
    })
}

fn coolant_stream(coolant: Coolant) -> Result<CoolantStream, ConfigurationError> {
    let mass_flow = positive(
        Field::CoolantMassFlow,
        coolant.mass_flow.get::<kilogram_per_second>(),
    )?;
    let specific_heat = positive(
        Field::CoolantSpecificHeat,
        coolant.specific_heat.get::<joule_per_kilogram_kelvin>(),
    )?;
    Ok(CoolantStream {
        heat_capacity_flow: mass_flow * specific_heat,
        flow: coolant.flow,
    })
}

/// Resolves named amounts into a dense vector in network order.
fn resolve_amounts(
    entries: &[(String, f64)],
    network: &ReactionNetwork,
) -> Result<Vec<f64>, ConfigurationError> {
    let mut amounts = vec![0.0; network.substances().len()];
    let mut seen = vec![false; amounts.len()];

    for (name, value) in entries {
        let i = network
            .substance_index(name)
            .ok_or_else(|| ConfigurationError::UnknownSubstance { name: name.clone() })?;
        if seen[i] {
            return Err(ConfigurationError::DuplicateAmount { name: name.clone() });
        }
        if !value.is_finite() || *value < 0.0 {
            return Err(ConfigurationError::InvalidAmount {
                substance: name.clone(),
                value: *value,
            });
        }
        seen[i] = true;
        amounts[i] = *value;
    }

    Ok(amounts)
}

fn positive(field: Field, value: f64) -> Result<f64, ConfigurationError> {
    if value.is_infinite() {
        return Err(ConfigurationError::InvalidParameter {
            field,
            source: ConstraintError::AboveMaximum,
        });
    }
    StrictlyPositive::new(value)
        .map(|v| v.into_inner())
        .map_err(|source| ConfigurationError::InvalidParameter { field, source })
}

fn non_negative(field: Field, value: f64) -> Result<f64, ConfigurationError> {
    if value.is_infinite() {
        return Err(ConfigurationError::InvalidParameter {
            field,
            source: ConstraintError::AboveMaximum,
        });
    }
    NonNegative::new(value)
        .map(|v| v.into_inner())
        .map_err(|source| ConfigurationError::InvalidParameter { field, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        f64::{Area, HeatTransfer, Length, MassRate, Pressure, SpecificHeatCapacity, Volume},
        pressure::bar,
    };

    use crate::models::reactor::core::{
        policy::Ergun,
        test_support::{first_order, inert, pfr, stirred_tank},
    };

    #[test]
    fn plug_flow_defaults() {
        let config = ReactorConfiguration::new(&pfr(), &first_order(0.1)).unwrap();
        assert_eq!(config.topology(), Topology::PlugFlow);
        assert_eq!(config.substance_count(), 2);
        assert_eq!(config.inlet_amounts(), &[1.0, 0.0]);
        assert_eq!(config.inlet_temperature(), Some(300.0));
        assert!(!config.energy().has_temperature_equation());
        assert_relative_eq!(config.residence_time().unwrap(), 5.0);
    }

    #[test]
    fn length_derived_from_volume() {
        let mut description = pfr();
        description.geometry.length = None;
        let description = description.with_volume(Volume::new::<cubic_meter>(3.0));
        let config = ReactorConfiguration::new(&description, &inert()).unwrap();
        assert_eq!(
            config.vessel(),
            Vessel::PlugFlow {
                cross_section: 1.0,
                length: 3.0
            }
        );
    }

    #[test]
    fn conflicting_geometry() {
        let description = pfr().with_volume(Volume::new::<cubic_meter>(2.0));
        let err = ReactorConfiguration::new(&description, &inert()).unwrap_err();
        assert!(matches!(err, ConfigurationError::ConflictingGeometry { .. }));
    }

    #[test]
    fn adiabatic_with_outlet_temperature_is_incompatible() {
        let t = |k| ThermodynamicTemperature::new::<kelvin>(k);
        let mut description = pfr().with_energy(EnergyBalance::Adiabatic).with_outlet(
            OutletCondition::Temperature {
                target: t(350.0),
                bracket: [t(300.0), t(400.0)],
            },
        );
        description.conditions.inlet_temperature = None;

        let err = ReactorConfiguration::new(&description, &first_order(0.1)).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::Incompatible {
                second: Choice::Outlet(OutletVariable::Temperature),
                ..
            }
        ));
    }

    #[test]
    fn inlet_and_outlet_pressure_is_over_specified() {
        let p = |b| Pressure::new::<bar>(b);
        let description = pfr()
            .with_pressure(PressureBalance::NonIsobaric)
            .with_pressure_drop(Ergun::new(0.4, Length::new::<meter>(0.003)).unwrap())
            .with_outlet(OutletCondition::Pressure {
                target: p(0.9),
                bracket: [p(1.0), p(3.0)],
            });

        let err = ReactorConfiguration::new(&description, &inert()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::OverSpecified {
                variable: OutletVariable::Pressure
            }
        );
    }

    #[test]
    fn heat_exchange_is_required() {
        let description = pfr().with_energy(EnergyBalance::NonIsothermic);
        let err = ReactorConfiguration::new(&description, &inert()).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingParameter {
                field: Field::HeatTransferCoefficient,
                ..
            }
        ));
    }

    #[test]
    fn zero_heat_transfer_coefficient_is_allowed() {
        let description = pfr().with_energy(EnergyBalance::NonIsothermic).with_heat_exchange(
            HeatTransfer::new::<watt_per_square_meter_kelvin>(0.0),
            Area::new::<square_meter>(1.0),
            ThermodynamicTemperature::new::<kelvin>(300.0),
        );
        let config = ReactorConfiguration::new(&description, &inert()).unwrap();
        assert!(config.energy().has_temperature_equation());
    }

    #[test]
    fn missing_enthalpy_blocks_adiabatic() {
        use crate::support::kinetics::{Arrhenius, PowerLaw, Reaction};
        use crate::support::thermo::Substance;

        let network = ReactionNetwork::new(
            vec![Substance::new("A"), Substance::new("B")],
            vec![
                Reaction::new("A->B", PowerLaw::new(Arrhenius::constant(1.0)).with_order(0, 1.0))
                    .with_coefficient("A", -1.0)
                    .with_coefficient("B", 1.0),
            ],
        )
        .unwrap();

        let description = pfr().with_energy(EnergyBalance::Adiabatic);
        let err = ReactorConfiguration::new(&description, &network).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingParameter {
                field: Field::ReactionEnthalpies,
                ..
            }
        ));
    }

    #[test]
    fn bad_amounts() {
        let unknown = pfr().with_inlet_amount("Z", 1.0);
        assert_eq!(
            ReactorConfiguration::new(&unknown, &inert()).unwrap_err(),
            ConfigurationError::UnknownSubstance { name: "Z".into() }
        );

        let negative = pfr().with_inlet_amount("B", -1.0);
        assert!(matches!(
            ReactorConfiguration::new(&negative, &inert()).unwrap_err(),
            ConfigurationError::InvalidAmount { .. }
        ));

        let twice = pfr().with_inlet_amount("A", 1.0);
        assert!(matches!(
            ReactorConfiguration::new(&twice, &inert()).unwrap_err(),
            ConfigurationError::DuplicateAmount { .. }
        ));

        let mut empty = pfr();
        empty.conditions.inlet_amounts.clear();
        assert_eq!(
            ReactorConfiguration::new(&empty, &inert()).unwrap_err(),
            ConfigurationError::NoInletMaterial
        );
    }

    #[test]
    fn tank_rejects_zero_volume() {
        let description = stirred_tank().with_volume(Volume::new::<cubic_meter>(0.0));
        assert_eq!(
            ReactorConfiguration::new(&description, &inert()).unwrap_err(),
            ConfigurationError::InvalidParameter {
                field: Field::Volume,
                source: ConstraintError::Zero,
            }
        );
    }

    #[test]
    fn with_inlet_values_clears_outlets() {
        let t = |k| ThermodynamicTemperature::new::<kelvin>(k);
        let description = pfr()
            .with_energy(EnergyBalance::NonIsothermic)
            .with_heat_exchange(
                HeatTransfer::new::<watt_per_square_meter_kelvin>(10.0),
                Area::new::<square_meter>(1.0),
                t(280.0),
            )
            .with_outlet(OutletCondition::Temperature {
                target: t(290.0),
                bracket: [t(280.0), t(400.0)],
            });
        let mut description = description;
        description.conditions.inlet_temperature = None;

        let config = ReactorConfiguration::new(&description, &inert()).unwrap();
        assert_eq!(config.inlet_temperature(), None);
        let outlet = config.outlets()[0];
        assert_eq!(outlet.variable, StateVariable::Temperature);
        assert_eq!(outlet.bracket, Some([280.0, 400.0]));
        assert_relative_eq!(outlet.guess, 340.0);

        let fixed = config.with_inlet_values(&[(StateVariable::Temperature, 320.0)]);
        assert_eq!(fixed.inlet_temperature(), Some(320.0));
        assert!(fixed.outlets().is_empty());
    }

    #[test]
    fn outlet_molar_flows_replace_inlet_flows() {
        let mut description = pfr().with_outlet(OutletCondition::MolarFlow {
            substance: "B".into(),
            target: 0.4,
        });
        let config = ReactorConfiguration::new(&description, &first_order(0.1)).unwrap();
        let outlet = config.outlets()[0];
        assert_eq!(outlet.variable, StateVariable::Amount(1));
        assert_relative_eq!(outlet.scale, 1.0);
        assert_eq!(outlet.bounds(), [0.0, f64::INFINITY]);

        // Both ends of the same flow.
        description = description.with_inlet_amount("B", 0.1);
        assert_eq!(
            ReactorConfiguration::new(&description, &first_order(0.1)).unwrap_err(),
            ConfigurationError::OverSpecified {
                variable: OutletVariable::MolarFlow
            }
        );
    }

    #[test]
    fn outlet_flows_alone_carry_the_feed() {
        let mut description = pfr()
            .with_outlet(OutletCondition::MolarFlow {
                substance: "A".into(),
                target: 0.6,
            })
            .with_outlet(OutletCondition::MolarFlow {
                substance: "B".into(),
                target: 0.4,
            });
        description.conditions.inlet_amounts.clear();

        let config = ReactorConfiguration::new(&description, &first_order(0.1)).unwrap();
        assert_eq!(config.outlets().len(), 2);
        assert_eq!(config.inlet_amounts(), &[0.0, 0.0]);

        let twice = description.with_outlet(OutletCondition::MolarFlow {
            substance: "B".into(),
            target: 0.3,
        });
        assert_eq!(
            ReactorConfiguration::new(&twice, &first_order(0.1)).unwrap_err(),
            ConfigurationError::DuplicateOutlet { name: "B".into() }
        );
    }

    #[test]
    fn counter_current_coolant_becomes_an_outlet_condition() {
        let cooled = |flow| {
            pfr()
                .with_energy(EnergyBalance::NonIsothermic)
                .with_heat_exchange(
                    HeatTransfer::new::<watt_per_square_meter_kelvin>(10.0),
                    Area::new::<square_meter>(1.0),
                    ThermodynamicTemperature::new::<kelvin>(280.0),
                )
                .with_coolant(
                    MassRate::new::<kilogram_per_second>(0.5),
                    SpecificHeatCapacity::new::<joule_per_kilogram_kelvin>(4000.0),
                    flow,
                )
        };

        let co = ReactorConfiguration::new(&cooled(CoolantFlow::CoCurrent), &inert()).unwrap();
        assert_eq!(co.coolant_start(), Some(280.0));
        assert!(co.outlets().is_empty());
        assert!(co.energy().has_coolant_equation());

        let counter =
            ReactorConfiguration::new(&cooled(CoolantFlow::CounterCurrent), &inert()).unwrap();
        assert_eq!(counter.coolant_start(), None);
        let outlet = counter.outlets()[0];
        assert_eq!(outlet.variable, StateVariable::CoolantTemperature);
        assert_relative_eq!(outlet.target, 280.0);

        let tank = stirred_tank().with_coolant(
            MassRate::new::<kilogram_per_second>(0.5),
            SpecificHeatCapacity::new::<joule_per_kilogram_kelvin>(4000.0),
            CoolantFlow::CoCurrent,
        );
        assert!(matches!(
            ReactorConfiguration::new(&tank, &inert()).unwrap_err(),
            ConfigurationError::Incompatible {
                second: Choice::Coolant(CoolantFlow::CoCurrent),
                ..
            }
        ));
    }

    #[test]
    fn shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReactorConfiguration>();
    }
}
