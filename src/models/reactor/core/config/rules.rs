//! Validation tables.
//!
//! Axis compatibility and parameter requirements are data, not control
//! flow: [`INCOMPATIBLE`] lists forbidden pairs of choices and [`REQUIRED`]
//! lists the parameters each choice needs.
//! Both tables are consulted once, when a configuration is built.

use std::fmt;

use crate::models::reactor::core::{
    description::{CoolantFlow, EnergyBalance, OutletVariable, PressureBalance, Regime, Topology},
    policy::{Operation, ReactionSite},
};

use super::ConfigurationError;

/// One selected option on one axis.
///
/// An outlet condition counts as a choice so that it can be checked against
/// the balances with the same table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Topology(Topology),
    Regime(Regime),
    Site(ReactionSite),
    Operation(Operation),
    Energy(EnergyBalance),
    Pressure(PressureBalance),
    Coolant(CoolantFlow),
    Outlet(OutletVariable),
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Topology(Topology::PlugFlow) => "plug-flow topology",
            Self::Topology(Topology::StirredTank) => "stirred-tank topology",
            Self::Regime(Regime::Stationary) => "stationary regime",
            Self::Regime(Regime::Transient) => "transient regime",
            Self::Site(ReactionSite::Homogeneous) => "homogeneous mass balance",
            Self::Site(ReactionSite::Heterogeneous) => "heterogeneous mass balance",
            Self::Operation(Operation::Continuous) => "continuous operation",
            Self::Operation(Operation::Discontinuous) => "discontinuous operation",
            Self::Energy(EnergyBalance::Isothermic) => "isothermic energy balance",
            Self::Energy(EnergyBalance::NonIsothermic) => "non-isothermic energy balance",
            Self::Energy(EnergyBalance::Adiabatic) => "adiabatic energy balance",
            Self::Pressure(PressureBalance::Isobaric) => "isobaric pressure balance",
            Self::Pressure(PressureBalance::NonIsobaric) => "non-isobaric pressure balance",
            Self::Coolant(CoolantFlow::CoCurrent) => "co-current coolant stream",
            Self::Coolant(CoolantFlow::CounterCurrent) => "counter-current coolant stream",
            Self::Outlet(OutletVariable::Temperature) => "outlet temperature condition",
            Self::Outlet(OutletVariable::Pressure) => "outlet pressure condition",
            Self::Outlet(OutletVariable::MolarFlow) => "outlet molar flow condition",
            Self::Outlet(OutletVariable::CoolantTemperature) => "coolant temperature condition",
        };
        f.write_str(name)
    }
}

/// A parameter some choice may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    CrossSection,
    LengthOrVolume,
    Volume,
    VolumetricFlow,
    EndTime,
    CatalystLoading,
    HeatTransferCoefficient,
    HeatExchangeArea,
    CoolantTemperature,
    CoolantMassFlow,
    CoolantSpecificHeat,
    PressureDrop,
    ReactionEnthalpies,
    InletTemperature,
    InletPressure,
    InitialTemperature,
    OutletTarget,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CrossSection => "cross_section",
            Self::LengthOrVolume => "length or volume",
            Self::Volume => "volume",
            Self::VolumetricFlow => "volumetric_flow",
            Self::EndTime => "end_time",
            Self::CatalystLoading => "catalyst_loading",
            Self::HeatTransferCoefficient => "heat_transfer_coefficient",
            Self::HeatExchangeArea => "heat_exchange_area",
            Self::CoolantTemperature => "coolant_temperature",
            Self::CoolantMassFlow => "coolant mass flow",
            Self::CoolantSpecificHeat => "coolant specific heat",
            Self::PressureDrop => "pressure_drop",
            Self::ReactionEnthalpies => "reaction enthalpies",
            Self::InletTemperature => "inlet_temperature",
            Self::InletPressure => "inlet_pressure",
            Self::InitialTemperature => "initial_temperature",
            Self::OutletTarget => "outlet target",
        };
        f.write_str(name)
    }
}

pub(super) struct Incompatibility {
    pub first: Choice,
    pub second: Choice,
    pub reason: &'static str,
}

pub(super) struct Requirement {
    /// All of these choices must be selected for the row to apply.
    pub when: &'static [Choice],

    /// The row does not apply when this choice is selected.
    pub unless: Option<Choice>,
    pub field: Field,
    pub reason: &'static str,
}

pub(super) const INCOMPATIBLE: &[Incompatibility] = &[
    Incompatibility {
        first: Choice::Topology(Topology::PlugFlow),
        second: Choice::Regime(Regime::Transient),
        reason: "transient plug flow is not supported",
    },
    Incompatibility {
        first: Choice::Topology(Topology::PlugFlow),
        second: Choice::Operation(Operation::Discontinuous),
        reason: "a plug-flow reactor is a continuous flow device",
    },
    Incompatibility {
        first: Choice::Topology(Topology::StirredTank),
        second: Choice::Pressure(PressureBalance::NonIsobaric),
        reason: "a well-mixed tank has no pressure gradient",
    },
    Incompatibility {
        first: Choice::Regime(Regime::Stationary),
        second: Choice::Operation(Operation::Discontinuous),
        reason: "a closed vessel has no steady state",
    },
    Incompatibility {
        first: Choice::Energy(EnergyBalance::Isothermic),
        second: Choice::Outlet(OutletVariable::Temperature),
        reason: "the temperature is fixed at its inlet value",
    },
    Incompatibility {
        first: Choice::Energy(EnergyBalance::Adiabatic),
        second: Choice::Outlet(OutletVariable::Temperature),
        reason: "an adiabatic reactor cannot be driven to an imposed temperature",
    },
    Incompatibility {
        first: Choice::Pressure(PressureBalance::Isobaric),
        second: Choice::Outlet(OutletVariable::Pressure),
        reason: "the pressure is fixed at its inlet value",
    },
    Incompatibility {
        first: Choice::Topology(Topology::StirredTank),
        second: Choice::Outlet(OutletVariable::Temperature),
        reason: "outlet conditions apply to plug flow only",
    },
    Incompatibility {
        first: Choice::Topology(Topology::StirredTank),
        second: Choice::Outlet(OutletVariable::Pressure),
        reason: "outlet conditions apply to plug flow only",
    },
    Incompatibility {
        first: Choice::Topology(Topology::StirredTank),
        second: Choice::Outlet(OutletVariable::MolarFlow),
        reason: "outlet conditions apply to plug flow only",
    },
    Incompatibility {
        first: Choice::Topology(Topology::StirredTank),
        second: Choice::Coolant(CoolantFlow::CoCurrent),
        reason: "a coolant temperature profile needs an axial coordinate",
    },
    Incompatibility {
        first: Choice::Topology(Topology::StirredTank),
        second: Choice::Coolant(CoolantFlow::CounterCurrent),
        reason: "a coolant temperature profile needs an axial coordinate",
    },
    Incompatibility {
        first: Choice::Energy(EnergyBalance::Isothermic),
        second: Choice::Coolant(CoolantFlow::CoCurrent),
        reason: "a coolant stream exchanges heat through the wall",
    },
    Incompatibility {
        first: Choice::Energy(EnergyBalance::Isothermic),
        second: Choice::Coolant(CoolantFlow::CounterCurrent),
        reason: "a coolant stream exchanges heat through the wall",
    },
    Incompatibility {
        first: Choice::Energy(EnergyBalance::Adiabatic),
        second: Choice::Coolant(CoolantFlow::CoCurrent),
        reason: "a coolant stream exchanges heat through the wall",
    },
    Incompatibility {
        first: Choice::Energy(EnergyBalance::Adiabatic),
        second: Choice::Coolant(CoolantFlow::CounterCurrent),
        reason: "a coolant stream exchanges heat through the wall",
    },
];

pub(super) const REQUIRED: &[Requirement] = &[
    Requirement {
        when: &[Choice::Topology(Topology::PlugFlow)],
        unless: None,
        field: Field::CrossSection,
        reason: "plug-flow reactors",
    },
    Requirement {
        when: &[Choice::Topology(Topology::PlugFlow)],
        unless: None,
        field: Field::LengthOrVolume,
        reason: "plug-flow reactors",
    },
    Requirement {
        when: &[Choice::Topology(Topology::StirredTank)],
        unless: None,
        field: Field::Volume,
        reason: "stirred tanks",
    },
    Requirement {
        when: &[
            Choice::Topology(Topology::StirredTank),
            Choice::Operation(Operation::Continuous),
        ],
        unless: None,
        field: Field::VolumetricFlow,
        reason: "continuous stirred tanks",
    },
    Requirement {
        when: &[Choice::Regime(Regime::Transient)],
        unless: None,
        field: Field::EndTime,
        reason: "transient operation",
    },
    Requirement {
        when: &[Choice::Site(ReactionSite::Heterogeneous)],
        unless: None,
        field: Field::CatalystLoading,
        reason: "heterogeneous reactions",
    },
    Requirement {
        when: &[Choice::Energy(EnergyBalance::NonIsothermic)],
        unless: None,
        field: Field::HeatTransferCoefficient,
        reason: "non-isothermic operation",
    },
    Requirement {
        when: &[Choice::Energy(EnergyBalance::NonIsothermic)],
        unless: None,
        field: Field::HeatExchangeArea,
        reason: "non-isothermic operation",
    },
    Requirement {
        when: &[Choice::Energy(EnergyBalance::NonIsothermic)],
        unless: None,
        field: Field::CoolantTemperature,
        reason: "non-isothermic operation",
    },
    Requirement {
        when: &[Choice::Energy(EnergyBalance::NonIsothermic)],
        unless: None,
        field: Field::ReactionEnthalpies,
        reason: "non-isothermic operation",
    },
    Requirement {
        when: &[Choice::Energy(EnergyBalance::Adiabatic)],
        unless: None,
        field: Field::ReactionEnthalpies,
        reason: "adiabatic operation",
    },
    Requirement {
        when: &[Choice::Pressure(PressureBalance::NonIsobaric)],
        unless: None,
        field: Field::PressureDrop,
        reason: "non-isobaric operation",
    },
    Requirement {
        when: &[],
        unless: Some(Choice::Outlet(OutletVariable::Temperature)),
        field: Field::InletTemperature,
        reason: "a reactor without an outlet temperature condition",
    },
    Requirement {
        when: &[],
        unless: Some(Choice::Outlet(OutletVariable::Pressure)),
        field: Field::InletPressure,
        reason: "a reactor without an outlet pressure condition",
    },
];

/// Fails on the first forbidden pair among `choices`.
pub(super) fn check_compatibility(choices: &[Choice]) -> Result<(), ConfigurationError> {
    for rule in INCOMPATIBLE {
        if choices.contains(&rule.first) && choices.contains(&rule.second) {
            return Err(ConfigurationError::Incompatible {
                first: rule.first,
                second: rule.second,
                reason: rule.reason,
            });
        }
    }
    Ok(())
}

/// Fails on the first required field for which `provided` returns `false`.
pub(super) fn check_requirements(
    choices: &[Choice],
    provided: impl Fn(Field) -> bool,
) -> Result<(), ConfigurationError> {
    for rule in REQUIRED {
        let applies = rule.when.iter().all(|c| choices.contains(c))
            && rule.unless.is_none_or(|c| !choices.contains(&c));
        if applies && !provided(rule.field) {
            return Err(ConfigurationError::MissingParameter {
                field: rule.field,
                required_by: rule.reason,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pair_listed_twice() {
        for (i, a) in INCOMPATIBLE.iter().enumerate() {
            for b in &INCOMPATIBLE[i + 1..] {
                let same = (a.first == b.first && a.second == b.second)
                    || (a.first == b.second && a.second == b.first);
                assert!(!same, "{} / {} listed twice", a.first, a.second);
            }
        }
    }

    #[test]
    fn pfr_transient_is_rejected() {
        let choices = [
            Choice::Topology(Topology::PlugFlow),
            Choice::Regime(Regime::Transient),
        ];
        let err = check_compatibility(&choices).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::Incompatible {
                first: Choice::Topology(Topology::PlugFlow),
                second: Choice::Regime(Regime::Transient),
                ..
            }
        ));
    }

    #[test]
    fn heterogeneous_batch_is_allowed() {
        let choices = [
            Choice::Topology(Topology::StirredTank),
            Choice::Regime(Regime::Transient),
            Choice::Site(ReactionSite::Heterogeneous),
            Choice::Operation(Operation::Discontinuous),
            Choice::Energy(EnergyBalance::Adiabatic),
            Choice::Pressure(PressureBalance::Isobaric),
        ];
        assert!(check_compatibility(&choices).is_ok());
    }

    #[test]
    fn outlet_condition_lifts_inlet_requirement() {
        let choices = [
            Choice::Topology(Topology::PlugFlow),
            Choice::Outlet(OutletVariable::Pressure),
        ];
        let provided = |field| field != Field::InletPressure;
        assert!(check_requirements(&choices, provided).is_ok());

        let choices = [Choice::Topology(Topology::PlugFlow)];
        let err = check_requirements(&choices, provided).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingParameter {
                field: Field::InletPressure,
                ..
            }
        ));
    }

    #[test]
    fn coolant_stream_needs_a_plug_flow_exchanger() {
        let tank = [
            Choice::Topology(Topology::StirredTank),
            Choice::Energy(EnergyBalance::NonIsothermic),
            Choice::Coolant(CoolantFlow::CoCurrent),
        ];
        assert!(matches!(
            check_compatibility(&tank).unwrap_err(),
            ConfigurationError::Incompatible {
                second: Choice::Coolant(CoolantFlow::CoCurrent),
                ..
            }
        ));

        let adiabatic = [
            Choice::Topology(Topology::PlugFlow),
            Choice::Energy(EnergyBalance::Adiabatic),
            Choice::Coolant(CoolantFlow::CounterCurrent),
        ];
        assert!(check_compatibility(&adiabatic).is_err());

        let exchanger = [
            Choice::Topology(Topology::PlugFlow),
            Choice::Energy(EnergyBalance::NonIsothermic),
            Choice::Coolant(CoolantFlow::CounterCurrent),
        ];
        assert!(check_compatibility(&exchanger).is_ok());
    }

    #[test]
    fn continuous_tank_needs_flow() {
        let choices = [
            Choice::Topology(Topology::StirredTank),
            Choice::Operation(Operation::Continuous),
        ];
        let err = check_requirements(&choices, |field| field != Field::VolumetricFlow).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing parameter volumetric_flow, required by continuous stirred tanks"
        );
    }
}
