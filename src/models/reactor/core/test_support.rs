//! Shared fixtures for reactor tests.
//!
//! Two liquid substances `A` and `B` with round-number data, the reaction
//! `A → B` with first-order kinetics, and baseline descriptions whose
//! space time `V/Q` is 5 s.

use uom::si::{
    area::square_meter,
    dynamic_viscosity::pascal_second,
    f64::{
        Area, DynamicViscosity, Length, MolarEnergy, MolarHeatCapacity, MolarMass, MolarVolume,
        Pressure, ThermodynamicTemperature, Time, Volume, VolumeRate,
    },
    length::meter,
    molar_energy::joule_per_mole,
    molar_heat_capacity::joule_per_kelvin_mole,
    molar_mass::kilogram_per_mole,
    molar_volume::cubic_meter_per_mole,
    pressure::bar,
    thermodynamic_temperature::kelvin,
    time::second,
    volume::cubic_meter,
    volume_rate::cubic_meter_per_second,
};

use crate::support::{
    kinetics::{Arrhenius, PowerLaw, Reaction, ReactionNetwork},
    thermo::Substance,
};

use super::{
    description::{ReactorDescription, Regime, Topology},
    policy::Operation,
};

fn liquid(name: &str, hf: f64) -> Substance {
    Substance::new(name)
        .with_molar_mass(MolarMass::new::<kilogram_per_mole>(0.05))
        .with_formation_enthalpy(MolarEnergy::new::<joule_per_mole>(hf))
        .with_heat_capacity(MolarHeatCapacity::new::<joule_per_kelvin_mole>(100.0))
        .with_liquid_molar_volume(MolarVolume::new::<cubic_meter_per_mole>(5.0e-5))
        .with_viscosity(DynamicViscosity::new::<pascal_second>(1.0e-3))
}

pub(crate) fn substances() -> Vec<Substance> {
    vec![liquid("A", 0.0), liquid("B", -20_000.0)]
}

/// `A → B → C`, both steps first order with the same `k`.
pub(crate) fn series(k: f64) -> ReactionNetwork {
    let step = |name: &str, from: usize, reactant: &str, product: &str| {
        Reaction::new(name, PowerLaw::new(Arrhenius::constant(k)).with_order(from, 1.0))
            .with_coefficient(reactant, -1.0)
            .with_coefficient(product, 1.0)
    };
    ReactionNetwork::new(
        vec![liquid("A", 0.0), liquid("B", -20_000.0), liquid("C", -50_000.0)],
        vec![step("A->B", 0, "A", "B"), step("B->C", 1, "B", "C")],
    )
    .expect("fixture network is valid")
}

/// `A → B` with `r = k·c_A`.
pub(crate) fn first_order(k: f64) -> ReactionNetwork {
    first_order_reaction(Reaction::new(
        "A->B",
        PowerLaw::new(Arrhenius::constant(k)).with_order(0, 1.0),
    ))
}

/// `A → B` with `r = k·c_A` and a fixed reaction enthalpy, J/mol.
pub(crate) fn first_order_with_enthalpy(k: f64, enthalpy: f64) -> ReactionNetwork {
    first_order_reaction(
        Reaction::new(
            "A->B",
            PowerLaw::new(Arrhenius::constant(k)).with_order(0, 1.0),
        )
        .with_enthalpy(MolarEnergy::new::<joule_per_mole>(enthalpy)),
    )
}

fn first_order_reaction(reaction: Reaction) -> ReactionNetwork {
    ReactionNetwork::new(
        substances(),
        vec![reaction.with_coefficient("A", -1.0).with_coefficient("B", 1.0)],
    )
    .expect("fixture network is valid")
}

/// `A` and `B` with no reactions.
pub(crate) fn inert() -> ReactionNetwork {
    ReactionNetwork::new(substances(), Vec::new()).expect("fixture network is valid")
}

fn feed(description: ReactorDescription) -> ReactorDescription {
    description
        .with_inlet_amount("A", 1.0)
        .with_inlet_temperature(ThermodynamicTemperature::new::<kelvin>(300.0))
        .with_inlet_pressure(Pressure::new::<bar>(1.0))
}

/// Stationary plug flow: 1 m long, 1 m² cross-section, 0.2 m³/s, 1 mol/s of `A`.
pub(crate) fn pfr() -> ReactorDescription {
    feed(
        ReactorDescription::new(Topology::PlugFlow, Regime::Stationary)
            .with_length(Length::new::<meter>(1.0))
            .with_cross_section(Area::new::<square_meter>(1.0))
            .with_volumetric_flow(VolumeRate::new::<cubic_meter_per_second>(0.2)),
    )
}

/// Stationary continuous stirred tank: 1 m³, 0.2 m³/s, 1 mol/s of `A`.
pub(crate) fn stirred_tank() -> ReactorDescription {
    feed(
        ReactorDescription::new(Topology::StirredTank, Regime::Stationary)
            .with_volume(Volume::new::<cubic_meter>(1.0))
            .with_volumetric_flow(VolumeRate::new::<cubic_meter_per_second>(0.2)),
    )
}

/// Closed 1 m³ tank charged with 1 mol of `A`, run for 10 s.
pub(crate) fn batch() -> ReactorDescription {
    feed(
        ReactorDescription::new(Topology::StirredTank, Regime::Transient)
            .with_operation(Operation::Discontinuous)
            .with_volume(Volume::new::<cubic_meter>(1.0))
            .with_end_time(Time::new::<second>(10.0)),
    )
}
