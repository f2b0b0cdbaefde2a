//! Physical constants and extensions to [`uom`].
//!
//! This crate uses [`uom`] for physical quantities at its public boundaries
//! (geometry, operating conditions, property model outputs).
//! Dense state vectors handed to ODE solvers hold plain SI `f64` values;
//! the constants here are expressed in the same SI base units.

use uom::si::{f64::ThermodynamicTemperature, thermodynamic_temperature::kelvin};

/// Molar gas constant, J/(mol·K).
pub const GAS_CONSTANT: f64 = 8.314_462_618_153_24;

/// Reference temperature for standard formation and reaction enthalpies, K.
pub const STANDARD_TEMPERATURE_K: f64 = 298.15;

/// Returns the standard reference temperature (298.15 K).
#[must_use]
pub fn standard_temperature() -> ThermodynamicTemperature {
    ThermodynamicTemperature::new::<kelvin>(STANDARD_TEMPERATURE_K)
}
