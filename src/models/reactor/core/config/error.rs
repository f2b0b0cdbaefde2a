use thiserror::Error;

use crate::{
    models::reactor::core::description::OutletVariable, support::constraint::ConstraintError,
};

use super::rules::{Choice, Field};

/// Errors raised while validating a [`ReactorDescription`](crate::models::reactor::ReactorDescription).
///
/// Every variant is detected before any equation is assembled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{first} cannot be combined with {second}: {reason}")]
    Incompatible {
        first: Choice,
        second: Choice,
        reason: &'static str,
    },

    #[error("missing parameter {field}, required by {required_by}")]
    MissingParameter {
        field: Field,
        required_by: &'static str,
    },

    #[error("invalid parameter {field}")]
    InvalidParameter {
        field: Field,
        #[source]
        source: ConstraintError,
    },

    #[error("cross-section times length ({from_length} m3) does not match the volume ({volume} m3)")]
    ConflictingGeometry { from_length: f64, volume: f64 },

    #[error("{variable} is given at both the inlet and the outlet")]
    OverSpecified { variable: OutletVariable },

    #[error("more than one outlet condition on {name}")]
    DuplicateOutlet { name: String },

    #[error("outlet {variable} bracket [{low}, {high}] is empty or not finite")]
    InvalidBracket {
        variable: OutletVariable,
        low: f64,
        high: f64,
    },

    #[error("unknown substance '{name}'")]
    UnknownSubstance { name: String },

    #[error("substance '{name}' is listed more than once")]
    DuplicateAmount { name: String },

    #[error("amount of '{substance}' must be finite and non-negative, got {value}")]
    InvalidAmount { substance: String, value: f64 },

    #[error("the inlet carries no material")]
    NoInletMaterial,

    #[error("the initial holdup is empty")]
    EmptyHoldup,

    #[error("configuration has {expected} substances, the network {actual}")]
    NetworkMismatch { expected: usize, actual: usize },
}
