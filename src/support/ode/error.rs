use thiserror::Error;

use super::Trajectory;

/// Errors returned by an [`OdeSolver`](super::OdeSolver).
///
/// Variants raised after integration started carry the trajectory accepted
/// so far.
#[derive(Debug, Error)]
pub enum OdeError<E> {
    #[error("invalid integration span [{start}, {end}]")]
    InvalidSpan { start: f64, end: f64 },

    #[error("initial state has {actual} values, system expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("initial state contains a non-finite value")]
    NonFiniteInitialValue,

    #[error("derivative evaluation failed at x = {x}")]
    System {
        x: f64,
        #[source]
        source: E,
        partial: Trajectory,
    },

    #[error("step size underflow ({step:e}) at x = {x}")]
    StepSizeUnderflow {
        x: f64,
        step: f64,
        partial: Trajectory,
    },

    #[error("step limit of {max_steps} reached at x = {x}")]
    MaxSteps {
        x: f64,
        max_steps: usize,
        partial: Trajectory,
    },

    #[error("integration cancelled at x = {x}")]
    Cancelled { x: f64, partial: Trajectory },
}

impl<E> OdeError<E> {
    /// Returns the trajectory accepted before the failure, if any.
    #[must_use]
    pub fn partial(&self) -> Option<&Trajectory> {
        match self {
            Self::System { partial, .. }
            | Self::StepSizeUnderflow { partial, .. }
            | Self::MaxSteps { partial, .. }
            | Self::Cancelled { partial, .. } => Some(partial),
            Self::InvalidSpan { .. }
            | Self::DimensionMismatch { .. }
            | Self::NonFiniteInitialValue => None,
        }
    }

    /// Splits off the system error, if that is what failed.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when the failure is not a system error.
    pub fn into_system(self) -> Result<(E, f64, Trajectory), Self> {
        match self {
            Self::System {
                x,
                source,
                partial,
            } => Ok((source, x, partial)),
            other => Err(other),
        }
    }
}
