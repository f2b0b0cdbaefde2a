use thiserror::Error;
use twine_solvers::equation::bisection;

use crate::support::thermo::PropertyError;

use super::{ConfigurationError, assemble::StateVariable, profile::ProfileResult};

/// A derivative evaluation produced or met a value outside its domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericalDomainError {
    #[error("reaction '{reaction}' returned rate {value} at x = {position}")]
    Rate {
        reaction: String,
        value: f64,
        position: f64,
    },

    #[error("derivative of {variable} is {value} at x = {position}")]
    Derivative {
        variable: String,
        value: f64,
        position: f64,
    },

    #[error("mixture property evaluation failed at x = {position}")]
    Property {
        position: f64,
        #[source]
        source: PropertyError,
    },

    #[error("the reactor holds no material at x = {position}")]
    EmptyMixture { position: f64 },
}

impl NumericalDomainError {
    #[must_use]
    pub fn position(&self) -> f64 {
        match self {
            Self::Rate { position, .. }
            | Self::Derivative { position, .. }
            | Self::Property { position, .. }
            | Self::EmptyMixture { position } => *position,
        }
    }
}

/// An accepted integration step left the physical domain.
#[derive(Debug, Clone, Error)]
#[error("{variable} reached {value} at x = {position}")]
pub struct PhysicalConstraintError {
    pub variable: String,
    pub value: f64,
    pub position: f64,

    /// Profile up to the last state that satisfied every bound.
    pub partial: Box<ProfileResult>,
}

/// The numerical solve did not produce a complete profile.
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("step size underflow ({step:e}) at x = {position}")]
    StepSizeUnderflow {
        position: f64,
        step: f64,
        partial: Box<ProfileResult>,
    },

    #[error("step limit of {max_steps} reached at x = {position}")]
    StepLimit {
        position: f64,
        max_steps: usize,
        partial: Box<ProfileResult>,
    },

    #[error("integration cancelled at x = {position}")]
    Cancelled {
        position: f64,
        partial: Box<ProfileResult>,
    },

    #[error("integration problem rejected by the solver: {reason}")]
    InvalidProblem { reason: String },

    #[error("no steady state within {horizon} s (scaled residual {residual:e})")]
    SteadyStateNotReached {
        horizon: f64,
        residual: f64,
        partial: Box<ProfileResult>,
    },

    #[error("inlet {variable} search failed at {inlet}")]
    Shooting {
        variable: StateVariable,

        /// Last inlet value tried.
        inlet: f64,

        /// Profile of the last trial that produced one.
        partial: Option<Box<ProfileResult>>,
        #[source]
        source: bisection::Error,
    },

    #[error("inlet search on {variables:?} did not converge after {iters} iterations: residual={residual}")]
    ShootingNotConverged {
        variables: Vec<StateVariable>,

        /// Largest scaled outlet mismatch of the best inlet values tried.
        residual: f64,
        iters: usize,
        inlet: Vec<f64>,
        partial: Option<Box<ProfileResult>>,
    },
}

impl IntegrationError {
    #[must_use]
    pub fn partial(&self) -> Option<&ProfileResult> {
        match self {
            Self::StepSizeUnderflow { partial, .. }
            | Self::StepLimit { partial, .. }
            | Self::Cancelled { partial, .. }
            | Self::SteadyStateNotReached { partial, .. } => Some(partial),
            Self::Shooting { partial, .. } | Self::ShootingNotConverged { partial, .. } => {
                partial.as_deref()
            }
            Self::InvalidProblem { .. } => None,
        }
    }
}

/// Errors returned by a reactor solve.
#[derive(Debug, Error)]
pub enum ReactorError {
    #[error("invalid reactor configuration")]
    Configuration(#[from] ConfigurationError),

    #[error("equation evaluation failed")]
    NumericalDomain {
        #[source]
        source: NumericalDomainError,

        /// Profile accepted before the failing evaluation, when integration
        /// had started.
        partial: Option<Box<ProfileResult>>,
    },

    #[error("physical bound violated")]
    PhysicalConstraint(#[from] PhysicalConstraintError),

    #[error("integration failed")]
    Integration(#[from] IntegrationError),
}

impl ReactorError {
    /// Returns the profile computed before the failure, if any.
    #[must_use]
    pub fn partial(&self) -> Option<&ProfileResult> {
        match self {
            Self::Configuration(_) => None,
            Self::NumericalDomain { partial, .. } => partial.as_deref(),
            Self::PhysicalConstraint(err) => Some(&err.partial),
            Self::Integration(err) => err.partial(),
        }
    }
}

impl From<NumericalDomainError> for ReactorError {
    fn from(source: NumericalDomainError) -> Self {
        Self::NumericalDomain {
            source,
            partial: None,
        }
    }
}
