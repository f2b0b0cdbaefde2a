//! Reactor model composition, equation assembly and integration.
//!
//! A reactor solve moves through three stages:
//!
//! 1. [`ReactorConfiguration::new`] validates a [`ReactorDescription`]
//!    against the compatibility and requirement tables and resolves it into
//!    one balance policy per axis.
//! 2. [`assemble`] selects the active state variables and binds the policies,
//!    the reaction network and the property model into an [`AssembledSystem`].
//! 3. [`IntegrationDriver`] integrates the system over the reactor domain
//!    and returns a [`ProfileResult`].

mod assemble;
mod config;
mod description;
mod error;
mod integrate;
mod policy;
mod profile;

#[cfg(test)]
pub(crate) mod test_support;

pub use assemble::{AssembledSystem, StateVariable, assemble};
pub use config::{Choice, ConfigurationError, Field, OutletTarget, ReactorConfiguration};
pub use description::{
    BoundaryConditions, Coolant, CoolantFlow, EnergyBalance, Geometry, OperatingParameters,
    OutletCondition, OutletVariable, PressureBalance, ReactorDescription, Regime, Topology,
};
pub use error::{
    IntegrationError, NumericalDomainError, PhysicalConstraintError, ReactorError,
};
pub use integrate::{
    DriverState, IntegrationDriver, IntegrationSettings, ShootingConfig, SteadyStateConfig,
};
pub use policy::{
    CoolantStream, EnergyPolicy, Ergun, FlowContext, HeatExchange, MassPolicy, Operation,
    PressureDrop, PressurePolicy, ReactionSite, Vessel,
};
pub use profile::{AmountBasis, Axis, MixtureState, ProfileResult, UndefinedQuantityError};
