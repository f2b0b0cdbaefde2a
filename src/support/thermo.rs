//! Substance and mixture property modeling.
//!
//! Reactor balances need a handful of mixture properties: molar volume (to
//! turn amounts into concentrations), heat capacities (energy balances),
//! and viscosity and density (pressure-drop correlations).
//! These are supplied by a [`MixtureModel`] collaborator evaluated on a
//! [`MixtureView`] of the current composition, temperature and pressure.
//!
//! Two simple models are provided in [`model`]: [`model::IdealGas`] and
//! [`model::IdealSolution`].
//! Property correlations beyond constant per-substance values are expected
//! to come from caller-provided [`MixtureModel`] implementations.

mod error;
mod mixture;
mod substance;

pub mod model;

pub use error::PropertyError;
pub use mixture::{MixtureModel, MixtureView};
pub use substance::Substance;
