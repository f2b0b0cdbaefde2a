//! # Twine Reactors
//!
//! Chemical reactor models and equation-assembly tools for
//! [Twine](https://github.com/isentropic-dev/twine).
//!
//! A reactor is described declaratively by picking one balance sub-model per
//! axis (mass, energy, pressure), a topology (plug flow or stirred tank) and
//! a regime (stationary or transient).
//! The description is validated once, assembled into a dense system of
//! ordinary differential equations, and integrated into a profile of
//! mixture states.
//!
//! ## Crate layout
//!
//! - [`models`]: Domain-specific [`twine_core::Model`] implementations.
//! - [`support`]: Collaborators used by models (kinetics, property models,
//!   ODE solvers, numeric constraints).
//!
//! ## Utility code lifecycle
//!
//! Modules in [`support`] are part of the public API because they're useful,
//! but their APIs are not stable. Breaking changes may occur as needed.
//!
//! Utility code starts in a model's internal `core` module and moves to
//! [`support`] once it is useful across models or outside this crate.

pub mod models;
pub mod support;
