//! Supporting utilities used by models.
//!
//! - [`constraint`]: Type-level numeric constraints.
//! - [`kinetics`]: Reaction networks and rate-law collaborators.
//! - [`ode`]: Initial value problem solvers.
//! - [`thermo`]: Substances and mixture property models.
//! - [`units`]: Physical constants and [`uom`] helpers.

pub mod constraint;
pub mod kinetics;
pub mod ode;
pub mod thermo;
pub mod units;
