//! Reactions, rate laws and reaction networks.
//!
//! A [`ReactionNetwork`] owns an ordered list of [`Substance`](crate::support::thermo::Substance)s
//! and an ordered list of [`Reaction`]s.
//! Each reaction carries signed stoichiometric coefficients keyed by
//! substance name (negative for reactants, positive for products) and a
//! [`RateLaw`] collaborator.
//! On construction the network checks the coefficients against its
//! substances and resolves them into a dense reaction-by-substance matrix.
//!
//! Rate laws receive either concentrations (mol/m³) or partial pressures
//! (Pa), selected per network with [`KineticArgument`].

mod error;
mod network;
mod rate_law;

pub use error::NetworkError;
pub use network::{Reaction, ReactionNetwork};
pub use rate_law::{Arrhenius, KineticArgument, KineticInput, PowerLaw, RateLaw};
