use thiserror::Error;

/// Errors raised while building a [`ReactionNetwork`](super::ReactionNetwork).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("a reaction network needs at least one substance")]
    NoSubstances,

    #[error("substance '{name}' is listed more than once")]
    DuplicateSubstance { name: String },

    #[error("reaction '{reaction}' references unknown substance '{substance}'")]
    UnknownSubstance { reaction: String, substance: String },

    #[error("reaction '{reaction}' has a non-finite coefficient for '{substance}'")]
    NonFiniteCoefficient { reaction: String, substance: String },

    #[error("reaction '{reaction}' has no reactant")]
    NoReactant { reaction: String },

    #[error("reaction '{reaction}' has no product")]
    NoProduct { reaction: String },
}
