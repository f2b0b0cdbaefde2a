use thiserror::Error;

/// Errors that may occur when evaluating mixture properties.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    /// The property is undefined for the given mixture.
    ///
    /// For example, a heat capacity requested from a model whose substances
    /// carry no heat capacity data.
    #[error("undefined property: {context}")]
    Undefined { context: String },

    /// The input state is outside the model's valid domain.
    ///
    /// For example, an ideal gas molar volume at zero pressure.
    #[error("out of domain: {context}")]
    OutOfDomain { context: String },

    /// The calculation failed due to a numerical or internal error.
    #[error("calculation error: {context}")]
    Calculation { context: String },
}

impl PropertyError {
    /// Creates an [`PropertyError::Undefined`] naming the missing substance datum.
    pub(crate) fn missing(property: &str, substance: &str) -> Self {
        Self::Undefined {
            context: format!("{property} of substance '{substance}' is not set"),
        }
    }
}
