use uom::si::{f64::MolarEnergy, molar_energy::joule_per_mole};

use crate::support::units::GAS_CONSTANT;

/// The composition measure handed to rate laws.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KineticArgument {
    /// Molar concentrations, mol/m³.
    #[default]
    Concentration,

    /// Partial pressures, Pa.
    PartialPressure,
}

/// Local conditions at which a reaction rate is evaluated.
///
/// `composition` is aligned with the network's substances and holds either
/// concentrations or partial pressures, per the network's [`KineticArgument`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KineticInput<'a> {
    pub composition: &'a [f64],

    /// Temperature, K.
    pub temperature: f64,

    /// Pressure, Pa.
    pub pressure: f64,
}

/// A reaction rate expression.
///
/// Returns the rate in mol/(m³·s) for homogeneous reactions or
/// mol/(kg·s) per kilogram of catalyst for heterogeneous ones.
/// Implementations must be deterministic and free of side effects.
///
/// Any `Fn(&[f64], f64) -> f64` closure of composition and temperature is a
/// rate law:
///
/// ```
/// use twine_reactors::support::kinetics::{KineticInput, RateLaw};
///
/// let first_order = |c: &[f64], _t: f64| 0.5 * c[0];
/// let input = KineticInput { composition: &[2.0], temperature: 300.0, pressure: 1e5 };
/// assert_eq!(first_order.rate(&input), 1.0);
/// ```
pub trait RateLaw: Send + Sync {
    fn rate(&self, input: &KineticInput<'_>) -> f64;
}

impl<F> RateLaw for F
where
    F: Fn(&[f64], f64) -> f64 + Send + Sync,
{
    fn rate(&self, input: &KineticInput<'_>) -> f64 {
        self(input.composition, input.temperature)
    }
}

/// Arrhenius rate constant `k = A·exp(−Ea / (R·T))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrhenius {
    pub pre_exponential: f64,
    pub activation_energy: MolarEnergy,
}

impl Arrhenius {
    #[must_use]
    pub fn new(pre_exponential: f64, activation_energy: MolarEnergy) -> Self {
        Self {
            pre_exponential,
            activation_energy,
        }
    }

    /// A temperature-independent rate constant.
    #[must_use]
    pub fn constant(k: f64) -> Self {
        Self::new(k, MolarEnergy::new::<joule_per_mole>(0.0))
    }

    /// Evaluates the rate constant at `temperature` (K).
    #[must_use]
    pub fn at(&self, temperature: f64) -> f64 {
        let ea = self.activation_energy.get::<joule_per_mole>();
        if ea == 0.0 {
            return self.pre_exponential;
        }
        self.pre_exponential * (-ea / (GAS_CONSTANT * temperature)).exp()
    }
}

/// Power-law rate `r = k(T) · Π cᵢ^αᵢ`.
///
/// Orders are keyed by substance index in network order; substances without
/// an order do not appear in the product.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerLaw {
    pub constant: Arrhenius,
    pub orders: Vec<(usize, f64)>,
}

impl PowerLaw {
    #[must_use]
    pub fn new(constant: Arrhenius) -> Self {
        Self {
            constant,
            orders: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_order(mut self, substance: usize, order: f64) -> Self {
        self.orders.push((substance, order));
        self
    }
}

impl RateLaw for PowerLaw {
    fn rate(&self, input: &KineticInput<'_>) -> f64 {
        let k = self.constant.at(input.temperature);
        self.orders.iter().fold(k, |r, &(i, order)| {
            // An out-of-range index yields NaN, which the assembler reports.
            match input.composition.get(i) {
                Some(c) => r * c.max(0.0).powf(order),
                None => f64::NAN,
            }
        })
    }
}
