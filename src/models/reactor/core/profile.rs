//! Solved reactor profiles and derived quantities.

use std::sync::OnceLock;

use nalgebra::DMatrix;
use thiserror::Error;
use uom::si::f64::{Pressure, ThermodynamicTemperature};

use crate::support::constraint::{Constrained, UnitInterval};

/// Values this close outside `[0, 1]` are snapped onto the interval.
const UNIT_INTERVAL_TOLERANCE: f64 = 1e-9;

/// The reactor contents at one point of the independent axis.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureState {
    /// Axial position (m), time (s) or residence time (s).
    pub position: f64,

    /// Amounts in network substance order; see [`AmountBasis`].
    pub amounts: Vec<f64>,
    pub temperature: ThermodynamicTemperature,
    pub pressure: Pressure,

    /// Coolant temperature next to the mixture, when a coolant stream is
    /// balanced alongside the reactor.
    pub coolant_temperature: Option<ThermodynamicTemperature>,
}

/// Independent variable of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Distance from the inlet of a plug-flow reactor, m.
    Length,

    /// Time since start-up, s.
    Time,

    /// Space time `V/Q` of a stationary stirred tank, s.
    ResidenceTime,
}

/// Meaning of [`MixtureState::amounts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountBasis {
    /// Molar flows, mol/s.
    MolarFlow,

    /// Moles held in a closed vessel, mol.
    Moles,
}

/// Errors raised when a derived quantity cannot be computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UndefinedQuantityError {
    #[error("unknown substance '{name}'")]
    UnknownSubstance { name: String },

    #[error("'{name}' is not consumed by any reaction")]
    NotAReactant { name: String },

    #[error("'{name}' is not produced by any reaction")]
    NotAProduct { name: String },

    #[error("'{name}' has no reference amount")]
    NoReferenceAmount { name: String },

    #[error("no '{name}' was consumed")]
    NothingConsumed { name: String },

    #[error("no substance with a reference amount is consumed by the network")]
    NoReactant,

    #[error("{quantity} {value} lies outside [0, 1]")]
    OutOfRange { quantity: &'static str, value: f64 },
}

/// Profiles produced by one reactor solve.
///
/// States are ordered along the [`Axis`] and never empty.
/// The reference state is the inlet of a flow reactor, the feed of a stirred
/// tank, or the initial charge of a closed vessel; conversion and
/// selectivity compare the last state against it.
#[derive(Debug, Clone)]
pub struct ProfileResult {
    states: Vec<MixtureState>,
    reference: MixtureState,
    axis: Axis,
    basis: AmountBasis,
    substances: Vec<String>,
    stoichiometry: DMatrix<f64>,

    /// `outlet − reference` per substance.
    changes: OnceLock<Vec<f64>>,
    limiting: OnceLock<Option<usize>>,
}

impl ProfileResult {
    /// Builds a profile; an empty `states` list is replaced by the reference.
    pub(crate) fn new(
        reference: MixtureState,
        mut states: Vec<MixtureState>,
        axis: Axis,
        basis: AmountBasis,
        substances: Vec<String>,
        stoichiometry: DMatrix<f64>,
    ) -> Self {
        if states.is_empty() {
            states.push(reference.clone());
        }
        Self {
            states,
            reference,
            axis,
            basis,
            substances,
            stoichiometry,
            changes: OnceLock::new(),
            limiting: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn states(&self) -> &[MixtureState] {
        &self.states
    }

    #[must_use]
    pub fn reference(&self) -> &MixtureState {
        &self.reference
    }

    /// Alias for [`ProfileResult::reference`].
    #[must_use]
    pub fn inlet(&self) -> &MixtureState {
        &self.reference
    }

    /// The last state: reactor outlet, final time, or steady state.
    #[must_use]
    pub fn outlet(&self) -> &MixtureState {
        self.states.last().unwrap_or(&self.reference)
    }

    #[must_use]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    #[must_use]
    pub fn basis(&self) -> AmountBasis {
        self.basis
    }

    #[must_use]
    pub fn substances(&self) -> &[String] {
        &self.substances
    }

    #[must_use]
    pub fn positions(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.position).collect()
    }

    #[must_use]
    pub fn temperatures(&self) -> Vec<ThermodynamicTemperature> {
        self.states.iter().map(|s| s.temperature).collect()
    }

    #[must_use]
    pub fn pressures(&self) -> Vec<Pressure> {
        self.states.iter().map(|s| s.pressure).collect()
    }

    /// Coolant temperatures along the reactor, if a coolant stream was
    /// balanced.
    #[must_use]
    pub fn coolant_temperatures(&self) -> Option<Vec<ThermodynamicTemperature>> {
        self.states.iter().map(|s| s.coolant_temperature).collect()
    }

    /// Returns the amount of one substance at every state.
    ///
    /// # Errors
    ///
    /// Returns [`UndefinedQuantityError::UnknownSubstance`] if `name` is not
    /// in the network.
    pub fn profile(&self, name: &str) -> Result<Vec<f64>, UndefinedQuantityError> {
        let i = self.index(name)?;
        Ok(self.states.iter().map(|s| s.amounts[i]).collect())
    }

    /// Fraction of `reactant` consumed between the reference and the outlet.
    ///
    /// A substance no reaction touches keeps its reference amount and has a
    /// conversion of zero.
    ///
    /// # Errors
    ///
    /// Returns [`UndefinedQuantityError`] if the substance is unknown, has no
    /// reference amount, or the result falls outside `[0, 1]` (a fed
    /// substance that is net produced).
    pub fn conversion(
        &self,
        reactant: &str,
    ) -> Result<Constrained<f64, UnitInterval>, UndefinedQuantityError> {
        let i = self.index(reactant)?;
        let reference = self.reference.amounts[i];
        if reference <= 0.0 {
            return Err(UndefinedQuantityError::NoReferenceAmount {
                name: reactant.to_owned(),
            });
        }
        unit_interval("conversion", -self.changes()[i] / reference)
    }

    /// Net amount of `product` formed per amount of `reactant` consumed,
    /// between the reference and the outlet.
    ///
    /// Scaled by `|ν_reactant| / ν_product`, taking each coefficient from
    /// the first reaction that consumes the reactant or produces the
    /// product. The two need not share a reaction: in `A → B → C` the
    /// selectivity of `C` from `A` counts `C` formed through `B`.
    ///
    /// # Errors
    ///
    /// Returns [`UndefinedQuantityError`] if a substance is unknown, the
    /// reactant is never consumed or the product never produced by the
    /// network, nothing was consumed, or the result falls outside `[0, 1]`.
    pub fn selectivity(
        &self,
        product: &str,
        reactant: &str,
    ) -> Result<Constrained<f64, UnitInterval>, UndefinedQuantityError> {
        let p = self.index(product)?;
        let r = self.index(reactant)?;
        let consuming = self.first_consuming(r).ok_or_else(|| {
            UndefinedQuantityError::NotAReactant {
                name: reactant.to_owned(),
            }
        })?;
        let producing = self.first_producing(p).ok_or_else(|| {
            UndefinedQuantityError::NotAProduct {
                name: product.to_owned(),
            }
        })?;

        let changes = self.changes();
        let consumed = -changes[r];
        if consumed <= 0.0 {
            return Err(UndefinedQuantityError::NothingConsumed {
                name: reactant.to_owned(),
            });
        }

        let scale = -self.stoichiometry[(consuming, r)] / self.stoichiometry[(producing, p)];
        unit_interval("selectivity", changes[p] / consumed * scale)
    }

    /// The reactant that would run out first if reactions went to completion.
    ///
    /// Compares `reference / |ν|` over substances with a positive reference
    /// amount, using the coefficient of the first reaction consuming each.
    ///
    /// # Errors
    ///
    /// Returns [`UndefinedQuantityError::NoReactant`] if no such substance exists.
    pub fn limiting_reactant(&self) -> Result<&str, UndefinedQuantityError> {
        let limiting = self.limiting.get_or_init(|| {
            (0..self.substances.len())
                .filter(|&i| self.reference.amounts[i] > 0.0)
                .filter_map(|i| {
                    let j = self.first_consuming(i)?;
                    Some((i, self.reference.amounts[i] / -self.stoichiometry[(j, i)]))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i)
        });

        limiting
            .map(|i| self.substances[i].as_str())
            .ok_or(UndefinedQuantityError::NoReactant)
    }

    fn index(&self, name: &str) -> Result<usize, UndefinedQuantityError> {
        self.substances
            .iter()
            .position(|s| s == name)
            .ok_or_else(|| UndefinedQuantityError::UnknownSubstance {
                name: name.to_owned(),
            })
    }

    fn first_consuming(&self, i: usize) -> Option<usize> {
        (0..self.stoichiometry.nrows()).find(|&j| self.stoichiometry[(j, i)] < 0.0)
    }

    fn first_producing(&self, i: usize) -> Option<usize> {
        (0..self.stoichiometry.nrows()).find(|&j| self.stoichiometry[(j, i)] > 0.0)
    }

    fn changes(&self) -> &[f64] {
        self.changes.get_or_init(|| {
            self.outlet()
                .amounts
                .iter()
                .zip(&self.reference.amounts)
                .map(|(out, reference)| out - reference)
                .collect()
        })
    }
}

fn unit_interval(
    quantity: &'static str,
    value: f64,
) -> Result<Constrained<f64, UnitInterval>, UndefinedQuantityError> {
    UnitInterval::snap(value, UNIT_INTERVAL_TOLERANCE)
        .map_err(|_| UndefinedQuantityError::OutOfRange { quantity, value })
}
