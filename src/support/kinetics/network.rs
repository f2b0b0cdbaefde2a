use std::{collections::HashSet, fmt, sync::Arc};

use nalgebra::DMatrix;
use uom::si::{f64::MolarEnergy, molar_energy::joule_per_mole};

use crate::support::{
    thermo::{MixtureModel, MixtureView, PropertyError, Substance},
    units::standard_temperature,
};

use super::{KineticArgument, KineticInput, NetworkError, RateLaw};

/// A single reaction: stoichiometry, rate law and optional reaction enthalpy.
#[derive(Clone)]
pub struct Reaction {
    pub name: String,
    stoichiometry: Vec<(String, f64)>,
    rate_law: Arc<dyn RateLaw>,
    enthalpy: Option<MolarEnergy>,
}

impl Reaction {
    pub fn new(name: impl Into<String>, rate_law: impl RateLaw + 'static) -> Self {
        Self {
            name: name.into(),
            stoichiometry: Vec::new(),
            rate_law: Arc::new(rate_law),
            enthalpy: None,
        }
    }

    /// Adds a signed stoichiometric coefficient (negative for reactants).
    #[must_use]
    pub fn with_coefficient(mut self, substance: impl Into<String>, coefficient: f64) -> Self {
        self.stoichiometry.push((substance.into(), coefficient));
        self
    }

    /// Sets a constant reaction enthalpy, overriding formation enthalpies.
    #[must_use]
    pub fn with_enthalpy(mut self, enthalpy: MolarEnergy) -> Self {
        self.enthalpy = Some(enthalpy);
        self
    }

    #[must_use]
    pub fn stoichiometry(&self) -> &[(String, f64)] {
        &self.stoichiometry
    }

    #[must_use]
    pub fn enthalpy(&self) -> Option<MolarEnergy> {
        self.enthalpy
    }

    #[must_use]
    pub fn rate(&self, input: &KineticInput<'_>) -> f64 {
        self.rate_law.rate(input)
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("name", &self.name)
            .field("stoichiometry", &self.stoichiometry)
            .field("enthalpy", &self.enthalpy)
            .finish_non_exhaustive()
    }
}

/// Substances and reactions, with a resolved stoichiometric matrix.
///
/// The matrix has one row per reaction and one column per substance, both
/// in insertion order.
/// Coefficients listed more than once for the same substance are summed.
#[derive(Debug, Clone)]
pub struct ReactionNetwork {
    substances: Vec<Substance>,
    reactions: Vec<Reaction>,
    stoichiometry: DMatrix<f64>,
    kinetic_argument: KineticArgument,
}

impl ReactionNetwork {
    /// Validates and builds a network.
    ///
    /// An empty reaction list is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] if there are no substances, a substance name
    /// repeats, a coefficient names an unknown substance or is not finite,
    /// or a reaction lacks a reactant or a product.
    pub fn new(substances: Vec<Substance>, reactions: Vec<Reaction>) -> Result<Self, NetworkError> {
        if substances.is_empty() {
            return Err(NetworkError::NoSubstances);
        }

        let mut seen = HashSet::new();
        for s in &substances {
            if !seen.insert(s.name.as_str()) {
                return Err(NetworkError::DuplicateSubstance {
                    name: s.name.clone(),
                });
            }
        }

        let mut stoichiometry = DMatrix::zeros(reactions.len(), substances.len());
        for (j, reaction) in reactions.iter().enumerate() {
            for (name, nu) in &reaction.stoichiometry {
                let i = substances
                    .iter()
                    .position(|s| &s.name == name)
                    .ok_or_else(|| NetworkError::UnknownSubstance {
                        reaction: reaction.name.clone(),
                        substance: name.clone(),
                    })?;
                if !nu.is_finite() {
                    return Err(NetworkError::NonFiniteCoefficient {
                        reaction: reaction.name.clone(),
                        substance: name.clone(),
                    });
                }
                stoichiometry[(j, i)] += nu;
            }

            let row = stoichiometry.row(j);
            if !row.iter().any(|&nu| nu < 0.0) {
                return Err(NetworkError::NoReactant {
                    reaction: reaction.name.clone(),
                });
            }
            if !row.iter().any(|&nu| nu > 0.0) {
                return Err(NetworkError::NoProduct {
                    reaction: reaction.name.clone(),
                });
            }
        }

        Ok(Self {
            substances,
            reactions,
            stoichiometry,
            kinetic_argument: KineticArgument::default(),
        })
    }

    #[must_use]
    pub fn with_kinetic_argument(mut self, argument: KineticArgument) -> Self {
        self.kinetic_argument = argument;
        self
    }

    #[must_use]
    pub fn kinetic_argument(&self) -> KineticArgument {
        self.kinetic_argument
    }

    #[must_use]
    pub fn substances(&self) -> &[Substance] {
        &self.substances
    }

    #[must_use]
    pub fn substance_names(&self) -> Vec<String> {
        self.substances.iter().map(|s| s.name.clone()).collect()
    }

    #[must_use]
    pub fn substance_index(&self, name: &str) -> Option<usize> {
        self.substances.iter().position(|s| s.name == name)
    }

    #[must_use]
    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// Returns the reaction-by-substance stoichiometric matrix.
    #[must_use]
    pub fn stoichiometry(&self) -> &DMatrix<f64> {
        &self.stoichiometry
    }

    /// Returns whether every reaction has an enthalpy, either set explicitly
    /// or derivable from formation enthalpies of its participants.
    #[must_use]
    pub fn has_reaction_enthalpies(&self) -> bool {
        self.reactions.iter().enumerate().all(|(j, reaction)| {
            reaction.enthalpy.is_some()
                || self.substances.iter().enumerate().all(|(i, s)| {
                    self.stoichiometry[(j, i)] == 0.0 || s.formation_enthalpy.is_some()
                })
        })
    }

    /// Returns the reaction enthalpies at the mixture temperature, J/mol.
    ///
    /// Explicit enthalpies are used as given.
    /// Otherwise `ΔH = Σ νᵢ ΔHfᵢ + Σ νᵢ ∫cpᵢ dT`, integrating from 298.15 K.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] if a formation enthalpy is missing or the
    /// heat capacity integrals cannot be evaluated.
    pub fn reaction_enthalpies(
        &self,
        properties: &(impl MixtureModel + ?Sized),
        mixture: &MixtureView<'_>,
    ) -> Result<Vec<f64>, PropertyError> {
        let mut integrals: Option<Vec<f64>> = None;

        self.reactions
            .iter()
            .enumerate()
            .map(|(j, reaction)| {
                if let Some(dh) = reaction.enthalpy {
                    return Ok(dh.get::<joule_per_mole>());
                }

                if integrals.is_none() {
                    integrals = Some(
                        properties
                            .heat_capacity_integrals(mixture, standard_temperature())?
                            .iter()
                            .map(|e| e.get::<joule_per_mole>())
                            .collect(),
                    );
                }
                let cp_dt = integrals.as_deref().unwrap_or_default();

                let mut dh = 0.0;
                for (i, s) in self.substances.iter().enumerate() {
                    let nu = self.stoichiometry[(j, i)];
                    if nu == 0.0 {
                        continue;
                    }
                    let hf = s
                        .formation_enthalpy
                        .ok_or_else(|| PropertyError::missing("formation enthalpy", &s.name))?;
                    dh += nu * (hf.get::<joule_per_mole>() + cp_dt.get(i).copied().unwrap_or(0.0));
                }
                Ok(dh)
            })
            .collect()
    }
}
