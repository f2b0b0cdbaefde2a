//! Mixture property models.
//!
//! Both models read constant per-substance data from [`Substance`]:
//! heat capacities are taken as constant, so heat capacity integrals reduce
//! to `cp·ΔT`, and mixture viscosity is blended from pure viscosities with a
//! [`ViscosityMixingRule`].

pub mod ideal_gas;
pub mod ideal_solution;

pub use ideal_gas::IdealGas;
pub use ideal_solution::IdealSolution;

use uom::si::{
    dynamic_viscosity::pascal_second,
    f64::{DynamicViscosity, MolarHeatCapacity},
    molar_mass::kilogram_per_mole,
};

use super::{MixtureView, PropertyError, Substance};

/// Rule used to blend pure-substance viscosities into a mixture viscosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViscosityMixingRule {
    /// Mole-fraction weighted mean: `μ = Σ xᵢ μᵢ`.
    Linear,

    /// Logarithmic blend without interaction parameters: `ln μ = Σ xᵢ ln μᵢ`.
    GrunbergNissan,

    /// Square-root molar mass weighting:
    /// `μ = Σ xᵢ μᵢ √Mᵢ / Σ xᵢ √Mᵢ`.
    #[default]
    HerningZipperer,
}

impl ViscosityMixingRule {
    /// Blends the pure viscosities of `mixture`'s substances.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::Undefined`] if a required viscosity or molar
    /// mass is missing, and [`PropertyError::OutOfDomain`] for non-positive
    /// viscosities under the logarithmic rule.
    pub fn blend(self, mixture: &MixtureView<'_>) -> Result<DynamicViscosity, PropertyError> {
        let mu = |s: &Substance| s.viscosity.map(|v| v.get::<pascal_second>());

        let value = match self {
            Self::Linear => mixture.weighted_sum("viscosity", mu)?,
            Self::GrunbergNissan => {
                let ln_mu = mixture.weighted_sum("viscosity", |s| {
                    mu(s).map(|v| if v > 0.0 { v.ln() } else { f64::NAN })
                })?;
                if ln_mu.is_nan() {
                    return Err(PropertyError::OutOfDomain {
                        context: "logarithmic viscosity blend requires positive viscosities"
                            .into(),
                    });
                }
                ln_mu.exp()
            }
            Self::HerningZipperer => {
                let mut numerator = 0.0;
                let mut denominator = 0.0;
                for (s, &x) in mixture.substances.iter().zip(mixture.mole_fractions) {
                    let viscosity =
                        mu(s).ok_or_else(|| PropertyError::missing("viscosity", &s.name))?;
                    let m = s
                        .molar_mass
                        .ok_or_else(|| PropertyError::missing("molar mass", &s.name))?
                        .get::<kilogram_per_mole>();
                    numerator += x * viscosity * m.sqrt();
                    denominator += x * m.sqrt();
                }
                if denominator <= 0.0 {
                    return Err(PropertyError::OutOfDomain {
                        context: "empty mixture has no viscosity".into(),
                    });
                }
                numerator / denominator
            }
        };

        Ok(DynamicViscosity::new::<pascal_second>(value))
    }
}

/// Collects the constant heat capacities stored on each substance.
fn constant_heat_capacities(
    mixture: &MixtureView<'_>,
) -> Result<Vec<MolarHeatCapacity>, PropertyError> {
    mixture
        .substances
        .iter()
        .map(|s| {
            s.heat_capacity
                .ok_or_else(|| PropertyError::missing("heat capacity", &s.name))
        })
        .collect()
}
