//! Balance policies, one per axis.
//!
//! Each policy is a small tagged variant set chosen once at configuration
//! time.
//! During evaluation it contributes the derivatives of its own state
//! variables from a [`Point`] prepared by the assembler: the mass policy
//! fills the amount derivatives, the energy policy the temperature (and
//! coolant temperature) derivative, the pressure policy the pressure
//! derivative.

mod pressure;

pub use pressure::{Ergun, FlowContext, PressureDrop};

use std::sync::Arc;

use crate::support::thermo::PropertyError;

use super::description::CoolantFlow;

/// Where reactions take place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionSite {
    /// Rates are per unit reactor volume, mol/(m³·s).
    Homogeneous,

    /// Rates are per kilogram of catalyst, mol/(kg·s).
    Heterogeneous,
}

/// Whether material flows through the reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Continuous,

    /// Closed vessel (batch).
    Discontinuous,
}

/// Mass balance policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassPolicy {
    /// Catalyst loading, kg of catalyst per m³ of reactor; `None` for
    /// homogeneous reactions.
    pub catalyst_loading: Option<f64>,
    pub operation: Operation,
}

impl MassPolicy {
    #[must_use]
    pub fn site(&self) -> ReactionSite {
        if self.catalyst_loading.is_some() {
            ReactionSite::Heterogeneous
        } else {
            ReactionSite::Homogeneous
        }
    }

    /// Factor turning rate-law output into a rate per unit reactor volume.
    #[must_use]
    pub fn rate_scale(&self) -> f64 {
        self.catalyst_loading.unwrap_or(1.0)
    }

    /// Writes the amount derivatives.
    ///
    /// - plug flow: `dFᵢ/dz = A·gᵢ`
    /// - continuous tank: `dNᵢ/dt = Fᵢ₀ − Nᵢ·Q/V + V·gᵢ`
    /// - closed tank: `dNᵢ/dt = V·gᵢ`
    ///
    /// where `gᵢ = Σⱼ νⱼᵢ rⱼ` is the net volumetric production.
    pub(super) fn contribute(&self, point: &Point<'_>, out: &mut [f64]) {
        match point.vessel {
            Vessel::PlugFlow { cross_section, .. } => {
                for (d, g) in out.iter_mut().zip(point.production) {
                    *d = cross_section * g;
                }
            }
            Vessel::StirredTank { volume } => match (self.operation, point.feed) {
                (Operation::Continuous, Some(feed)) => {
                    let dilution = feed.volumetric_flow / volume;
                    for (i, d) in out.iter_mut().enumerate() {
                        *d = feed.amounts[i] - point.amounts[i] * dilution
                            + volume * point.production[i];
                    }
                }
                _ => {
                    for (d, g) in out.iter_mut().zip(point.production) {
                        *d = volume * g;
                    }
                }
            },
        }
    }
}

/// Heat exchange with a coolant or heating medium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatExchange {
    /// Overall heat transfer coefficient, W/(m²·K).
    pub coefficient: f64,

    /// Total exchange area, m².
    pub area: f64,

    /// Uniform coolant temperature, or the coolant inlet temperature when
    /// `stream` is set, K.
    pub coolant_temperature: f64,

    /// Coolant stream whose temperature is integrated along a plug-flow reactor.
    pub stream: Option<CoolantStream>,
}

/// A coolant stream with a finite heat capacity flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoolantStream {
    /// `ṁ·cp` of the coolant, W/K.
    pub heat_capacity_flow: f64,
    pub flow: CoolantFlow,
}

impl HeatExchange {
    /// Heat gained by the reactor through the full exchange area, W.
    ///
    /// `coolant` is the local coolant temperature when it is a state.
    fn duty(&self, temperature: f64, coolant: Option<f64>) -> f64 {
        let tc = coolant.unwrap_or(self.coolant_temperature);
        self.coefficient * self.area * (tc - temperature)
    }
}

/// Energy balance policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnergyPolicy {
    /// Temperature fixed at the inlet value; no energy equation.
    Isothermic,

    /// Heat of reaction plus exchange through the wall.
    NonIsothermic(HeatExchange),

    /// Heat of reaction only.
    Adiabatic,
}

impl EnergyPolicy {
    #[must_use]
    pub fn has_temperature_equation(&self) -> bool {
        !matches!(self, Self::Isothermic)
    }

    #[must_use]
    pub fn has_coolant_equation(&self) -> bool {
        matches!(
            self,
            Self::NonIsothermic(HeatExchange {
                stream: Some(_),
                ..
            })
        )
    }

    /// Returns the coolant temperature derivative along a plug-flow reactor,
    /// or `None` without a coolant stream.
    ///
    /// `dTc/dz = ±U·(a/L)·(T − Tc) / (ṁ·cp)`, positive for co-current flow.
    pub(super) fn coolant_contribute(&self, point: &Point<'_>) -> Option<f64> {
        let Self::NonIsothermic(exchange) = self else {
            return None;
        };
        let stream = exchange.stream?;
        let Vessel::PlugFlow { length, .. } = point.vessel else {
            return None;
        };
        let tc = point.coolant_temperature?;

        let gained = -exchange.duty(point.temperature, Some(tc)) / length;
        let sign = match stream.flow {
            CoolantFlow::CoCurrent => 1.0,
            CoolantFlow::CounterCurrent => -1.0,
        };
        Some(sign * gained / stream.heat_capacity_flow)
    }

    /// Returns the temperature derivative, or `None` when isothermic.
    ///
    /// - plug flow: `dT/dz = (A·Σ(−ΔHⱼ)rⱼ + U·(a/L)·(Tc − T)) / Σ Fᵢ cpᵢ`
    /// - tank: `dT/dt = (Σ Fᵢ₀ cpᵢ (T₀ − T) + V·Σ(−ΔHⱼ)rⱼ + U·a·(Tc − T)) / Σ Nᵢ cpᵢ`
    ///
    /// `point` must carry heat capacities and reaction enthalpies.
    pub(super) fn contribute(&self, point: &Point<'_>) -> Option<f64> {
        let exchange = match self {
            Self::Isothermic => return None,
            Self::NonIsothermic(exchange) => Some(exchange),
            Self::Adiabatic => None,
        };

        let thermal = point.thermal.as_ref()?;
        let heat_release: f64 = thermal
            .reaction_enthalpies
            .iter()
            .zip(point.rates)
            .map(|(dh, r)| -dh * r)
            .sum();
        let capacity: f64 = point
            .amounts
            .iter()
            .zip(&thermal.heat_capacities)
            .map(|(n, cp)| n.max(0.0) * cp)
            .sum();
        let t = point.temperature;
        let tc = point.coolant_temperature;

        let numerator = match point.vessel {
            Vessel::PlugFlow {
                cross_section,
                length,
            } => {
                cross_section * heat_release
                    + exchange.map_or(0.0, |hx| hx.duty(t, tc) / length)
            }
            Vessel::StirredTank { volume } => {
                let feed = point.feed.map_or(0.0, |feed| {
                    feed.amounts
                        .iter()
                        .zip(&thermal.heat_capacities)
                        .map(|(f, cp)| f * cp)
                        .sum::<f64>()
                        * (feed.temperature - t)
                });
                feed + volume * heat_release + exchange.map_or(0.0, |hx| hx.duty(t, tc))
            }
        };

        Some(numerator / capacity)
    }
}

/// Pressure balance policy.
#[derive(Debug, Clone)]
pub enum PressurePolicy {
    /// Pressure fixed at the inlet value; no pressure equation.
    Isobaric,

    /// Pressure follows a pressure-drop correlation along the reactor.
    NonIsobaric(Arc<dyn PressureDrop>),
}

impl PressurePolicy {
    #[must_use]
    pub fn has_pressure_equation(&self) -> bool {
        matches!(self, Self::NonIsobaric(_))
    }

    /// Returns the pressure derivative along the reactor, or `None` when isobaric.
    pub(super) fn contribute(
        &self,
        flow: &FlowContext<'_>,
    ) -> Result<Option<f64>, PropertyError> {
        match self {
            Self::Isobaric => Ok(None),
            Self::NonIsobaric(correlation) => correlation.gradient(flow).map(Some),
        }
    }
}

/// Validated reactor vessel geometry, SI units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Vessel {
    PlugFlow { cross_section: f64, length: f64 },
    StirredTank { volume: f64 },
}

impl Vessel {
    #[must_use]
    pub fn volume(&self) -> f64 {
        match *self {
            Self::PlugFlow {
                cross_section,
                length,
            } => cross_section * length,
            Self::StirredTank { volume } => volume,
        }
    }
}

/// Continuous feed into a tank.
#[derive(Debug, Clone, Copy)]
pub(super) struct Feed<'a> {
    /// Molar feed flows, mol/s.
    pub amounts: &'a [f64],

    /// Feed temperature, K.
    pub temperature: f64,

    /// Volumetric flow through the tank, m³/s.
    pub volumetric_flow: f64,
}

/// Energy-balance data evaluated at the current point.
#[derive(Debug, Clone)]
pub(super) struct Thermal {
    /// J/mol, one per reaction.
    pub reaction_enthalpies: Vec<f64>,

    /// J/(mol·K), one per substance.
    pub heat_capacities: Vec<f64>,
}

/// Local state shared by the policies during one derivative evaluation.
#[derive(Debug, Clone)]
pub(super) struct Point<'a> {
    pub vessel: Vessel,
    pub feed: Option<Feed<'a>>,
    pub amounts: &'a [f64],
    pub temperature: f64,

    /// Local coolant temperature, K, when it is a state variable.
    pub coolant_temperature: Option<f64>,

    /// Reaction rates per unit reactor volume, mol/(m³·s).
    pub rates: &'a [f64],

    /// Net production `Σⱼ νⱼᵢ rⱼ`, mol/(m³·s).
    pub production: &'a [f64],
    pub thermal: Option<Thermal>,
}
