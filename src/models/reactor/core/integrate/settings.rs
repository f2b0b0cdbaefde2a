use twine_solvers::equation::bisection;

use crate::support::ode::Tolerances;

/// Numerical settings for one reactor solve.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntegrationSettings {
    pub tolerances: Tolerances,
    pub steady_state: SteadyStateConfig,
    pub shooting: ShootingConfig,
}

/// Convergence test for stationary stirred tanks.
///
/// The tank equations are integrated in pseudo-time from a feed-filled
/// tank until every state satisfies `|dyᵢ/dt|·τ ≤ threshold·(|yᵢ| + atol)`.
/// See [`SteadyStateConfig::threshold`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteadyStateConfig {
    /// Requested threshold on the scaled derivative.
    pub tolerance: f64,

    /// Pseudo-time horizon, in residence times `τ = V/Q`.
    pub horizon_residence_times: f64,
}

impl Default for SteadyStateConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            horizon_residence_times: 1000.0,
        }
    }
}

impl SteadyStateConfig {
    /// Returns the threshold actually applied with `tolerances`.
    ///
    /// An integrator run at relative tolerance `rtol` leaves derivative noise
    /// of that order, so the threshold is never tighter than `10·rtol`.
    #[must_use]
    pub fn threshold(&self, tolerances: &Tolerances) -> f64 {
        self.tolerance.max(10.0 * tolerances.relative)
    }
}

/// Settings for outlet-condition shooting.
///
/// A single bracketed condition is met by bisection; anything else by
/// damped Newton iteration on all unknown inlet values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShootingConfig {
    pub max_iters: usize,

    /// Relative tolerance on the inlet value being searched (bisection).
    pub x_rel_tol: f64,

    /// Tolerance on the scaled outlet mismatch `(target − outlet)/scale`.
    pub residual_tol: f64,

    /// Relative forward-difference step for the Newton Jacobian.
    pub jacobian_step: f64,

    /// Step halvings tried before a Newton iteration gives up.
    pub max_halvings: usize,
}

impl Default for ShootingConfig {
    fn default() -> Self {
        Self {
            max_iters: 100,
            x_rel_tol: 1e-12,
            residual_tol: 1e-10,
            jacobian_step: 1e-6,
            max_halvings: 20,
        }
    }
}

impl ShootingConfig {
    /// Mismatch accepted by Newton iteration with `tolerances`.
    ///
    /// Finite differences of integrated outlets carry noise of order `rtol`,
    /// so the threshold is never tighter than `10·rtol`.
    #[must_use]
    pub fn newton_threshold(&self, tolerances: &Tolerances) -> f64 {
        self.residual_tol.max(10.0 * tolerances.relative)
    }

    pub(super) fn bisection(&self) -> bisection::Config {
        bisection::Config {
            max_iters: self.max_iters,
            x_abs_tol: 0.0,
            x_rel_tol: self.x_rel_tol,
            residual_tol: self.residual_tol,
        }
    }
}
