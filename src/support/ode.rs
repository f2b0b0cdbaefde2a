//! Initial value problem integration.
//!
//! Reactor balances are handed to an [`OdeSolver`] as an [`OdeSystem`]:
//! a dense state vector `y` in plain SI units, an independent variable `x`
//! (position or time), and a fallible derivative function.
//! Derivative failures abort integration and are returned unchanged inside
//! [`OdeError::System`] together with the trajectory accepted so far.
//!
//! Two solvers are provided:
//!
//! - [`Dopri5`]: adaptive Dormand–Prince 5(4) with error control
//! - [`Rk4`]: classical fixed-step fourth-order Runge–Kutta
//!
//! After every accepted step the caller's observer sees `(x, y)` and may
//! return [`Action::Stop`] to end integration early.

mod dopri5;
mod error;
mod rk4;

use nalgebra::DVector;

pub use dopri5::Dopri5;
pub use error::OdeError;
pub use rk4::Rk4;

/// A first-order system `dy/dx = f(x, y)`.
pub trait OdeSystem {
    type Error;

    /// Number of state variables.
    fn dimension(&self) -> usize;

    /// Writes `f(x, y)` into `dy`.
    ///
    /// # Errors
    ///
    /// Returns the system's error if the derivatives cannot be evaluated.
    fn derivatives(
        &self,
        x: f64,
        y: &DVector<f64>,
        dy: &mut DVector<f64>,
    ) -> Result<(), Self::Error>;
}

/// Decision returned by an observer after each accepted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Stop,
}

/// Accuracy and effort limits for one integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub relative: f64,
    pub absolute: f64,

    /// Maximum number of accepted plus rejected steps.
    pub max_steps: usize,

    /// Upper bound on the step size, if any.
    pub max_step: Option<f64>,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            relative: 1e-8,
            absolute: 1e-10,
            max_steps: 100_000,
            max_step: None,
        }
    }
}

/// Accepted integration points, in order, starting with the initial value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub positions: Vec<f64>,
    pub states: Vec<DVector<f64>>,

    /// Whether the observer ended integration before the end of the span.
    pub stopped: bool,
}

impl Trajectory {
    fn start(x0: f64, y0: &DVector<f64>) -> Self {
        Self {
            positions: vec![x0],
            states: vec![y0.clone()],
            stopped: false,
        }
    }

    fn push(&mut self, x: f64, y: &DVector<f64>) {
        self.positions.push(x);
        self.states.push(y.clone());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the last accepted point.
    #[must_use]
    pub fn last(&self) -> Option<(f64, &DVector<f64>)> {
        Some((*self.positions.last()?, self.states.last()?))
    }
}

/// An initial value problem integrator.
pub trait OdeSolver: Send + Sync {
    /// Integrates `system` from `span.0` to `span.1` starting at `y0`.
    ///
    /// `observer` is called after every accepted step, not for the initial
    /// point.
    ///
    /// # Errors
    ///
    /// Returns [`OdeError`] carrying the partial trajectory if the system
    /// fails, the step size underflows, the step limit is hit, or the
    /// integration is cancelled.
    fn solve<S: OdeSystem>(
        &self,
        system: &S,
        span: (f64, f64),
        y0: DVector<f64>,
        tolerances: &Tolerances,
        observer: &mut dyn FnMut(f64, &DVector<f64>) -> Action,
    ) -> Result<Trajectory, OdeError<S::Error>>;
}

/// Validates inputs shared by every solver.
fn check_problem<E>(
    span: (f64, f64),
    y0: &DVector<f64>,
    dimension: usize,
) -> Result<(), OdeError<E>> {
    if !(span.0.is_finite() && span.1.is_finite()) || span.1 < span.0 {
        return Err(OdeError::InvalidSpan {
            start: span.0,
            end: span.1,
        });
    }
    if y0.len() != dimension {
        return Err(OdeError::DimensionMismatch {
            expected: dimension,
            actual: y0.len(),
        });
    }
    if y0.iter().any(|v| !v.is_finite()) {
        return Err(OdeError::NonFiniteInitialValue);
    }
    Ok(())
}

#[cfg(test)]
mod test_systems {
    use std::convert::Infallible;

    use nalgebra::DVector;

    use super::OdeSystem;

    /// `dy/dx = −k·y`.
    pub(super) struct Decay {
        pub k: f64,
    }

    impl OdeSystem for Decay {
        type Error = Infallible;

        fn dimension(&self) -> usize {
            1
        }

        fn derivatives(
            &self,
            _x: f64,
            y: &DVector<f64>,
            dy: &mut DVector<f64>,
        ) -> Result<(), Infallible> {
            dy[0] = -self.k * y[0];
            Ok(())
        }
    }

    /// Harmonic oscillator `y'' = −y` as a first-order pair.
    pub(super) struct Oscillator;

    impl OdeSystem for Oscillator {
        type Error = Infallible;

        fn dimension(&self) -> usize {
            2
        }

        fn derivatives(
            &self,
            _x: f64,
            y: &DVector<f64>,
            dy: &mut DVector<f64>,
        ) -> Result<(), Infallible> {
            dy[0] = y[1];
            dy[1] = -y[0];
            Ok(())
        }
    }

    /// Fails once `x` passes `at`.
    pub(super) struct FailsAfter {
        pub at: f64,
    }

    #[derive(Debug, PartialEq)]
    pub(super) struct Boom(pub f64);

    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom at {}", self.0)
        }
    }

    impl std::error::Error for Boom {}

    impl OdeSystem for FailsAfter {
        type Error = Boom;

        fn dimension(&self) -> usize {
            1
        }

        fn derivatives(
            &self,
            x: f64,
            _y: &DVector<f64>,
            dy: &mut DVector<f64>,
        ) -> Result<(), Boom> {
            if x > self.at {
                return Err(Boom(x));
            }
            dy[0] = 1.0;
            Ok(())
        }
    }
}
