//! Dormand–Prince 5(4) explicit Runge–Kutta integrator with adaptive steps.
//!
//! Each step advances with the fifth-order solution and controls the step
//! size with the embedded fourth-order error estimate.
//! The last stage is evaluated at the new point and reused as the first
//! stage of the next step.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use log::debug;
use nalgebra::DVector;

use super::{Action, OdeError, OdeSolver, OdeSystem, Tolerances, Trajectory, check_problem};

const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const A71: f64 = 35.0 / 384.0;
const A73: f64 = 500.0 / 1113.0;
const A74: f64 = 125.0 / 192.0;
const A75: f64 = -2187.0 / 6784.0;
const A76: f64 = 11.0 / 84.0;

// Difference between the fifth- and fourth-order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339_200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

/// Adaptive Dormand–Prince 5(4) solver.
///
/// Step-size control uses the usual `h·clamp(safety·err^(−1/5))` update.
/// A shared cancellation flag, when set from another thread, stops the
/// integration before the next step with [`OdeError::Cancelled`].
#[derive(Debug, Clone)]
pub struct Dopri5 {
    pub safety: f64,
    pub min_factor: f64,
    pub max_factor: f64,

    /// First trial step; estimated from the problem when `None`.
    pub initial_step: Option<f64>,

    cancel: Option<Arc<AtomicBool>>,
}

impl Default for Dopri5 {
    fn default() -> Self {
        Self {
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 5.0,
            initial_step: None,
            cancel: None,
        }
    }
}

impl Dopri5 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = Some(step);
        self
    }

    /// Observes `flag` between steps; setting it cancels the integration.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Result of one trial step.
struct Trial {
    y: DVector<f64>,
    k7: DVector<f64>,
    error: f64,
}

impl OdeSolver for Dopri5 {
    fn solve<S: OdeSystem>(
        &self,
        system: &S,
        span: (f64, f64),
        y0: DVector<f64>,
        tolerances: &Tolerances,
        observer: &mut dyn FnMut(f64, &DVector<f64>) -> Action,
    ) -> Result<Trajectory, OdeError<S::Error>> {
        check_problem(span, &y0, system.dimension())?;

        let (x0, x1) = span;
        let mut trajectory = Trajectory::start(x0, &y0);
        if x1 == x0 {
            return Ok(trajectory);
        }

        let mut x = x0;
        let mut y = y0;
        let mut k1 = DVector::zeros(y.len());
        if let Err(source) = system.derivatives(x, &y, &mut k1) {
            return Err(OdeError::System {
                x,
                source,
                partial: trajectory,
            });
        }

        let max_step = tolerances.max_step.map_or(x1 - x0, |h| h.min(x1 - x0));
        let mut h = match self.initial_step {
            Some(h) => h,
            None => match initial_step(system, x, &y, &k1, tolerances) {
                Ok(h) => h,
                Err((x, source)) => {
                    return Err(OdeError::System {
                        x,
                        source,
                        partial: trajectory,
                    });
                }
            },
        }
        .min(max_step);

        let mut steps = 0;
        let mut rejected = 0;
        let mut last_rejected = false;

        loop {
            if self.is_cancelled() {
                debug!("dopri5 cancelled at x = {x}");
                return Err(OdeError::Cancelled {
                    x,
                    partial: trajectory,
                });
            }
            if steps >= tolerances.max_steps {
                return Err(OdeError::MaxSteps {
                    x,
                    max_steps: tolerances.max_steps,
                    partial: trajectory,
                });
            }
            steps += 1;

            let remaining = x1 - x;
            let is_last = h >= remaining * (1.0 - 1e-12);
            if is_last {
                h = remaining;
            }
            if h <= 16.0 * f64::EPSILON * x.abs().max(1.0) {
                return Err(OdeError::StepSizeUnderflow {
                    x,
                    step: h,
                    partial: trajectory,
                });
            }

            let trial = match attempt(system, x, &y, &k1, h, tolerances) {
                Ok(trial) => trial,
                Err((x, source)) => {
                    return Err(OdeError::System {
                        x,
                        source,
                        partial: trajectory,
                    });
                }
            };

            if trial.error <= 1.0 {
                x = if is_last { x1 } else { x + h };
                y = trial.y;
                k1 = trial.k7;
                trajectory.push(x, &y);

                if observer(x, &y) == Action::Stop {
                    trajectory.stopped = true;
                    break;
                }
                if is_last {
                    break;
                }

                let mut factor = if trial.error == 0.0 {
                    self.max_factor
                } else {
                    (self.safety * trial.error.powf(-0.2)).clamp(self.min_factor, self.max_factor)
                };
                if last_rejected {
                    factor = factor.min(1.0);
                }
                h = (h * factor).min(max_step);
                last_rejected = false;
            } else {
                rejected += 1;
                let factor = if trial.error.is_finite() {
                    (self.safety * trial.error.powf(-0.2)).max(self.min_factor)
                } else {
                    self.min_factor
                };
                h *= factor.min(1.0);
                last_rejected = true;
            }
        }

        debug!(
            "dopri5 integrated [{x0}, {x}] in {} accepted and {rejected} rejected steps",
            steps - rejected
        );
        Ok(trajectory)
    }
}

/// Takes one trial step of size `h` from `(x, y)` with first stage `k1`.
fn attempt<S: OdeSystem>(
    system: &S,
    x: f64,
    y: &DVector<f64>,
    k1: &DVector<f64>,
    h: f64,
    tolerances: &Tolerances,
) -> Result<Trial, (f64, S::Error)> {
    let n = y.len();
    let eval = |xs: f64, ys: &DVector<f64>| {
        let mut k = DVector::zeros(n);
        system.derivatives(xs, ys, &mut k).map_err(|e| (xs, e))?;
        Ok(k)
    };

    let k2 = eval(x + C2 * h, &(y + k1 * (A21 * h)))?;
    let k3 = eval(x + C3 * h, &(y + (k1 * A31 + &k2 * A32) * h))?;
    let k4 = eval(x + C4 * h, &(y + (k1 * A41 + &k2 * A42 + &k3 * A43) * h))?;
    let k5 = eval(
        x + C5 * h,
        &(y + (k1 * A51 + &k2 * A52 + &k3 * A53 + &k4 * A54) * h),
    )?;
    let k6 = eval(
        x + h,
        &(y + (k1 * A61 + &k2 * A62 + &k3 * A63 + &k4 * A64 + &k5 * A65) * h),
    )?;
    let y_new = y + (k1 * A71 + &k3 * A73 + &k4 * A74 + &k5 * A75 + &k6 * A76) * h;
    let k7 = eval(x + h, &y_new)?;

    let err = (k1 * E1 + &k3 * E3 + &k4 * E4 + &k5 * E5 + &k6 * E6 + &k7 * E7) * h;
    let sum: f64 = err
        .iter()
        .zip(y.iter().zip(y_new.iter()))
        .map(|(e, (a, b))| {
            let scale = tolerances.absolute + tolerances.relative * a.abs().max(b.abs());
            (e / scale).powi(2)
        })
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let error = (sum / n.max(1) as f64).sqrt();

    Ok(Trial {
        y: y_new,
        k7,
        error,
    })
}

/// Estimates a first step size from the scale of the initial derivatives.
fn initial_step<S: OdeSystem>(
    system: &S,
    x: f64,
    y: &DVector<f64>,
    f0: &DVector<f64>,
    tolerances: &Tolerances,
) -> Result<f64, (f64, S::Error)> {
    #[allow(clippy::cast_precision_loss)]
    let n = y.len().max(1) as f64;
    let scale = |i: usize| tolerances.absolute + tolerances.relative * y[i].abs();
    let rms = |v: &DVector<f64>| {
        (v.iter()
            .enumerate()
            .map(|(i, vi)| (vi / scale(i)).powi(2))
            .sum::<f64>()
            / n)
            .sqrt()
    };

    let d0 = rms(y);
    let d1 = rms(f0);
    let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };

    let y1 = y + f0 * h0;
    let mut f1 = DVector::zeros(y.len());
    system
        .derivatives(x + h0, &y1, &mut f1)
        .map_err(|e| (x + h0, e))?;
    let d2 = rms(&(&f1 - f0)) / h0;

    let d = d1.max(d2);
    let h1 = if d <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d).powf(0.2)
    };

    Ok((100.0 * h0).min(h1))
}
