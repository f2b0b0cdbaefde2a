//! Classical fourth-order Runge–Kutta with a fixed number of steps.

use nalgebra::DVector;

use super::{Action, OdeError, OdeSolver, OdeSystem, Tolerances, Trajectory, check_problem};

/// Fixed-step RK4 solver.
///
/// The span is divided into `steps` equal steps.
/// Error tolerances are ignored; `max_steps` still bounds the work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rk4 {
    pub steps: usize,
}

impl Default for Rk4 {
    fn default() -> Self {
        Self { steps: 1000 }
    }
}

impl Rk4 {
    #[must_use]
    pub fn new(steps: usize) -> Self {
        Self { steps }
    }
}

impl OdeSolver for Rk4 {
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
        if x1 == x0 || self.steps == 0 {
            return Ok(trajectory);
        }

        #[allow(clippy::cast_precision_loss)]
        let h = (x1 - x0) / self.steps as f64;
        let n = y0.len();
        let mut y = y0;

        for step in 0..self.steps {
            #[allow(clippy::cast_precision_loss)]
            let x = x0 + step as f64 * h;
            if step >= tolerances.max_steps {
                return Err(OdeError::MaxSteps {
                    x,
                    max_steps: tolerances.max_steps,
                    partial: trajectory,
                });
            }

            let eval = |xs: f64, ys: &DVector<f64>| {
                let mut k = DVector::zeros(n);
                system.derivatives(xs, ys, &mut k).map(|()| k).map_err(|e| (xs, e))
            };
            let stages = eval(x, &y).and_then(|k1| {
                let k2 = eval(x + 0.5 * h, &(&y + &k1 * (0.5 * h)))?;
                let k3 = eval(x + 0.5 * h, &(&y + &k2 * (0.5 * h)))?;
                let k4 = eval(x + h, &(&y + &k3 * h))?;
                Ok(k1 + k2 * 2.0 + k3 * 2.0 + k4)
            });

            match stages {
                Ok(slope) => y += slope * (h / 6.0),
                Err((x, source)) => {
                    return Err(OdeError::System {
                        x,
                        source,
                        partial: trajectory,
                    });
                }
            }

            let x_next = if step + 1 == self.steps { x1 } else { x + h };
            trajectory.push(x_next, &y);
            if observer(x_next, &y) == Action::Stop {
                trajectory.stopped = true;
                break;
            }
        }

        Ok(trajectory)
    }
}
