//! Outlet conditions on a stationary plug-flow reactor.
//!
//! Each outlet condition leaves the inlet value of its variable unknown.
//! Every trial set of inlet values is integrated to the outlet and the
//! scaled mismatches `(target − outlet)/scale` are driven to zero:
//! by bisection for a single bracketed condition, otherwise by damped
//! Newton iteration with a finite-difference Jacobian.
//!
//! A trial that leaves the physical domain (a collapsed pressure, a failed
//! property evaluation, a stalled step size) only tells the search that
//! the inlet value was too extreme. Any other failure ends the search and
//! is returned unchanged.

use std::convert::Infallible;

use log::{debug, trace};
use nalgebra::{DMatrix, DVector};
use twine_core::{EquationProblem, Model};
use twine_solvers::equation::{EvalError, bisection};
use uom::si::{pressure::pascal, thermodynamic_temperature::kelvin};

use crate::{
    models::reactor::core::{
        ReactorConfiguration, ReactorError,
        assemble::StateVariable,
        config::OutletTarget,
        error::{IntegrationError, NumericalDomainError},
        profile::{MixtureState, ProfileResult},
    },
    support::{kinetics::ReactionNetwork, ode::OdeSolver, thermo::MixtureModel},
};

use super::{IntegrationSettings, solve_fixed};

/// Solves the reactor for the inlet values that meet every outlet target.
pub(super) fn shoot<P: MixtureModel, S: OdeSolver>(
    config: &ReactorConfiguration,
    network: &ReactionNetwork,
    properties: &P,
    solver: &S,
    settings: &IntegrationSettings,
) -> Result<ProfileResult, ReactorError> {
    let trial = Trial {
        config,
        network,
        properties,
        solver,
        settings,
    };
    match config.outlets() {
        [
            outlet @ OutletTarget {
                bracket: Some(bracket),
                ..
            },
        ] => bisect(&trial, *outlet, *bracket),
        outlets => newton(&trial, outlets),
    }
}

/// Whether a failed trial only means the inlet values were out of reach.
fn recoverable(err: &ReactorError) -> bool {
    matches!(
        err,
        ReactorError::PhysicalConstraint(_)
            | ReactorError::NumericalDomain {
                source: NumericalDomainError::Property { .. },
                ..
            }
            | ReactorError::Integration(IntegrationError::StepSizeUnderflow { .. })
    )
}

fn outlet_value(state: &MixtureState, variable: StateVariable) -> f64 {
    match variable {
        StateVariable::Amount(i) => state.amounts.get(i).copied().unwrap_or(f64::NAN),
        StateVariable::Temperature => state.temperature.get::<kelvin>(),
        StateVariable::CoolantTemperature => state
            .coolant_temperature
            .map_or(f64::NAN, |t| t.get::<kelvin>()),
        StateVariable::Pressure => state.pressure.get::<pascal>(),
    }
}

/// One reactor solve at trial inlet values.
struct Trial<'a, P, S> {
    config: &'a ReactorConfiguration,
    network: &'a ReactionNetwork,
    properties: &'a P,
    solver: &'a S,
    settings: &'a IntegrationSettings,
}

impl<P: MixtureModel, S: OdeSolver> Trial<'_, P, S> {
    fn run(&self, values: &[(StateVariable, f64)]) -> Result<ProfileResult, ReactorError> {
        solve_fixed(
            &self.config.with_inlet_values(values),
            self.network,
            self.properties,
            self.solver,
            self.settings,
        )
    }
}

fn bisect<P: MixtureModel, S: OdeSolver>(
    trial: &Trial<'_, P, S>,
    outlet: OutletTarget,
    bracket: [f64; 2],
) -> Result<ProfileResult, ReactorError> {
    let model = InletModel {
        trial,
        variable: outlet.variable,
    };
    let problem = OutletProblem { outlet };

    let mut last: (f64, Option<ProfileResult>) = (bracket[0], None);
    let result = bisection::solve(
        &model,
        &problem,
        bracket,
        &trial.settings.shooting.bisection(),
        |event: &bisection::Event<'_, InletModel<'_, '_, P, S>, OutletProblem>| {
            match event.result() {
                Ok(evaluation) => {
                    last = (event.x(), Some(evaluation.snapshot.output.clone()));
                    None
                }
                Err(EvalError::Model(err)) => {
                    if let Some(partial) = err.partial() {
                        last = (event.x(), Some(partial.clone()));
                    }
                    // A trial too low to reach the outlet counts as undershooting.
                    recoverable(err).then(bisection::Action::assume_positive)
                }
                Err(EvalError::Problem(never)) => match *never {},
            }
        },
    );
    let (inlet, partial) = last;

    let solution = match result {
        Ok(solution) => solution,
        Err(bisection::Error::Model(source)) => {
            return Err(match source.downcast::<ReactorError>() {
                Ok(err) => *err,
                Err(source) => IntegrationError::Shooting {
                    variable: outlet.variable,
                    inlet,
                    partial: partial.map(Box::new),
                    source: bisection::Error::Model(source),
                }
                .into(),
            });
        }
        Err(source) => {
            return Err(IntegrationError::Shooting {
                variable: outlet.variable,
                inlet,
                partial: partial.map(Box::new),
                source,
            }
            .into());
        }
    };

    if solution.status != bisection::Status::Converged {
        return Err(IntegrationError::ShootingNotConverged {
            variables: vec![outlet.variable],
            residual: solution.residual,
            iters: solution.iters,
            inlet: vec![solution.x],
            partial: Some(Box::new(solution.snapshot.output)),
        }
        .into());
    }

    debug!(
        "outlet {} met after {} bisection iterations",
        outlet.variable, solution.iters
    );
    Ok(solution.snapshot.output)
}

/// A reactor solve with one unknown inlet value as its only input.
struct InletModel<'t, 'a, P, S> {
    trial: &'t Trial<'a, P, S>,
    variable: StateVariable,
}

impl<P: MixtureModel, S: OdeSolver> Model for InletModel<'_, '_, P, S> {
    type Input = f64;
    type Output = ProfileResult;
    type Error = ReactorError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        self.trial.run(&[(self.variable, *input)])
    }
}

struct OutletProblem {
    outlet: OutletTarget,
}

impl EquationProblem<1> for OutletProblem {
    type Input = f64;
    type Output = ProfileResult;
    type Error = Infallible;

    fn input(&self, x: &[f64; 1]) -> Result<Self::Input, Self::Error> {
        Ok(x[0])
    }

    fn residuals(
        &self,
        _input: &Self::Input,
        output: &Self::Output,
    ) -> Result<[f64; 1], Self::Error> {
        let value = outlet_value(output.outlet(), self.outlet.variable);
        Ok([self.outlet.residual(value)])
    }
}

/// Damped Newton iteration on all unknown inlet values.
///
/// The Jacobian is built by forward differences; a step that does not
/// reduce `‖r‖₂`, or whose trial fails recoverably, is halved.
/// Iterates stay within each target's [`OutletTarget::bounds`].
fn newton<P: MixtureModel, S: OdeSolver>(
    trial: &Trial<'_, P, S>,
    outlets: &[OutletTarget],
) -> Result<ProfileResult, ReactorError> {
    let shooting = &trial.settings.shooting;
    let threshold = shooting.newton_threshold(&trial.settings.tolerances);
    let m = outlets.len();
    let variables: Vec<_> = outlets.iter().map(|o| o.variable).collect();

    let project = |x: DVector<f64>| {
        DVector::from_iterator(
            m,
            x.iter().zip(outlets).map(|(&v, o)| {
                let [low, high] = o.bounds();
                v.clamp(low, high)
            }),
        )
    };
    let evaluate = |x: &DVector<f64>| -> Result<(ProfileResult, DVector<f64>), ReactorError> {
        let values: Vec<_> = variables.iter().copied().zip(x.iter().copied()).collect();
        let profile = trial.run(&values)?;
        let state = profile.outlet();
        let r = DVector::from_iterator(
            m,
            outlets
                .iter()
                .map(|o| o.residual(outlet_value(state, o.variable))),
        );
        Ok((profile, r))
    };
    let not_converged = |residual: f64, iters: usize, x: &DVector<f64>, profile: ProfileResult| {
        ReactorError::from(IntegrationError::ShootingNotConverged {
            variables: variables.clone(),
            residual,
            iters,
            inlet: x.iter().copied().collect(),
            partial: Some(Box::new(profile)),
        })
    };

    let mut x = project(DVector::from_iterator(m, outlets.iter().map(|o| o.guess)));
    let (mut profile, mut r) = evaluate(&x)?;

    for iter in 0..shooting.max_iters {
        let norm = r.amax();
        trace!("newton iteration {iter}: inlet {:?}, residual {norm:e}", x.as_slice());
        if norm <= threshold {
            debug!("{m} outlet condition(s) met after {iter} Newton iterations");
            return Ok(profile);
        }

        let mut jacobian = DMatrix::zeros(m, m);
        for (j, outlet) in outlets.iter().enumerate() {
            let h = shooting.jacobian_step * x[j].abs().max(outlet.scale);
            let [_, high] = outlet.bounds();
            let mut h = if x[j] + h > high { -h } else { h };

            let mut shifted = x.clone();
            shifted[j] += h;
            let rh = match evaluate(&shifted) {
                Ok((_, rh)) => rh,
                Err(err) if recoverable(&err) => {
                    h = -h;
                    shifted[j] = x[j] + h;
                    evaluate(&shifted)?.1
                }
                Err(err) => return Err(err),
            };
            jacobian.set_column(j, &((rh - &r) / h));
        }

        let Some(dx) = jacobian.lu().solve(&(-&r)) else {
            debug!("singular shooting Jacobian at inlet {:?}", x.as_slice());
            return Err(not_converged(norm, iter, &x, profile));
        };

        let mut lambda = 1.0;
        let mut accepted = None;
        for _ in 0..=shooting.max_halvings {
            let candidate = project(&x + &dx * lambda);
            match evaluate(&candidate) {
                Ok((p, rc)) if rc.norm() < r.norm() => {
                    accepted = Some((candidate, p, rc));
                    break;
                }
                Ok(_) => {}
                Err(err) if recoverable(&err) => {
                    trace!("trial inlet {:?} out of reach: {err}", candidate.as_slice());
                }
                Err(err) => return Err(err),
            }
            lambda *= 0.5;
        }
        let Some((next, p, rc)) = accepted else {
            return Err(not_converged(norm, iter, &x, profile));
        };
        x = next;
        profile = p;
        r = rc;
    }

    let norm = r.amax();
    if norm <= threshold {
        return Ok(profile);
    }
    Err(not_converged(norm, shooting.max_iters, &x, profile))
}
