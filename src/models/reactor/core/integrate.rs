//! Integration driver.
//!
//! [`IntegrationDriver`] takes a validated configuration through
//! assembly and integration and returns a [`ProfileResult`].
//! It owns the choices the solver collaborator does not make: the
//! integration domain and initial state for each reactor kind, the
//! pseudo-transient search for a stirred-tank steady state, shooting on
//! outlet conditions, and the physical bounds checked after every step.

mod settings;
mod shooting;

pub use settings::{IntegrationSettings, ShootingConfig, SteadyStateConfig};

use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use uom::si::{
    f64::{Pressure, ThermodynamicTemperature},
    pressure::pascal,
    thermodynamic_temperature::kelvin,
};

use crate::support::{
    kinetics::ReactionNetwork,
    ode::{Action, OdeError, OdeSolver, Trajectory},
    thermo::MixtureModel,
};

use super::{
    ReactorConfiguration,
    assemble::{AssembledSystem, StateVariable, assemble},
    description::Regime,
    error::{IntegrationError, NumericalDomainError, PhysicalConstraintError, ReactorError},
    policy::Vessel,
    profile::{AmountBasis, Axis, MixtureState, ProfileResult},
};

/// Lifecycle of an [`IntegrationDriver`].
///
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Configured,
    Assembling,
    Integrating,
    Completed,
    Failed,
}

/// Drives one reactor solve.
///
/// The outcome is kept: calling [`IntegrationDriver::run`] again returns
/// the stored profile or error without solving twice.
pub struct IntegrationDriver<'a, P, S> {
    config: &'a ReactorConfiguration,
    network: &'a ReactionNetwork,
    properties: &'a P,
    solver: &'a S,
    settings: IntegrationSettings,
    state: DriverState,
    outcome: Option<Result<ProfileResult, ReactorError>>,
}

impl<'a, P: MixtureModel, S: OdeSolver> IntegrationDriver<'a, P, S> {
    #[must_use]
    pub fn new(
        config: &'a ReactorConfiguration,
        network: &'a ReactionNetwork,
        properties: &'a P,
        solver: &'a S,
    ) -> Self {
        Self {
            config,
            network,
            properties,
            solver,
            settings: IntegrationSettings::default(),
            state: DriverState::Configured,
            outcome: None,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: IntegrationSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Solves the reactor, or returns the outcome of the earlier run.
    ///
    /// # Errors
    ///
    /// Returns the [`ReactorError`] that ended the solve; failures after
    /// integration started carry the partial profile.
    pub fn run(&mut self) -> Result<&ProfileResult, &ReactorError> {
        let outcome = match self.outcome.take() {
            Some(outcome) => outcome,
            None => self.execute(),
        };
        self.outcome.insert(outcome).as_ref()
    }

    /// Solves the reactor (if not done yet) and hands over the outcome.
    ///
    /// # Errors
    ///
    /// Returns the [`ReactorError`] that ended the solve.
    pub fn finish(mut self) -> Result<ProfileResult, ReactorError> {
        match self.outcome.take() {
            Some(outcome) => outcome,
            None => self.execute(),
        }
    }

    fn execute(&mut self) -> Result<ProfileResult, ReactorError> {
        let outcome = if self.config.outlets().is_empty() {
            self.assemble_and_integrate()
        } else {
            debug!(
                "searching {} inlet value(s) that meet the outlet conditions",
                self.config.outlets().len()
            );
            self.state = DriverState::Integrating;
            shooting::shoot(
                self.config,
                self.network,
                self.properties,
                self.solver,
                &self.settings,
            )
        };

        match &outcome {
            Ok(profile) => {
                self.state = DriverState::Completed;
                info!(
                    "reactor solved: {} states along {:?}",
                    profile.states().len(),
                    profile.axis()
                );
            }
            Err(err) => {
                self.state = DriverState::Failed;
                warn!("reactor solve failed: {err}");
            }
        }
        outcome
    }

    fn assemble_and_integrate(&mut self) -> Result<ProfileResult, ReactorError> {
        self.state = DriverState::Assembling;
        let system = assemble(self.config, self.network, self.properties)?;
        debug!("assembled {} equations", system.variables().len());

        self.state = DriverState::Integrating;
        integrate(&system, self.config, self.network, self.solver, &self.settings)
    }
}

/// Assembles and integrates a configuration whose inlet is fully known.
fn solve_fixed<P: MixtureModel, S: OdeSolver>(
    config: &ReactorConfiguration,
    network: &ReactionNetwork,
    properties: &P,
    solver: &S,
    settings: &IntegrationSettings,
) -> Result<ProfileResult, ReactorError> {
    let system = assemble(config, network, properties)?;
    integrate(&system, config, network, solver, settings)
}

fn integrate<P: MixtureModel, S: OdeSolver>(
    system: &AssembledSystem<'_, P>,
    config: &ReactorConfiguration,
    network: &ReactionNetwork,
    solver: &S,
    settings: &IntegrationSettings,
) -> Result<ProfileResult, ReactorError> {
    let inlet_t = system.inlet_temperature();
    let inlet_p = system.inlet_pressure();
    let feed = config.inlet_amounts();

    match (config.vessel(), config.regime()) {
        (Vessel::PlugFlow { length, .. }, _) => {
            let recorder = Recorder::new(
                system,
                network,
                (Axis::Length, AmountBasis::MolarFlow, 1.0),
                feed,
                inlet_t,
            );
            let y0 = system.pack(feed, inlet_t, inlet_p);
            run_span(system, solver, settings, (0.0, length), y0, &recorder)
        }
        (Vessel::StirredTank { volume }, Regime::Transient) => {
            let end_time = config.end_time().unwrap_or(0.0);
            let t0 = config.initial_temperature().unwrap_or(inlet_t);

            if config.is_continuous() {
                let q = config.volumetric_flow().unwrap_or(f64::NAN);
                let holdup = match config.initial_holdup() {
                    Some(holdup) => holdup.to_vec(),
                    None => feed.iter().map(|f| f * volume / q).collect(),
                };
                let recorder = Recorder::new(
                    system,
                    network,
                    (Axis::Time, AmountBasis::MolarFlow, q / volume),
                    feed,
                    inlet_t,
                );
                let y0 = system.pack(&holdup, t0, inlet_p);
                run_span(system, solver, settings, (0.0, end_time), y0, &recorder)
            } else {
                let recorder = Recorder::new(
                    system,
                    network,
                    (Axis::Time, AmountBasis::Moles, 1.0),
                    feed,
                    t0,
                );
                let y0 = system.pack(feed, t0, inlet_p);
                run_span(system, solver, settings, (0.0, end_time), y0, &recorder)
            }
        }
        (Vessel::StirredTank { volume }, Regime::Stationary) => {
            steady_state(system, config, network, solver, settings, volume)
        }
    }
}

/// Integrates over `span` and records every accepted state.
fn run_span<P: MixtureModel, S: OdeSolver>(
    system: &AssembledSystem<'_, P>,
    solver: &S,
    settings: &IntegrationSettings,
    span: (f64, f64),
    y0: DVector<f64>,
    recorder: &Recorder,
) -> Result<ProfileResult, ReactorError> {
    let bounds = Bounds::new(system, settings.tolerances.absolute);
    let mut violation = None;
    let mut observer = |x: f64, y: &DVector<f64>| match bounds.check(x, y) {
        Some(found) => {
            violation = Some(found);
            Action::Stop
        }
        None => Action::Continue,
    };

    let trajectory = solver
        .solve(system, span, y0, &settings.tolerances, &mut observer)
        .map_err(|err| ode_failure(err, system, recorder))?;

    if let Some(violation) = violation {
        return Err(violation.into_error(system, recorder, &trajectory).into());
    }
    Ok(recorder.profile(system, &trajectory.positions, &trajectory.states))
}

/// Pseudo-transient continuation of a continuous tank to its steady state.
///
/// Starts from the tank filled with feed and stops once the scaled
/// derivatives fall below the steady-state tolerance.
/// The profile holds the feed and the steady outlet, at `0` and `τ`.
fn steady_state<P: MixtureModel, S: OdeSolver>(
    system: &AssembledSystem<'_, P>,
    config: &ReactorConfiguration,
    network: &ReactionNetwork,
    solver: &S,
    settings: &IntegrationSettings,
    volume: f64,
) -> Result<ProfileResult, ReactorError> {
    let inlet_t = system.inlet_temperature();
    let feed = config.inlet_amounts();
    let q = config.volumetric_flow().unwrap_or(f64::NAN);
    let tau = volume / q;
    let horizon = settings.steady_state.horizon_residence_times * tau;
    let atol = settings.tolerances.absolute;
    let tolerance = settings.steady_state.threshold(&settings.tolerances);

    let recorder = Recorder::new(
        system,
        network,
        (Axis::ResidenceTime, AmountBasis::MolarFlow, q / volume),
        feed,
        inlet_t,
    );
    let holdup: Vec<f64> = feed.iter().map(|f| f * tau).collect();
    let y0 = system.pack(&holdup, inlet_t, system.inlet_pressure());

    let scaled_residual = |x: f64, y: &DVector<f64>| {
        system.evaluate(x, y).map_or(f64::INFINITY, |dy| {
            dy.iter()
                .zip(y.iter())
                .map(|(d, v)| d.abs() * tau / (v.abs() + atol))
                .fold(0.0, f64::max)
        })
    };

    let bounds = Bounds::new(system, atol);
    let mut violation = None;
    let mut observer = |x: f64, y: &DVector<f64>| {
        if let Some(found) = bounds.check(x, y) {
            violation = Some(found);
            return Action::Stop;
        }
        if scaled_residual(x, y) <= tolerance {
            Action::Stop
        } else {
            Action::Continue
        }
    };

    let trajectory = solver
        .solve(system, (0.0, horizon), y0, &settings.tolerances, &mut observer)
        .map_err(|err| ode_failure(err, system, &recorder))?;

    if let Some(violation) = violation {
        return Err(violation.into_error(system, &recorder, &trajectory).into());
    }

    let Some((x, y)) = trajectory.last() else {
        return Err(IntegrationError::InvalidProblem {
            reason: "the solver returned an empty trajectory".into(),
        }
        .into());
    };
    if !trajectory.stopped {
        return Err(IntegrationError::SteadyStateNotReached {
            horizon,
            residual: scaled_residual(x, y),
            partial: Box::new(recorder.profile(
                system,
                &trajectory.positions,
                &trajectory.states,
            )),
        }
        .into());
    }

    debug!("steady state after {x:.3e} s of pseudo-time ({:.1} τ)", x / tau);
    let start = &trajectory.states[0];
    Ok(recorder.profile(system, &[0.0, tau], &[start.clone(), y.clone()]))
}

/// Turns solver states into reported mixture states.
struct Recorder {
    axis: Axis,
    basis: AmountBasis,

    /// Factor from state amounts to reported amounts (`Q/V` for a tank
    /// reporting flows, otherwise 1).
    amount_scale: f64,
    reference: MixtureState,
    substances: Vec<String>,
    stoichiometry: DMatrix<f64>,
}

impl Recorder {
    fn new<P: MixtureModel>(
        system: &AssembledSystem<'_, P>,
        network: &ReactionNetwork,
        (axis, basis, amount_scale): (Axis, AmountBasis, f64),
        reference_amounts: &[f64],
        reference_temperature: f64,
    ) -> Self {
        Self {
            axis,
            basis,
            amount_scale,
            reference: MixtureState {
                position: 0.0,
                amounts: reference_amounts.to_vec(),
                temperature: ThermodynamicTemperature::new::<kelvin>(reference_temperature),
                pressure: Pressure::new::<pascal>(system.inlet_pressure()),
                coolant_temperature: system
                    .coolant_start()
                    .map(ThermodynamicTemperature::new::<kelvin>),
            },
            substances: network.substance_names(),
            stoichiometry: network.stoichiometry().clone(),
        }
    }

    /// Tiny negative amounts left by the solver are reported as zero.
    fn state<P: MixtureModel>(
        &self,
        system: &AssembledSystem<'_, P>,
        position: f64,
        y: &DVector<f64>,
    ) -> MixtureState {
        let (amounts, temperature, pressure) = system.unpack(y);
        MixtureState {
            position,
            amounts: amounts
                .iter()
                .map(|n| n.max(0.0) * self.amount_scale)
                .collect(),
            temperature: ThermodynamicTemperature::new::<kelvin>(temperature),
            pressure: Pressure::new::<pascal>(pressure),
            coolant_temperature: system
                .coolant_temperature(y)
                .map(ThermodynamicTemperature::new::<kelvin>),
        }
    }

    fn profile<P: MixtureModel>(
        &self,
        system: &AssembledSystem<'_, P>,
        positions: &[f64],
        states: &[DVector<f64>],
    ) -> ProfileResult {
        let states = positions
            .iter()
            .zip(states)
            .map(|(&x, y)| self.state(system, x, y))
            .collect();
        ProfileResult::new(
            self.reference.clone(),
            states,
            self.axis,
            self.basis,
            self.substances.clone(),
            self.stoichiometry.clone(),
        )
    }
}

/// Post-step physical bounds.
struct Bounds {
    atol: f64,
    variables: Vec<StateVariable>,
}

/// The first bound an accepted state violated.
struct Violation {
    index: usize,
    value: f64,
    position: f64,
}

impl Bounds {
    fn new<P: MixtureModel>(system: &AssembledSystem<'_, P>, atol: f64) -> Self {
        Self {
            atol,
            variables: system.variables().to_vec(),
        }
    }

    fn check(&self, x: f64, y: &DVector<f64>) -> Option<Violation> {
        self.variables
            .iter()
            .zip(y.iter())
            .position(|(variable, &value)| {
                !value.is_finite()
                    || match variable {
                        StateVariable::Amount(_) => value < -self.atol,
                        StateVariable::Temperature
                        | StateVariable::CoolantTemperature
                        | StateVariable::Pressure => value <= 0.0,
                    }
            })
            .map(|index| Violation {
                index,
                value: y[index],
                position: x,
            })
    }
}

impl Violation {
    /// Builds the error, keeping the states accepted before the violation.
    fn into_error<P: MixtureModel>(
        self,
        system: &AssembledSystem<'_, P>,
        recorder: &Recorder,
        trajectory: &Trajectory,
    ) -> PhysicalConstraintError {
        let kept = trajectory.len().saturating_sub(1);
        PhysicalConstraintError {
            variable: system.variable_name(self.index),
            value: self.value,
            position: self.position,
            partial: Box::new(recorder.profile(
                system,
                &trajectory.positions[..kept],
                &trajectory.states[..kept],
            )),
        }
    }
}

fn ode_failure<P: MixtureModel>(
    err: OdeError<NumericalDomainError>,
    system: &AssembledSystem<'_, P>,
    recorder: &Recorder,
) -> ReactorError {
    let partial = |trajectory: &Trajectory| {
        Box::new(recorder.profile(system, &trajectory.positions, &trajectory.states))
    };

    match err {
        OdeError::System {
            source, partial: p, ..
        } => ReactorError::NumericalDomain {
            source,
            partial: Some(partial(&p)),
        },
        OdeError::StepSizeUnderflow {
            x,
            step,
            partial: p,
        } => IntegrationError::StepSizeUnderflow {
            position: x,
            step,
            partial: partial(&p),
        }
        .into(),
        OdeError::MaxSteps {
            x,
            max_steps,
            partial: p,
        } => IntegrationError::StepLimit {
            position: x,
            max_steps,
            partial: partial(&p),
        }
        .into(),
        OdeError::Cancelled { x, partial: p } => IntegrationError::Cancelled {
            position: x,
            partial: partial(&p),
        }
        .into(),
        other @ (OdeError::InvalidSpan { .. }
        | OdeError::DimensionMismatch { .. }
        | OdeError::NonFiniteInitialValue) => IntegrationError::InvalidProblem {
            reason: other.to_string(),
        }
        .into(),
    }
}
