//! The shared step pipeline every concrete system runs through.

use crate::config::EngineSettings;
use crate::error::ChaosError;
use crate::guard::StabilityGuard;
use crate::lyapunov::LyapunovEstimator;
use crate::poincare::PoincareSampler;
use crate::solvers::RK4;
use crate::systems::SystemKind;
use crate::trail::Trail;
use crate::traits::{ChaoticFlow, ChaoticSystem, Steppable};
use nalgebra::{Point2, Point3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// One simulated system: RK4 stepper, trail, Lyapunov estimator, Poincaré
/// sampler and stability guard composed around a [`ChaoticFlow`] model.
pub struct Simulation<M: ChaoticFlow> {
    model: M,
    state: M::State,
    t: f64,
    solver: RK4<f64>,
    trail: Trail,
    lyapunov: LyapunovEstimator,
    poincare: PoincareSampler,
    guard: StabilityGuard,
    settings: EngineSettings,
    rng: StdRng,
}

impl<M: ChaoticFlow> Simulation<M> {
    pub fn new(model: M, initial: M::State) -> Self {
        Self::with_settings(model, initial, M::default_settings())
    }

    pub fn with_settings(model: M, initial: M::State, settings: EngineSettings) -> Self {
        let settings = settings.sanitized();
        let dim = initial.as_ref().len();
        let mut simulation = Self {
            model,
            state: initial,
            t: 0.0,
            solver: RK4::new(dim),
            trail: Trail::new(settings.max_trail_len),
            lyapunov: LyapunovEstimator::new(
                dim,
                settings.renorm_interval,
                settings.base_dt,
                settings.lyapunov_time_base,
            ),
            poincare: PoincareSampler::new(settings.poincare_capacity, settings.warmup_steps),
            guard: StabilityGuard::new(settings.divergence_threshold),
            settings,
            rng: StdRng::seed_from_u64(settings.seed),
        };
        simulation.reset(initial);
        simulation
    }

    /// Advances one step of `base_dt * speed` and returns the new trail point.
    ///
    /// Non-finite or negative speeds advance nothing. A diverged state is
    /// replaced by the canonical state before it can reach the trail.
    pub fn step(&mut self, speed: f64) -> Point3<f64> {
        let dt = self.settings.base_dt * sanitize_speed(speed);
        let previous = self.state;

        self.solver
            .step(&self.model, &mut self.t, self.state.as_mut(), dt);
        let recovered = self.guard.check(
            M::KIND.name(),
            self.state.as_mut(),
            M::canonical_state().as_ref(),
        );

        let position = self.model.position(self.state.as_ref());
        self.trail.push(position);

        self.poincare.tick();
        if recovered {
            self.lyapunov.reseed_tangent();
            return position;
        }
        self.lyapunov.advance(&self.model, self.state.as_ref(), dt);
        if let Some(point) = self.model.crossing(previous.as_ref(), self.state.as_ref()) {
            self.poincare.record(point);
        }
        position
    }

    /// Reinitializes the state and every accumulator.
    pub fn reset(&mut self, initial: M::State) {
        self.state = initial;
        self.guard.check(
            M::KIND.name(),
            self.state.as_mut(),
            M::canonical_state().as_ref(),
        );
        self.t = 0.0;
        self.trail.clear();
        self.trail.push(self.model.position(self.state.as_ref()));
        self.lyapunov.reset();
        self.poincare.reset();
        debug!(system = M::KIND.name(), state = ?self.state, "simulation reset");
    }

    /// Merges a partial parameter update; takes effect on the next step.
    pub fn update_params(&mut self, update: M::Update) {
        trace!(system = M::KIND.name(), ?update, "merging parameters");
        self.model.merge(update);
    }

    pub fn set_param(&mut self, name: &str, value: f64) -> Result<(), ChaosError> {
        trace!(system = M::KIND.name(), name, value, "setting parameter");
        self.model.set_param(name, value)
    }

    pub fn trim_trail(&mut self, max_len: usize) {
        self.trail.trim(max_len);
    }

    /// Adds bounded uniform noise to the state, leaving every accumulator as
    /// it is. Velocity-like components receive proportionally more noise.
    ///
    /// Noisy components are clamped to half the divergence threshold, so even
    /// huge amounts move the state instead of tripping the guard back to the
    /// canonical state.
    pub fn perturb(&mut self, amount: f64) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        let limit = 0.5 * self.settings.divergence_threshold;
        let before = self.state;
        for (index, value) in self.state.as_mut().iter_mut().enumerate() {
            let noise = self.rng.gen_range(-1.0_f64..=1.0) * amount * M::noise_scale(index);
            *value = (*value + noise).clamp(-limit, limit);
        }
        if self.state == before {
            // Tiny amounts can vanish against the state's magnitude.
            if let Some(first) = self.state.as_mut().first_mut() {
                let nudge = first.abs().max(1.0) * 2.0 * f64::EPSILON;
                *first += nudge;
            }
        }
        self.guard.check(
            M::KIND.name(),
            self.state.as_mut(),
            M::canonical_state().as_ref(),
        );
    }

    pub fn speed(&self) -> f64 {
        self.trail.speed()
    }

    pub fn params(&self) -> &M {
        &self.model
    }

    pub fn state(&self) -> &M::State {
        &self.state
    }

    /// Last trail point, or the current state's position once the trail has
    /// been trimmed to nothing.
    pub fn position(&self) -> Point3<f64> {
        self.trail
            .last()
            .copied()
            .unwrap_or_else(|| self.model.position(self.state.as_ref()))
    }

    pub fn trail(&self) -> &VecDeque<Point3<f64>> {
        self.trail.points()
    }

    pub fn lyapunov_exponent(&self) -> f64 {
        self.lyapunov.exponent()
    }

    pub fn poincare_points(&self) -> &VecDeque<Point2<f64>> {
        self.poincare.points()
    }

    pub fn recoveries(&self) -> u64 {
        self.guard.recoveries()
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

impl<M: ChaoticFlow + Default> Default for Simulation<M> {
    fn default() -> Self {
        Self::new(M::default(), M::canonical_state())
    }
}

impl<M: ChaoticFlow> ChaoticSystem for Simulation<M> {
    fn kind(&self) -> SystemKind {
        M::KIND
    }

    fn step(&mut self, speed: f64) -> Point3<f64> {
        Simulation::step(self, speed)
    }

    fn reset_state(&mut self, initial: &[f64]) -> Result<(), ChaosError> {
        let expected = self.state.as_ref().len();
        let state = M::state_from_slice(initial).ok_or(ChaosError::DimensionMismatch {
            expected,
            actual: initial.len(),
        })?;
        Simulation::reset(self, state);
        Ok(())
    }

    fn update_param(&mut self, name: &str, value: f64) -> Result<(), ChaosError> {
        self.set_param(name, value)
    }

    fn trim_trail(&mut self, max_len: usize) {
        Simulation::trim_trail(self, max_len)
    }

    fn perturb(&mut self, amount: f64) {
        Simulation::perturb(self, amount)
    }

    fn speed(&self) -> f64 {
        Simulation::speed(self)
    }

    fn state(&self) -> &[f64] {
        self.state.as_ref()
    }

    fn param_names(&self) -> &'static [&'static str] {
        M::PARAM_NAMES
    }

    fn param_values(&self) -> Vec<f64> {
        self.model.param_values()
    }

    fn position(&self) -> Point3<f64> {
        Simulation::position(self)
    }

    fn trail(&self) -> &VecDeque<Point3<f64>> {
        Simulation::trail(self)
    }

    fn lyapunov_exponent(&self) -> f64 {
        Simulation::lyapunov_exponent(self)
    }

    fn poincare_points(&self) -> &VecDeque<Point2<f64>> {
        Simulation::poincare_points(self)
    }

    fn recoveries(&self) -> u64 {
        Simulation::recoveries(self)
    }

    fn settings(&self) -> &EngineSettings {
        Simulation::settings(self)
    }
}

fn sanitize_speed(speed: f64) -> f64 {
    if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        0.0
    }
}
