//! Damped planar double pendulum.
//!
//! State is `[θ1, θ2, ω1, ω2]` with angles measured from the downward
//! vertical. Angles are integrated unwrapped; only the Poincaré test and the
//! recorded section pair use the wrapped values.
//!
//! The tangent dynamics are approximated by a forward finite difference of
//! the vector field rather than an analytic Jacobian.

use crate::config::EngineSettings;
use crate::error::ChaosError;
use crate::simulation::Simulation;
use crate::systems::SystemKind;
use crate::traits::{ChaoticFlow, ChaoticSystem, DynamicalSystem};
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

const TANGENT_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoublePendulum {
    pub m1: f64,
    pub m2: f64,
    pub l1: f64,
    pub l2: f64,
    pub g: f64,
    pub damping: f64,
}

impl Default for DoublePendulum {
    fn default() -> Self {
        Self {
            m1: 1.0,
            m2: 1.0,
            l1: 1.0,
            l2: 1.0,
            g: 9.81,
            damping: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoublePendulumUpdate {
    pub m1: Option<f64>,
    pub m2: Option<f64>,
    pub l1: Option<f64>,
    pub l2: Option<f64>,
    pub g: Option<f64>,
    pub damping: Option<f64>,
}

/// Cartesian positions of the two bobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joints {
    pub p1: Point2<f64>,
    pub p2: Point2<f64>,
}

/// Wraps an angle into `(-π, π]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}

impl DoublePendulum {
    pub fn joints(&self, state: &[f64]) -> Joints {
        let (sin1, cos1) = state[0].sin_cos();
        let (sin2, cos2) = state[1].sin_cos();
        let p1 = Point2::new(self.l1 * sin1, -self.l1 * cos1);
        let p2 = Point2::new(p1.x + self.l2 * sin2, p1.y - self.l2 * cos2);
        Joints { p1, p2 }
    }

    /// Kinetic plus potential energy, with the pivot as the potential zero.
    pub fn total_energy(&self, state: &[f64]) -> f64 {
        let (t1, t2, w1, w2) = (state[0], state[1], state[2], state[3]);
        let kinetic = 0.5 * self.m1 * (self.l1 * w1).powi(2)
            + 0.5
                * self.m2
                * ((self.l1 * w1).powi(2)
                    + (self.l2 * w2).powi(2)
                    + 2.0 * self.l1 * self.l2 * w1 * w2 * (t1 - t2).cos());
        let potential =
            -(self.m1 + self.m2) * self.g * self.l1 * t1.cos() - self.m2 * self.g * self.l2 * t2.cos();
        kinetic + potential
    }
}

impl DynamicalSystem<f64> for DoublePendulum {
    fn dimension(&self) -> usize {
        4
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let (t1, t2, w1, w2) = (x[0], x[1], x[2], x[3]);
        let (m1, m2, l1, l2, g) = (self.m1, self.m2, self.l1, self.l2, self.g);
        let delta = t1 - t2;
        let (sin_d, cos_d) = delta.sin_cos();
        let den = 2.0 * m1 + m2 - m2 * (2.0 * delta).cos();

        let num1 = -g * (2.0 * m1 + m2) * t1.sin()
            - m2 * g * (t1 - 2.0 * t2).sin()
            - 2.0 * sin_d * m2 * (w2 * w2 * l2 + w1 * w1 * l1 * cos_d);
        let num2 = 2.0
            * sin_d
            * (w1 * w1 * l1 * (m1 + m2) + g * (m1 + m2) * t1.cos() + w2 * w2 * l2 * m2 * cos_d);

        out[0] = w1;
        out[1] = w2;
        out[2] = num1 / (l1 * den) - self.damping * w1;
        out[3] = num2 / (l2 * den) - self.damping * w2;
    }
}

impl ChaoticFlow for DoublePendulum {
    type State = [f64; 4];
    type Update = DoublePendulumUpdate;

    const KIND: SystemKind = SystemKind::DoublePendulum;
    const PARAM_NAMES: &'static [&'static str] = &["m1", "m2", "l1", "l2", "g", "damping"];

    fn merge(&mut self, update: DoublePendulumUpdate) {
        let fields = [
            (&mut self.m1, update.m1),
            (&mut self.m2, update.m2),
            (&mut self.l1, update.l1),
            (&mut self.l2, update.l2),
            (&mut self.g, update.g),
            (&mut self.damping, update.damping),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<(), ChaosError> {
        let field = match name {
            "m1" => &mut self.m1,
            "m2" => &mut self.m2,
            "l1" => &mut self.l1,
            "l2" => &mut self.l2,
            "g" => &mut self.g,
            "damping" => &mut self.damping,
            _ => {
                return Err(ChaosError::UnknownParameter {
                    system: Self::KIND.name(),
                    name: name.to_string(),
                })
            }
        };
        *field = value;
        Ok(())
    }

    fn param_values(&self) -> Vec<f64> {
        vec![self.m1, self.m2, self.l1, self.l2, self.g, self.damping]
    }

    fn canonical_state() -> [f64; 4] {
        [FRAC_PI_2, FRAC_PI_2, 0.0, 0.0]
    }

    fn state_from_slice(values: &[f64]) -> Option<[f64; 4]> {
        values.try_into().ok()
    }

    fn default_settings() -> EngineSettings {
        EngineSettings::default()
            .with_base_dt(0.005)
            .with_renorm_interval(20)
    }

    fn tangent(&self, state: &[f64], v: &[f64], out: &mut [f64]) {
        let mut base = [0.0; 4];
        let mut shifted = [0.0; 4];
        for i in 0..4 {
            shifted[i] = state[i] + TANGENT_EPS * v[i];
        }
        self.apply(0.0, state, &mut base);
        self.apply(0.0, &shifted, out);
        for i in 0..4 {
            out[i] = (out[i] - base[i]) / TANGENT_EPS;
        }
    }

    /// Wrapped θ2 falls through zero from the upper half-turn. Transitions
    /// across the ±π seam are ignored. Records (wrapped θ1, ω1).
    fn crossing(&self, prev: &[f64], next: &[f64]) -> Option<Point2<f64>> {
        let before = wrap_angle(prev[1]);
        let after = wrap_angle(next[1]);
        if before > 0.0 && before < FRAC_PI_2 && after <= 0.0 && after > -FRAC_PI_2 {
            Some(Point2::new(wrap_angle(next[0]), next[2]))
        } else {
            None
        }
    }

    fn position(&self, state: &[f64]) -> Point3<f64> {
        let p2 = self.joints(state).p2;
        Point3::new(p2.x, p2.y, 0.0)
    }

    fn noise_scale(index: usize) -> f64 {
        if index >= 2 {
            3.0
        } else {
            1.0
        }
    }
}

/// Double pendulum simulation that also keeps both bob positions for every
/// trail point, trimmed in lockstep with the trail.
pub struct DoublePendulumSystem {
    sim: Simulation<DoublePendulum>,
    joints: VecDeque<Joints>,
}

impl DoublePendulumSystem {
    pub fn new(params: DoublePendulum, initial: [f64; 4]) -> Self {
        Self::with_settings(params, initial, DoublePendulum::default_settings())
    }

    pub fn with_settings(params: DoublePendulum, initial: [f64; 4], settings: EngineSettings) -> Self {
        let sim = Simulation::with_settings(params, initial, settings);
        let mut joints = VecDeque::new();
        joints.push_back(sim.params().joints(sim.state()));
        Self { sim, joints }
    }

    pub fn step(&mut self, speed: f64) -> Point3<f64> {
        let position = self.sim.step(speed);
        self.joints
            .push_back(self.sim.params().joints(self.sim.state()));
        self.sync_joints();
        position
    }

    pub fn reset(&mut self, initial: [f64; 4]) {
        self.sim.reset(initial);
        self.joints.clear();
        self.joints
            .push_back(self.sim.params().joints(self.sim.state()));
    }

    pub fn update_params(&mut self, update: DoublePendulumUpdate) {
        self.sim.update_params(update);
    }

    pub fn set_param(&mut self, name: &str, value: f64) -> Result<(), ChaosError> {
        self.sim.set_param(name, value)
    }

    pub fn trim_trail(&mut self, max_len: usize) {
        self.sim.trim_trail(max_len);
        self.sync_joints();
    }

    pub fn perturb(&mut self, amount: f64) {
        self.sim.perturb(amount);
    }

    pub fn speed(&self) -> f64 {
        self.sim.speed()
    }

    pub fn params(&self) -> &DoublePendulum {
        self.sim.params()
    }

    pub fn state(&self) -> &[f64; 4] {
        self.sim.state()
    }

    pub fn position(&self) -> Point3<f64> {
        self.sim.position()
    }

    pub fn trail(&self) -> &VecDeque<Point3<f64>> {
        self.sim.trail()
    }

    pub fn joints(&self) -> &VecDeque<Joints> {
        &self.joints
    }

    pub fn lyapunov_exponent(&self) -> f64 {
        self.sim.lyapunov_exponent()
    }

    pub fn poincare_points(&self) -> &VecDeque<Point2<f64>> {
        self.sim.poincare_points()
    }

    pub fn recoveries(&self) -> u64 {
        self.sim.recoveries()
    }

    pub fn total_energy(&self) -> f64 {
        self.sim.params().total_energy(self.sim.state())
    }

    fn sync_joints(&mut self) {
        let excess = self.joints.len().saturating_sub(self.sim.trail().len());
        self.joints.drain(..excess);
    }
}

impl Default for DoublePendulumSystem {
    fn default() -> Self {
        Self::new(DoublePendulum::default(), DoublePendulum::canonical_state())
    }
}

impl ChaoticSystem for DoublePendulumSystem {
    fn kind(&self) -> SystemKind {
        SystemKind::DoublePendulum
    }

    fn step(&mut self, speed: f64) -> Point3<f64> {
        DoublePendulumSystem::step(self, speed)
    }

    fn reset_state(&mut self, initial: &[f64]) -> Result<(), ChaosError> {
        let state = DoublePendulum::state_from_slice(initial).ok_or(
            ChaosError::DimensionMismatch {
                expected: 4,
                actual: initial.len(),
            },
        )?;
        DoublePendulumSystem::reset(self, state);
        Ok(())
    }

    fn update_param(&mut self, name: &str, value: f64) -> Result<(), ChaosError> {
        self.set_param(name, value)
    }

    fn trim_trail(&mut self, max_len: usize) {
        DoublePendulumSystem::trim_trail(self, max_len)
    }

    fn perturb(&mut self, amount: f64) {
        DoublePendulumSystem::perturb(self, amount)
    }

    fn speed(&self) -> f64 {
        DoublePendulumSystem::speed(self)
    }

    fn state(&self) -> &[f64] {
        self.sim.state().as_slice()
    }

    fn param_names(&self) -> &'static [&'static str] {
        DoublePendulum::PARAM_NAMES
    }

    fn param_values(&self) -> Vec<f64> {
        self.sim.params().param_values()
    }

    fn position(&self) -> Point3<f64> {
        DoublePendulumSystem::position(self)
    }

    fn trail(&self) -> &VecDeque<Point3<f64>> {
        DoublePendulumSystem::trail(self)
    }

    fn lyapunov_exponent(&self) -> f64 {
        DoublePendulumSystem::lyapunov_exponent(self)
    }

    fn poincare_points(&self) -> &VecDeque<Point2<f64>> {
        DoublePendulumSystem::poincare_points(self)
    }

    fn recoveries(&self) -> u64 {
        DoublePendulumSystem::recoveries(self)
    }

    fn settings(&self) -> &EngineSettings {
        self.sim.settings()
    }

    fn joints(&self) -> Option<&VecDeque<Joints>> {
        Some(&self.joints)
    }
}

#[cfg(test)]
mod tests {
    use super::{wrap_angle, DoublePendulum, DoublePendulumSystem, DoublePendulumUpdate};
    use crate::config::EngineSettings;
    use crate::systems::state_distance;
    use crate::traits::{ChaoticFlow, DynamicalSystem};
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn hanging_at_rest_is_an_equilibrium() {
        let pendulum = DoublePendulum::default();
        let mut out = [1.0; 4];
        pendulum.apply(0.0, &[0.0, 0.0, 0.0, 0.0], &mut out);
        assert_eq!(out, [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn damping_opposes_angular_velocity() {
        let free = DoublePendulum::default();
        let damped = DoublePendulum {
            damping: 0.5,
            ..DoublePendulum::default()
        };
        let state = [0.3, -0.2, 1.0, -2.0];
        let mut a = [0.0; 4];
        let mut b = [0.0; 4];
        free.apply(0.0, &state, &mut a);
        damped.apply(0.0, &state, &mut b);
        assert!((a[2] - b[2] - 0.5).abs() < 1e-12);
        assert!((a[3] - b[3] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn finite_difference_tangent_matches_small_angle_linearization() {
        // Near the bottom with unit masses and lengths the linearized
        // accelerations are (-2g θ1 + g θ2, 2g θ1 - 2g θ2).
        let pendulum = DoublePendulum::default();
        let g = pendulum.g;
        let mut out = [0.0; 4];
        pendulum.tangent(&[0.0, 0.0, 0.0, 0.0], &[1.0, 0.0, 0.0, 0.0], &mut out);
        assert!((out[2] + 2.0 * g).abs() < 1e-3);
        assert!((out[3] - 2.0 * g).abs() < 1e-3);

        pendulum.tangent(&[0.0, 0.0, 0.0, 0.0], &[0.0, 0.0, 1.0, 0.0], &mut out);
        assert!((out[0] - 1.0).abs() < 1e-9);
        assert!(out[2].abs() < 1e-3);
    }

    #[test]
    fn joints_follow_arm_geometry() {
        let pendulum = DoublePendulum {
            l1: 2.0,
            l2: 0.5,
            ..DoublePendulum::default()
        };
        let joints = pendulum.joints(&[FRAC_PI_2, 0.0, 0.0, 0.0]);
        assert!((joints.p1.x - 2.0).abs() < 1e-12);
        assert!(joints.p1.y.abs() < 1e-12);
        assert!((joints.p2.x - 2.0).abs() < 1e-12);
        assert!((joints.p2.y + 0.5).abs() < 1e-12);

        let position = pendulum.position(&[FRAC_PI_2, 0.0, 0.0, 0.0]);
        assert_eq!(position.z, 0.0);
        assert!((position.x - joints.p2.x).abs() < 1e-12);
    }

    #[test]
    fn wrap_angle_lands_in_half_open_interval() {
        assert!((wrap_angle(3.0 * PI / 2.0) + FRAC_PI_2).abs() < 1e-12);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(7.0 * PI + 0.1) - (-PI + 0.1)).abs() < 1e-9);
        assert!((wrap_angle(0.25) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn crossing_ignores_the_seam() {
        let pendulum = DoublePendulum::default();
        let hit = pendulum
            .crossing(&[0.1, 0.05, 1.5, 0.0], &[0.2, -0.05, 1.6, 0.0])
            .expect("downward crossing");
        assert!((hit.x - 0.2).abs() < 1e-12);
        assert!((hit.y - 1.6).abs() < 1e-12);

        assert!(pendulum
            .crossing(&[0.0, PI - 0.01, 0.0, 0.0], &[0.0, PI + 0.01, 0.0, 0.0])
            .is_none());
        assert!(pendulum
            .crossing(&[0.0, -0.05, 0.0, 0.0], &[0.0, 0.05, 0.0, 0.0])
            .is_none());
    }

    #[test]
    fn crossing_uses_wrapped_angles() {
        let pendulum = DoublePendulum::default();
        let turns = 4.0 * PI;
        assert!(pendulum
            .crossing(&[0.0, turns + 0.05, 0.0, 0.0], &[0.0, turns - 0.05, 0.0, 0.0])
            .is_some());
    }

    #[test]
    fn joints_stay_in_lockstep_with_trail() {
        let settings = DoublePendulum::default_settings().with_max_trail_len(40);
        let mut system = DoublePendulumSystem::with_settings(
            DoublePendulum::default(),
            DoublePendulum::canonical_state(),
            settings,
        );
        assert_eq!(system.joints().len(), 1);
        for _ in 0..100 {
            system.step(1.0);
            assert_eq!(system.joints().len(), system.trail().len());
        }
        system.trim_trail(7);
        assert_eq!(system.trail().len(), 7);
        assert_eq!(system.joints().len(), 7);
        let last_joint = system.joints().back().copied().expect("joint");
        let last_point = system.trail().back().copied().expect("point");
        assert!((last_joint.p2.x - last_point.x).abs() < 1e-12);
        assert!((last_joint.p2.y - last_point.y).abs() < 1e-12);

        system.reset([0.1, 0.2, 0.0, 0.0]);
        assert_eq!(system.joints().len(), 1);
        assert_eq!(system.trail().len(), 1);
    }

    #[test]
    fn undamped_motion_roughly_conserves_energy() {
        let mut system = DoublePendulumSystem::default();
        let initial = system.total_energy();
        for _ in 0..4000 {
            system.step(1.0);
        }
        assert!((system.total_energy() - initial).abs() < 1e-2 * initial.abs().max(1.0));
    }

    #[test]
    fn damping_drains_energy() {
        let mut system = DoublePendulumSystem::default();
        system.update_params(DoublePendulumUpdate {
            damping: Some(0.5),
            ..DoublePendulumUpdate::default()
        });
        let initial = system.total_energy();
        for _ in 0..4000 {
            system.step(1.0);
        }
        assert!(system.total_energy() < initial);
    }

    #[test]
    fn twins_separate_by_more_than_unit_distance() {
        let initial = DoublePendulum::canonical_state();
        let mut nudged = initial;
        nudged[0] += 1e-6;
        let mut a = DoublePendulumSystem::new(DoublePendulum::default(), initial);
        let mut b = DoublePendulumSystem::new(DoublePendulum::default(), nudged);
        for _ in 0..20_000 {
            a.step(1.0);
            b.step(1.0);
        }
        assert!(state_distance(a.state(), b.state()) > 1.0);
    }

    #[test]
    fn chaotic_swing_has_positive_exponent() {
        let mut system = DoublePendulumSystem::default();
        for _ in 0..20_000 {
            system.step(1.0);
        }
        assert!(system.lyapunov_exponent() > 0.0);
    }

    #[test]
    fn perturb_favours_angular_velocities() {
        let mut angle_moves = 0.0;
        let mut velocity_moves = 0.0;
        for seed in 0..50 {
            let mut system = DoublePendulumSystem::with_settings(
                DoublePendulum::default(),
                [0.0; 4],
                EngineSettings::default().with_seed(seed),
            );
            system.perturb(0.1);
            let state = *system.state();
            angle_moves += state[0].abs() + state[1].abs();
            velocity_moves += state[2].abs() + state[3].abs();
        }
        assert!(velocity_moves > angle_moves);
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let mut system = DoublePendulumSystem::default();
        system.set_param("l2", 1.5).expect("known parameter");
        assert_eq!(system.params().l2, 1.5);
        let err = system.set_param("length", 1.0).expect_err("unknown");
        assert_eq!(
            err.to_string(),
            "Unknown parameter 'length' for double_pendulum."
        );
    }
}
