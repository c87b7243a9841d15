use crate::config::EngineSettings;
use crate::error::ChaosError;
use crate::systems::{Joints, SystemKind};
use nalgebra::{Point2, Point3};
use num_traits::{Float, FromPrimitive};
use std::collections::VecDeque;
use std::fmt::Debug;

/// A trait for types that can be used as scalars in our dynamical systems.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Represents a continuous-time dynamical system.
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// x: current state
    /// t: current time
    /// out: buffer to write dx/dt
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// A trait for solvers that can step a system forward.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// state: current state (updated after step)
    /// dt: step size
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}

/// A chaotic flow: the vector field plus everything the simulation scaffolding
/// needs to know about one concrete system.
///
/// The implementing type doubles as the parameter set, so `params()` on a
/// simulation hands back the model itself.
pub trait ChaoticFlow: DynamicalSystem<f64> + Clone + Debug {
    /// Native phase-space vector.
    type State: Copy + Debug + PartialEq + AsRef<[f64]> + AsMut<[f64]>;

    /// Partial parameter update; `None` fields keep their current value.
    type Update: Default + Debug;

    const KIND: SystemKind;

    /// Names accepted by [`ChaoticFlow::set_param`], in the order of
    /// [`ChaoticFlow::param_values`].
    const PARAM_NAMES: &'static [&'static str];

    fn merge(&mut self, update: Self::Update);

    fn set_param(&mut self, name: &str, value: f64) -> Result<(), ChaosError>;

    fn param_values(&self) -> Vec<f64>;

    /// Default initial condition, also used as the recovery target after a
    /// divergence.
    fn canonical_state() -> Self::State;

    fn state_from_slice(values: &[f64]) -> Option<Self::State>;

    fn default_settings() -> EngineSettings;

    /// Writes the Jacobian-vector product `J(state) * v` into `out`.
    fn tangent(&self, state: &[f64], v: &[f64], out: &mut [f64]);

    /// Tests the transition `prev -> next` against the system's Poincaré
    /// surface and returns the recorded pair on a qualifying crossing.
    fn crossing(&self, prev: &[f64], next: &[f64]) -> Option<Point2<f64>>;

    /// Cartesian position appended to the trail.
    fn position(&self, state: &[f64]) -> Point3<f64>;

    /// Relative noise scale for component `index` of the state.
    fn noise_scale(_index: usize) -> f64 {
        1.0
    }
}

/// The capability surface shared by every simulated system, object safe so the
/// control layer can hold any of them behind one handle.
pub trait ChaoticSystem {
    fn kind(&self) -> SystemKind;

    fn step(&mut self, speed: f64) -> Point3<f64>;

    /// Reinitializes from a dynamically sized state.
    fn reset_state(&mut self, initial: &[f64]) -> Result<(), ChaosError>;

    fn update_param(&mut self, name: &str, value: f64) -> Result<(), ChaosError>;

    fn trim_trail(&mut self, max_len: usize);

    fn perturb(&mut self, amount: f64);

    fn speed(&self) -> f64;

    fn state(&self) -> &[f64];

    fn param_names(&self) -> &'static [&'static str];

    fn param_values(&self) -> Vec<f64>;

    fn position(&self) -> Point3<f64>;

    fn trail(&self) -> &VecDeque<Point3<f64>>;

    fn lyapunov_exponent(&self) -> f64;

    fn poincare_points(&self) -> &VecDeque<Point2<f64>>;

    /// Number of divergences silently recovered since construction.
    fn recoveries(&self) -> u64;

    fn settings(&self) -> &EngineSettings;

    /// Pendulum arm joints, parallel to the trail.
    fn joints(&self) -> Option<&VecDeque<Joints>> {
        None
    }
}
