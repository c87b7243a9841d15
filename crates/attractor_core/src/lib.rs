//! The `attractor_core` crate drives three canonical chaotic systems in real
//! time: a Lorenz attractor, a Rössler attractor and a damped double pendulum.
//!
//! Every call to `step` integrates one RK4 step, appends to a bounded trail,
//! co-evolves a tangent vector for the largest Lyapunov exponent and samples a
//! Poincaré section. Divergence never reaches the caller: a stability guard
//! swaps diverged states for a safe one and counts the recovery.
//!
//! Key components:
//! - **Traits**: `DynamicalSystem` (vector fields), `Steppable` (solvers),
//!   `ChaoticFlow` (per-system model) and `ChaoticSystem` (object-safe facade).
//! - **Simulation**: the shared step pipeline, generic over the model.
//! - **Systems**: `LorenzSystem`, `RosslerSystem`, `DoublePendulumSystem`.
//! - **Registry**: explicit handles and an active-system id for a control layer.

pub mod config;
pub mod error;
pub mod guard;
pub mod lyapunov;
pub mod poincare;
pub mod registry;
pub mod simulation;
pub mod solvers;
pub mod systems;
pub mod trail;
pub mod traits;

pub use config::{EngineSettings, LyapunovTimeBase};
pub use error::ChaosError;
pub use nalgebra::{Point2, Point3};
pub use registry::{SystemId, SystemRegistry};
pub use simulation::Simulation;
pub use systems::{
    build_system, build_system_with, BoxedSystem, DoublePendulum, DoublePendulumSystem, Joints,
    Lorenz, LorenzSystem, Rossler, RosslerSystem, SystemKind, SystemSnapshot,
};
pub use traits::{ChaoticFlow, ChaoticSystem};
