pub mod lorenz;
pub mod pendulum;
pub mod rossler;

pub use lorenz::{Lorenz, LorenzSystem, LorenzUpdate};
pub use pendulum::{DoublePendulum, DoublePendulumSystem, DoublePendulumUpdate, Joints};
pub use rossler::{Rossler, RosslerSystem, RosslerUpdate};

use crate::config::EngineSettings;
use crate::error::ChaosError;
use crate::simulation::Simulation;
use crate::traits::{ChaoticFlow, ChaoticSystem};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemKind {
    Lorenz,
    Rossler,
    DoublePendulum,
}

impl SystemKind {
    pub const ALL: [SystemKind; 3] = [
        SystemKind::Lorenz,
        SystemKind::Rossler,
        SystemKind::DoublePendulum,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            SystemKind::Lorenz => "lorenz",
            SystemKind::Rossler => "rossler",
            SystemKind::DoublePendulum => "double_pendulum",
        }
    }

    pub fn default_settings(self) -> EngineSettings {
        match self {
            SystemKind::Lorenz => Lorenz::default_settings(),
            SystemKind::Rossler => Rossler::default_settings(),
            SystemKind::DoublePendulum => DoublePendulum::default_settings(),
        }
    }
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SystemKind {
    type Err = ChaosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lorenz" => Ok(SystemKind::Lorenz),
            "rossler" | "rössler" => Ok(SystemKind::Rossler),
            "double_pendulum" | "doublependulum" | "pendulum" => Ok(SystemKind::DoublePendulum),
            _ => Err(ChaosError::UnknownSystemKind(s.to_string())),
        }
    }
}

pub type BoxedSystem = Box<dyn ChaoticSystem>;

/// Builds a system of the given kind with its canonical parameters and
/// initial state.
pub fn build_system(kind: SystemKind) -> BoxedSystem {
    build_system_with(kind, kind.default_settings())
}

pub fn build_system_with(kind: SystemKind, settings: EngineSettings) -> BoxedSystem {
    match kind {
        SystemKind::Lorenz => Box::new(Simulation::with_settings(
            Lorenz::default(),
            Lorenz::canonical_state(),
            settings,
        )),
        SystemKind::Rossler => Box::new(Simulation::with_settings(
            Rossler::default(),
            Rossler::canonical_state(),
            settings,
        )),
        SystemKind::DoublePendulum => Box::new(DoublePendulumSystem::with_settings(
            DoublePendulum::default(),
            DoublePendulum::canonical_state(),
            settings,
        )),
    }
}

/// Serializable view of a running system for the control layer. Carries no
/// internal accumulators beyond their summary values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub kind: SystemKind,
    pub state: Vec<f64>,
    pub params: Vec<(String, f64)>,
    pub lyapunov_exponent: f64,
    pub trail_len: usize,
    pub poincare_len: usize,
    pub recoveries: u64,
}

impl SystemSnapshot {
    pub fn capture(system: &dyn ChaoticSystem) -> Self {
        let params = system
            .param_names()
            .iter()
            .map(|name| name.to_string())
            .zip(system.param_values())
            .collect();
        Self {
            kind: system.kind(),
            state: system.state().to_vec(),
            params,
            lyapunov_exponent: system.lyapunov_exponent(),
            trail_len: system.trail().len(),
            poincare_len: system.poincare_points().len(),
            recoveries: system.recoveries(),
        }
    }
}

/// Euclidean distance between two states of the same dimension.
pub fn state_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
