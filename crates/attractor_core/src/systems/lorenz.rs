use crate::config::EngineSettings;
use crate::error::ChaosError;
use crate::simulation::Simulation;
use crate::systems::SystemKind;
use crate::traits::{ChaoticFlow, DynamicalSystem};
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Lorenz system parameters. Defaults are the classic chaotic values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lorenz {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
}

impl Default for Lorenz {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LorenzUpdate {
    pub sigma: Option<f64>,
    pub rho: Option<f64>,
    pub beta: Option<f64>,
}

pub type LorenzSystem = Simulation<Lorenz>;

impl Lorenz {
    fn z_rate(&self, state: &[f64]) -> f64 {
        state[0] * state[1] - self.beta * state[2]
    }
}

impl DynamicalSystem<f64> for Lorenz {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        out[0] = self.sigma * (x[1] - x[0]);
        out[1] = x[0] * (self.rho - x[2]) - x[1];
        out[2] = self.z_rate(x);
    }
}

impl ChaoticFlow for Lorenz {
    type State = [f64; 3];
    type Update = LorenzUpdate;

    const KIND: SystemKind = SystemKind::Lorenz;
    const PARAM_NAMES: &'static [&'static str] = &["sigma", "rho", "beta"];

    fn merge(&mut self, update: LorenzUpdate) {
        if let Some(sigma) = update.sigma {
            self.sigma = sigma;
        }
        if let Some(rho) = update.rho {
            self.rho = rho;
        }
        if let Some(beta) = update.beta {
            self.beta = beta;
        }
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<(), ChaosError> {
        match name {
            "sigma" => self.sigma = value,
            "rho" => self.rho = value,
            "beta" => self.beta = value,
            _ => {
                return Err(ChaosError::UnknownParameter {
                    system: Self::KIND.name(),
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }

    fn param_values(&self) -> Vec<f64> {
        vec![self.sigma, self.rho, self.beta]
    }

    fn canonical_state() -> [f64; 3] {
        [1.0, 1.0, 1.0]
    }

    fn state_from_slice(values: &[f64]) -> Option<[f64; 3]> {
        values.try_into().ok()
    }

    fn default_settings() -> EngineSettings {
        EngineSettings::default()
            .with_base_dt(0.01)
            .with_renorm_interval(10)
    }

    fn tangent(&self, state: &[f64], v: &[f64], out: &mut [f64]) {
        let (x, y, z) = (state[0], state[1], state[2]);
        out[0] = self.sigma * (v[1] - v[0]);
        out[1] = (self.rho - z) * v[0] - v[1] - x * v[2];
        out[2] = y * v[0] + x * v[1] - self.beta * v[2];
    }

    /// Local maxima of z: the z rate changes sign from positive to
    /// non-positive. Records (x, y).
    fn crossing(&self, prev: &[f64], next: &[f64]) -> Option<Point2<f64>> {
        if self.z_rate(prev) > 0.0 && self.z_rate(next) <= 0.0 {
            Some(Point2::new(next[0], next[1]))
        } else {
            None
        }
    }

    fn position(&self, state: &[f64]) -> Point3<f64> {
        Point3::new(state[0], state[1], state[2])
    }
}
