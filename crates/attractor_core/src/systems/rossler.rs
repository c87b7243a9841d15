use crate::config::EngineSettings;
use crate::error::ChaosError;
use crate::simulation::Simulation;
use crate::systems::SystemKind;
use crate::traits::{ChaoticFlow, DynamicalSystem};
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Rössler system parameters. `c` moves the system through its
/// period-doubling cascade: 3.5 is periodic, 5.7 chaotic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rossler {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for Rossler {
    fn default() -> Self {
        Self {
            a: 0.2,
            b: 0.2,
            c: 5.7,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosslerUpdate {
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub c: Option<f64>,
}

pub type RosslerSystem = Simulation<Rossler>;

impl DynamicalSystem<f64> for Rossler {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        out[0] = -x[1] - x[2];
        out[1] = x[0] + self.a * x[1];
        out[2] = self.b + x[2] * (x[0] - self.c);
    }
}

impl ChaoticFlow for Rossler {
    type State = [f64; 3];
    type Update = RosslerUpdate;

    const KIND: SystemKind = SystemKind::Rossler;
    const PARAM_NAMES: &'static [&'static str] = &["a", "b", "c"];

    fn merge(&mut self, update: RosslerUpdate) {
        if let Some(a) = update.a {
            self.a = a;
        }
        if let Some(b) = update.b {
            self.b = b;
        }
        if let Some(c) = update.c {
            self.c = c;
        }
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<(), ChaosError> {
        match name {
            "a" => self.a = value,
            "b" => self.b = value,
            "c" => self.c = value,
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
        vec![self.a, self.b, self.c]
    }

    fn canonical_state() -> [f64; 3] {
        [1.0, 1.0, 1.0]
    }

    fn state_from_slice(values: &[f64]) -> Option<[f64; 3]> {
        values.try_into().ok()
    }

    fn default_settings() -> EngineSettings {
        EngineSettings::default()
            .with_base_dt(0.03)
            .with_renorm_interval(10)
    }

    fn tangent(&self, state: &[f64], v: &[f64], out: &mut [f64]) {
        let (x, z) = (state[0], state[2]);
        out[0] = -v[1] - v[2];
        out[1] = v[0] + self.a * v[1];
        out[2] = z * v[0] + (x - self.c) * v[2];
    }

    /// y = 0 crossed while ascending. Records (x, z).
    fn crossing(&self, prev: &[f64], next: &[f64]) -> Option<Point2<f64>> {
        if prev[1] < 0.0 && next[1] >= 0.0 {
            Some(Point2::new(next[0], next[2]))
        } else {
            None
        }
    }

    fn position(&self, state: &[f64]) -> Point3<f64> {
        Point3::new(state[0], state[1], state[2])
    }
}
