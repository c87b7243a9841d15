use serde::{Deserialize, Serialize};

/// Numerical and bookkeeping knobs for one simulated system.
///
/// Every concrete system provides its own defaults through
/// [`crate::traits::ChaoticFlow::default_settings`]; `Default` here carries the
/// values shared by all of them and the attractor step size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Integration step at unit speed.
    pub base_dt: f64,
    /// Steps between tangent renormalizations.
    pub renorm_interval: usize,
    /// Largest state magnitude accepted before the guard resets the state.
    pub divergence_threshold: f64,
    /// Hard cap on the trail; older points drop off the front.
    pub max_trail_len: usize,
    /// Hard cap on recorded Poincaré points.
    pub poincare_capacity: usize,
    /// Steps after a reset before section crossings are recorded.
    pub warmup_steps: usize,
    /// Seed for the perturbation noise generator.
    pub seed: u64,
    /// Time base the Lyapunov log sum is divided by.
    pub lyapunov_time_base: LyapunovTimeBase,
}

/// How the Lyapunov estimator measures the time a renormalization covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LyapunovTimeBase {
    /// Every renormalization counts as `renorm_interval * base_dt`,
    /// whatever speed the steps were taken at.
    #[default]
    Nominal,
    /// Sum of the `dt` actually integrated. Windows in which no time elapsed
    /// are not counted.
    Elapsed,
}

pub const DEFAULT_DIVERGENCE_THRESHOLD: f64 = 1e6;
pub const DEFAULT_POINCARE_CAPACITY: usize = 5000;
pub const DEFAULT_WARMUP_STEPS: usize = 100;
pub const DEFAULT_MAX_TRAIL_LEN: usize = 10_000;

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_dt: 0.01,
            renorm_interval: 10,
            divergence_threshold: DEFAULT_DIVERGENCE_THRESHOLD,
            max_trail_len: DEFAULT_MAX_TRAIL_LEN,
            poincare_capacity: DEFAULT_POINCARE_CAPACITY,
            warmup_steps: DEFAULT_WARMUP_STEPS,
            seed: 0x5eed_c4a0,
            lyapunov_time_base: LyapunovTimeBase::Nominal,
        }
    }
}

impl EngineSettings {
    pub fn with_base_dt(mut self, base_dt: f64) -> Self {
        self.base_dt = base_dt;
        self
    }

    pub fn with_renorm_interval(mut self, interval: usize) -> Self {
        self.renorm_interval = interval;
        self
    }

    pub fn with_max_trail_len(mut self, max_trail_len: usize) -> Self {
        self.max_trail_len = max_trail_len;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_lyapunov_time_base(mut self, time_base: LyapunovTimeBase) -> Self {
        self.lyapunov_time_base = time_base;
        self
    }

    /// Clamps values that would break the step loop (zero intervals, zero
    /// capacities, non-finite step sizes) back to usable ones.
    pub fn sanitized(mut self) -> Self {
        let fallback = Self::default();
        if !self.base_dt.is_finite() || self.base_dt <= 0.0 {
            self.base_dt = fallback.base_dt;
        }
        if !self.divergence_threshold.is_finite() || self.divergence_threshold <= 0.0 {
            self.divergence_threshold = fallback.divergence_threshold;
        }
        self.renorm_interval = self.renorm_interval.max(1);
        self.max_trail_len = self.max_trail_len.max(2);
        self
    }
}
