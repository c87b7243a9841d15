//! Largest Lyapunov exponent estimation by tangent-vector co-evolution.
//!
//! A single tangent vector is advanced alongside the trajectory with an
//! explicit Euler step of the linearized dynamics. Every `interval` steps its
//! norm is folded into a running log sum and the vector is rescaled to unit
//! length, so the estimate never overflows regardless of how long it runs.
//!
//! By default each renormalization is credited `interval * base_dt` of time,
//! so the exponent reads `log_sum / (renormalizations * interval * base_dt)`.
//! [`LyapunovTimeBase::Elapsed`] credits the `dt` actually integrated instead.

use crate::config::LyapunovTimeBase;
use crate::solvers::euler_update;
use crate::traits::ChaoticFlow;

#[derive(Debug, Clone)]
pub struct LyapunovEstimator {
    tangent: Vec<f64>,
    rate: Vec<f64>,
    interval: usize,
    base_dt: f64,
    time_base: LyapunovTimeBase,
    since_renorm: usize,
    pending_time: f64,
    elapsed_time: f64,
    log_sum: f64,
    renormalizations: u64,
    exponent: f64,
}

impl LyapunovEstimator {
    pub fn new(dim: usize, interval: usize, base_dt: f64, time_base: LyapunovTimeBase) -> Self {
        Self {
            tangent: unit_seed(dim),
            rate: vec![0.0; dim],
            interval: interval.max(1),
            base_dt,
            time_base,
            since_renorm: 0,
            pending_time: 0.0,
            elapsed_time: 0.0,
            log_sum: 0.0,
            renormalizations: 0,
            exponent: 0.0,
        }
    }

    /// Advances the tangent vector by one step of size `dt` at `state`
    /// (the state reached at the end of the step) and renormalizes when due.
    pub fn advance<M: ChaoticFlow>(&mut self, model: &M, state: &[f64], dt: f64) {
        model.tangent(state, &self.tangent, &mut self.rate);
        euler_update(&mut self.tangent, &self.rate, dt);
        self.since_renorm += 1;
        self.pending_time += dt;

        if self.since_renorm >= self.interval {
            self.renormalize();
        }
    }

    fn renormalize(&mut self) {
        let norm = self.tangent.iter().map(|v| v * v).sum::<f64>().sqrt();
        let elapsed = self.pending_time;
        self.since_renorm = 0;
        self.pending_time = 0.0;

        if !norm.is_finite() || norm <= f64::MIN_POSITIVE {
            self.tangent = unit_seed(self.tangent.len());
            return;
        }

        for value in &mut self.tangent {
            *value /= norm;
        }
        let window = match self.time_base {
            LyapunovTimeBase::Nominal => self.interval as f64 * self.base_dt,
            LyapunovTimeBase::Elapsed => elapsed,
        };
        if window <= 0.0 {
            return;
        }
        self.log_sum += norm.ln();
        self.elapsed_time += elapsed;
        self.renormalizations += 1;
        self.exponent = self.log_sum / self.measured_time();
    }

    /// Restarts the tangent direction without touching the accumulated sums.
    /// Used after the state jumped discontinuously.
    pub fn reseed_tangent(&mut self) {
        self.tangent = unit_seed(self.tangent.len());
        self.since_renorm = 0;
        self.pending_time = 0.0;
    }

    pub fn reset(&mut self) {
        *self = Self::new(
            self.tangent.len(),
            self.interval,
            self.base_dt,
            self.time_base,
        );
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    pub fn renormalizations(&self) -> u64 {
        self.renormalizations
    }

    /// Time the log sum is divided by under the configured time base.
    pub fn measured_time(&self) -> f64 {
        match self.time_base {
            LyapunovTimeBase::Nominal => {
                self.renormalizations as f64 * self.interval as f64 * self.base_dt
            }
            LyapunovTimeBase::Elapsed => self.elapsed_time,
        }
    }
}

fn unit_seed(dim: usize) -> Vec<f64> {
    let component = 1.0 / (dim.max(1) as f64).sqrt();
    vec![component; dim]
}
