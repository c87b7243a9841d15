use tracing::warn;

/// Detects numerical divergence and swaps the state for a safe one in place.
#[derive(Debug, Clone)]
pub struct StabilityGuard {
    threshold: f64,
    recoveries: u64,
}

impl StabilityGuard {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            recoveries: 0,
        }
    }

    pub fn is_diverged(&self, state: &[f64]) -> bool {
        state
            .iter()
            .any(|value| !value.is_finite() || value.abs() > self.threshold)
    }

    /// Replaces `state` with `safe` if it has diverged. Returns whether a
    /// recovery happened.
    pub fn check(&mut self, system: &'static str, state: &mut [f64], safe: &[f64]) -> bool {
        if !self.is_diverged(state) {
            return false;
        }
        warn!(
            system,
            state = ?state,
            threshold = self.threshold,
            "state diverged, restoring safe state"
        );
        state.copy_from_slice(safe);
        self.recoveries += 1;
        true
    }

    pub fn recoveries(&self) -> u64 {
        self.recoveries
    }
}
