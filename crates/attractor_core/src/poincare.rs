use nalgebra::Point2;
use std::collections::VecDeque;

/// Collects Poincaré-section crossings into a front-trimmed, capped sequence.
///
/// The crossing test itself belongs to each system
/// ([`crate::traits::ChaoticFlow::crossing`]); the sampler only owns warm-up and
/// storage.
#[derive(Debug, Clone)]
pub struct PoincareSampler {
    points: VecDeque<Point2<f64>>,
    capacity: usize,
    warmup_steps: usize,
    steps_since_reset: usize,
}

impl PoincareSampler {
    pub fn new(capacity: usize, warmup_steps: usize) -> Self {
        Self {
            points: VecDeque::new(),
            capacity,
            warmup_steps,
            steps_since_reset: 0,
        }
    }

    /// Counts one integration step. Crossings are only accepted once more than
    /// `warmup_steps` steps have been taken since the last reset.
    pub fn tick(&mut self) {
        self.steps_since_reset = self.steps_since_reset.saturating_add(1);
    }

    pub fn is_warm(&self) -> bool {
        self.steps_since_reset > self.warmup_steps
    }

    /// Records a crossing if warm-up has passed. Returns whether it was kept.
    pub fn record(&mut self, point: Point2<f64>) -> bool {
        if !self.is_warm() || self.capacity == 0 {
            return false;
        }
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
        true
    }

    pub fn reset(&mut self) {
        self.points.clear();
        self.steps_since_reset = 0;
    }

    pub fn points(&self) -> &VecDeque<Point2<f64>> {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
