use nalgebra::Point3;
use std::collections::VecDeque;

/// Bounded trajectory buffer. Points are kept in insertion order and only ever
/// removed from the front.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<Point3<f64>>,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Appends a point, dropping from the front past capacity. Returns how
    /// many points were dropped so parallel sequences can follow along.
    pub fn push(&mut self, point: Point3<f64>) -> usize {
        self.points.push_back(point);
        let overflow = self.points.len().saturating_sub(self.capacity);
        self.points.drain(..overflow);
        overflow
    }

    /// Keeps only the most recent `max_len` points. Returns the number removed.
    pub fn trim(&mut self, max_len: usize) -> usize {
        let excess = self.points.len().saturating_sub(max_len);
        self.points.drain(..excess);
        excess
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&Point3<f64>> {
        self.points.back()
    }

    pub fn points(&self) -> &VecDeque<Point3<f64>> {
        &self.points
    }

    /// Distance covered by the most recent step, 0 with fewer than two points.
    pub fn speed(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        nalgebra::distance(&self.points[n - 2], &self.points[n - 1])
    }
}
