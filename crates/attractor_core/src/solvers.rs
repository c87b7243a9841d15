use crate::traits::{DynamicalSystem, Scalar, Steppable};

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![T::zero(); dim],
            k2: vec![T::zero(); dim],
            k3: vec![T::zero(); dim],
            k4: vec![T::zero(); dim],
            tmp: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let two = T::one() + T::one();
        let half = T::one() / two;
        let sixth = T::one() / (two + two + two);

        let t0 = *t;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

/// Single explicit Euler update `v += dt * dv`, used for the tangent dynamics.
pub fn euler_update(v: &mut [f64], dv: &[f64], dt: f64) {
    for (value, rate) in v.iter_mut().zip(dv) {
        *value += dt * rate;
    }
}

#[cfg(test)]
mod tests {
    use super::{euler_update, RK4};
    use crate::traits::{DynamicalSystem, Steppable};

    struct Decay {
        rate: f64,
    }

    impl DynamicalSystem<f64> for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -self.rate * x[0];
        }
    }

    struct Rotation;

    impl DynamicalSystem<f64> for Rotation {
        fn dimension(&self) -> usize {
            2
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -x[1];
            out[1] = x[0];
        }
    }

    #[test]
    fn rk4_matches_exponential_decay() {
        let system = Decay { rate: 1.5 };
        let mut solver = RK4::new(1);
        let mut t = 0.0;
        let mut state = [2.0];
        for _ in 0..100 {
            solver.step(&system, &mut t, &mut state, 0.01);
        }
        let expected = 2.0 * (-1.5_f64).exp();
        assert!((state[0] - expected).abs() < 1e-9);
        assert!((t - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rk4_preserves_rotation_radius() {
        let mut solver = RK4::new(2);
        let mut t = 0.0;
        let mut state = [1.0, 0.0];
        for _ in 0..628 {
            solver.step(&Rotation, &mut t, &mut state, 0.01);
        }
        let radius = (state[0] * state[0] + state[1] * state[1]).sqrt();
        assert!((radius - 1.0).abs() < 1e-8);
        assert!((state[0] - 1.0).abs() < 1e-2);
    }

    #[test]
    fn zero_step_leaves_state_untouched() {
        let mut solver = RK4::new(2);
        let mut t = 3.0;
        let mut state = [0.25, -0.5];
        solver.step(&Rotation, &mut t, &mut state, 0.0);
        assert_eq!(state, [0.25, -0.5]);
        assert_eq!(t, 3.0);
    }

    #[test]
    fn euler_update_scales_rate_by_dt() {
        let mut v = [1.0, 2.0, 3.0];
        euler_update(&mut v, &[10.0, 0.0, -10.0], 0.1);
        assert!((v[0] - 2.0).abs() < 1e-12);
        assert_eq!(v[1], 2.0);
        assert!((v[2] - 2.0).abs() < 1e-12);
    }
}
