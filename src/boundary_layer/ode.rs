//! Fixed-step RK4 used by both boundary-layer marchers.

/// dy/dx = f(x, y)
pub trait OdeSystem {
    type State: Copy + StateAddMul;

    fn rhs(&self, x: f64, state: &Self::State) -> Self::State;
}

/// state + scalar * other
pub trait StateAddMul {
    fn add_mul(&self, other: &Self, scalar: f64) -> Self;
}

impl StateAddMul for f64 {
    #[inline(always)]
    fn add_mul(&self, other: &Self, scalar: f64) -> Self {
        self + other * scalar
    }
}

impl StateAddMul for [f64; 2] {
    #[inline(always)]
    fn add_mul(&self, other: &Self, scalar: f64) -> Self {
        [self[0] + other[0] * scalar, self[1] + other[1] * scalar]
    }
}

/// One classic RK4 step of size `h` from `x`.
pub fn rk4_step<S: OdeSystem>(system: &S, x: f64, h: f64, state: S::State) -> S::State {
    let h2 = 0.5 * h;

    let k1 = system.rhs(x, &state);
    let k2 = system.rhs(x + h2, &state.add_mul(&k1, h2));
    let k3 = system.rhs(x + h2, &state.add_mul(&k2, h2));
    let k4 = system.rhs(x + h, &state.add_mul(&k3, h));

    let sum = k1.add_mul(&k2, 2.0).add_mul(&k3, 2.0).add_mul(&k4, 1.0);
    state.add_mul(&sum, h / 6.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Decay;

    impl OdeSystem for Decay {
        type State = f64;

        fn rhs(&self, _x: f64, y: &f64) -> f64 {
            -y
        }
    }

    struct Oscillator;

    impl OdeSystem for Oscillator {
        type State = [f64; 2];

        fn rhs(&self, _x: f64, y: &[f64; 2]) -> [f64; 2] {
            [y[1], -y[0]]
        }
    }

    #[test]
    fn exponential_decay() {
        let mut y = 1.0;
        let h = 0.01;
        for i in 0..100 {
            y = rk4_step(&Decay, i as f64 * h, h, y);
        }
        assert_relative_eq!(y, (-1.0f64).exp(), max_relative = 1e-9);
    }

    #[test]
    fn harmonic_oscillator_quarter_period() {
        let mut y = [1.0, 0.0];
        let steps = 200;
        let h = std::f64::consts::FRAC_PI_2 / steps as f64;
        for i in 0..steps {
            y = rk4_step(&Oscillator, i as f64 * h, h, y);
        }
        assert!(y[0].abs() < 1e-9);
        assert_relative_eq!(y[1], -1.0, max_relative = 1e-9);
    }

    #[test]
    fn polynomial_integrand_is_exact() {
        // RK4 integrates cubics in x exactly
        struct Cubic;
        impl OdeSystem for Cubic {
            type State = f64;
            fn rhs(&self, x: f64, _y: &f64) -> f64 {
                x * x * x
            }
        }
        let y = rk4_step(&Cubic, 0.0, 2.0, 0.0);
        assert_relative_eq!(y, 4.0, max_relative = 1e-14);
    }
}
