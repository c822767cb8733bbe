// 状態変数 p, \theta, v, \omega
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct State {
    pub p: f64,     // 台車の位置 [m]
    pub theta: f64, // 振子の角度 [rad], 0 = 倒立
    pub v: f64,     // 台車の速度 [m/s]
    pub omega: f64, // 振子の角速度 [rad/s]
}

// 入力 (台車に加える水平方向の力)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Input {
    pub f: f64,
}

impl State {
    pub const SIZE: usize = 4;

    pub fn new(p: f64, theta: f64, v: f64, omega: f64) -> Self {
        Self {
            p,
            theta,
            v,
            omega,
        }
    }

    pub fn theta_deg(&self) -> f64 {
        self.theta.to_degrees()
    }

    pub fn omega_deg(&self) -> f64 {
        self.omega.to_degrees()
    }

    pub fn is_finite(&self) -> bool {
        self.p.is_finite() && self.theta.is_finite() && self.v.is_finite() && self.omega.is_finite()
    }
}

impl Input {
    pub const SIZE: usize = 1;

    pub fn new(f: f64) -> Self {
        Self { f }
    }

    /// Clamp the force to `[-f_max, f_max]`.
    pub fn saturate(self, f_max: f64) -> Self {
        Self {
            f: self.f.clamp(-f_max, f_max),
        }
    }
}

impl From<State> for na::Vector4<f64> {
    fn from(s: State) -> Self {
        na::Vector4::new(s.p, s.theta, s.v, s.omega)
    }
}

impl From<na::Vector4<f64>> for State {
    fn from(x: na::Vector4<f64>) -> Self {
        State::new(x[0], x[1], x[2], x[3])
    }
}

impl From<State> for [f64; State::SIZE] {
    fn from(s: State) -> Self {
        [s.p, s.theta, s.v, s.omega]
    }
}

impl From<Input> for na::Vector1<f64> {
    fn from(u: Input) -> Self {
        na::Vector1::new(u.f)
    }
}

impl From<f64> for Input {
    fn from(f: f64) -> Self {
        Input { f }
    }
}

impl From<Input> for f64 {
    fn from(u: Input) -> Self {
        u.f
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_order_is_p_theta_v_omega() {
        let s = State::new(1.0, 2.0, 3.0, 4.0);
        let x: na::Vector4<f64> = s.into();
        assert_eq!(x, na::Vector4::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(State::from(x), s);
    }

    #[test]
    fn saturate_clamps_both_sides() {
        assert_eq!(Input::new(25.0).saturate(20.0), Input::new(20.0));
        assert_eq!(Input::new(-25.0).saturate(20.0), Input::new(-20.0));
        assert_eq!(Input::new(3.0).saturate(20.0), Input::new(3.0));
    }
}
