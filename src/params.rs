use crate::error::{Error, Result};

// 系のパラメータ
pub const M: f64 = 1.0; // mass of the cart [kg]
pub const M_PENDULUM: f64 = 0.1; // pendulum mass [kg]
pub const L: f64 = 0.8; // pendulum length [m]
pub const G: f64 = 9.81; // gravity acceleration [m/s^2]
pub const F_MAX: f64 = 20.0; // maximum force [N]

// シミュレーションのパラメータ
pub const T_HORIZON: f64 = 2.0; // prediction horizon [s]
pub const N_HORIZON: usize = 40; // number of shooting intervals
pub const DT: f64 = 0.001; // simulation step [s]

fn check(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidParameter { name, value })
    }
}

/// Physical parameters of the cart-pendulum.
///
/// Only constructible through [`Params::new`] or [`Params::default`], so any
/// instance holds strictly positive finite values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    cart_mass: f64,
    pendulum_mass: f64,
    length: f64,
    gravity: f64,
    f_max: f64,
}

impl Params {
    pub fn new(
        cart_mass: f64,
        pendulum_mass: f64,
        length: f64,
        gravity: f64,
        f_max: f64,
    ) -> Result<Self> {
        Ok(Self {
            cart_mass: check("M", cart_mass)?,
            pendulum_mass: check("m", pendulum_mass)?,
            length: check("l", length)?,
            gravity: check("g", gravity)?,
            f_max: check("F_max", f_max)?,
        })
    }

    /// Cart mass M [kg].
    pub fn cart_mass(&self) -> f64 {
        self.cart_mass
    }

    /// Pendulum point mass m [kg].
    pub fn pendulum_mass(&self) -> f64 {
        self.pendulum_mass
    }

    /// Pendulum length l [m].
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    pub fn f_max(&self) -> f64 {
        self.f_max
    }

    /// `M + m - m cos^2(theta)`, bounded below by `M`.
    pub fn denominator(&self, theta: f64) -> f64 {
        let c = theta.cos();
        self.cart_mass + self.pendulum_mass - self.pendulum_mass * c * c
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            cart_mass: M,
            pendulum_mass: M_PENDULUM,
            length: L,
            gravity: G,
            f_max: F_MAX,
        }
    }
}

/// Horizon and step settings of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    t_horizon: f64,
    n_horizon: usize,
    dt: f64,
}

impl SimConfig {
    pub fn new(t_horizon: f64, n_horizon: usize, dt: f64) -> Result<Self> {
        if n_horizon == 0 {
            return Err(Error::InvalidParameter {
                name: "N_horizon",
                value: 0.0,
            });
        }
        Ok(Self {
            t_horizon: check("T_horizon", t_horizon)?,
            n_horizon,
            dt: check("dt", dt)?,
        })
    }

    pub fn t_horizon(&self) -> f64 {
        self.t_horizon
    }

    pub fn n_horizon(&self) -> usize {
        self.n_horizon
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Length of one shooting interval.
    pub fn shooting_interval(&self) -> f64 {
        self.t_horizon / self.n_horizon as f64
    }

    /// Uniform shooting grid `0, Ts, ..., T_horizon` relative to the current instant.
    pub fn shooting_nodes(&self) -> Vec<f64> {
        let ts = self.shooting_interval();
        (0..=self.n_horizon).map(|i| i as f64 * ts).collect()
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            t_horizon: T_HORIZON,
            n_horizon: N_HORIZON,
            dt: DT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn defaults_are_exact() {
        let p = Params::default();
        assert_eq!(p.cart_mass(), 1.0);
        assert_eq!(p.pendulum_mass(), 0.1);
        assert_eq!(p.length(), 0.8);
        assert_eq!(p.gravity(), 9.81);
        assert_eq!(p.f_max(), 20.0);
        assert_eq!(Params::new(1.0, 0.1, 0.8, 9.81, 20.0).unwrap(), p);
    }

    #[test]
    fn rejects_non_physical_values() {
        let err = Params::new(1.0, -0.1, 0.8, 9.81, 20.0).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "m", .. }));
        let err = Params::new(1.0, 0.1, 0.0, 9.81, 20.0).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "l", .. }));
        assert!(Params::new(f64::NAN, 0.1, 0.8, 9.81, 20.0).is_err());
        assert!(Params::new(1.0, 0.1, 0.8, f64::INFINITY, 20.0).is_err());
    }

    #[test]
    fn shooting_grid() {
        let cfg = SimConfig::default();
        assert_relative_eq!(cfg.shooting_interval(), 0.05);
        let nodes = cfg.shooting_nodes();
        assert_eq!(nodes.len(), N_HORIZON + 1);
        assert_eq!(nodes[0], 0.0);
        assert_relative_eq!(nodes[N_HORIZON], T_HORIZON, epsilon = 1e-12);
        assert!(SimConfig::new(2.0, 0, 0.001).is_err());
        assert!(SimConfig::new(2.0, 40, -0.001).is_err());
    }

    proptest! {
        #[test]
        fn denominator_never_below_cart_mass(
            cart in 1e-3f64..100.0,
            pend in 1e-3f64..100.0,
            theta in -20.0f64..20.0,
        ) {
            let p = Params::new(cart, pend, 0.8, 9.81, 20.0).unwrap();
            let c = p.denominator(theta);
            prop_assert!(c > 0.0);
            prop_assert!(c >= cart * (1.0 - 1e-12));
        }

        #[test]
        fn non_positive_mass_is_rejected(cart in -100.0f64..=0.0) {
            prop_assert!(Params::new(cart, 0.1, 0.8, 9.81, 20.0).is_err());
        }
    }
}
