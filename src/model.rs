use log::debug;

use crate::error::{Error, Result};
use crate::expr::{eval_all, Bindings, Expr};
use crate::params::Params;
use crate::state::{Input, State};

pub const MODEL_NAME: &str = "inverted_pendulum";

const STATE_NAMES: [&str; State::SIZE] = ["p", "theta", "v", "omega"];
const XDOT_NAMES: [&str; State::SIZE] = ["p_dot", "theta_dot", "v_dot", "omega_dot"];
const INPUT_NAMES: [&str; Input::SIZE] = ["F"];

/// Symbolic cart-pendulum model handed to an OCP solver.
///
/// `f_expl` is the explicit right-hand side `xdot = f(x, u)`, `f_impl` the
/// implicit residual `xdot - f(x, u)` used by implicit integrators.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub x: Vec<Expr>,
    pub xdot: Vec<Expr>,
    pub u: Vec<Expr>,
    pub f_expl: Vec<Expr>,
    pub f_impl: Vec<Expr>,
    params: Params,
}

impl Model {
    pub fn new(params: Params) -> Self {
        let (big_m, m, l, g) = (
            params.cart_mass(),
            params.pendulum_mass(),
            params.length(),
            params.gravity(),
        );
        debug!(
            "building {MODEL_NAME}: M={big_m}, m={m}, l={l}, g={g}, F_max={}",
            params.f_max()
        );

        let x: Vec<Expr> = STATE_NAMES.iter().map(|n| Expr::sym(n)).collect();
        let u: Vec<Expr> = INPUT_NAMES.iter().map(|n| Expr::sym(n)).collect();
        let xdot: Vec<Expr> = XDOT_NAMES.iter().map(|n| Expr::sym(n)).collect();

        let (theta, v, omega) = (&x[1], &x[2], &x[3]);
        let force = &u[0];
        let (sin, cos) = (theta.sin(), theta.cos());

        let a = -m * l * sin.clone() * omega.powi(2)
            + m * g * cos.clone() * sin.clone()
            + force.clone();
        let b = -m * l * cos.clone() * sin.clone() * omega.powi(2)
            + force * &cos
            + (big_m + m) * g * sin;
        let c = big_m + m - m * cos.powi(2);

        let f_expl = vec![
            v.clone(),
            omega.clone(),
            a / c.clone(),
            b / (l * c),
        ];
        let f_impl = xdot.iter().zip(&f_expl).map(|(d, f)| d - f).collect();

        Self {
            name: MODEL_NAME.to_owned(),
            x,
            xdot,
            u,
            f_expl,
            f_impl,
            params,
        }
    }

    pub fn params(&self) -> Params {
        self.params
    }

    /// Symbol values for a state and an input.
    pub fn bindings(x: &State, u: &Input) -> Bindings<'static> {
        let mut b = Bindings::with_capacity(State::SIZE * 2 + Input::SIZE);
        let values: [f64; State::SIZE] = (*x).into();
        for (name, value) in STATE_NAMES.into_iter().zip(values) {
            b.insert(name, value);
        }
        b.insert(INPUT_NAMES[0], u.f);
        b
    }

    /// Evaluate the explicit right-hand side at `(x, u)`.
    pub fn eval_expl(&self, x: &State, u: &Input) -> Result<na::Vector4<f64>> {
        let values = eval_all(&self.f_expl, &Self::bindings(x, u))?;
        to_vector4("f_expl", &values)
    }

    /// Evaluate the implicit residual at `(x, xdot, u)`.
    pub fn eval_impl(
        &self,
        x: &State,
        xdot: &na::Vector4<f64>,
        u: &Input,
    ) -> Result<na::Vector4<f64>> {
        let mut b = Self::bindings(x, u);
        for (name, value) in XDOT_NAMES.into_iter().zip(xdot.iter()) {
            b.insert(name, *value);
        }
        let values = eval_all(&self.f_impl, &b)?;
        to_vector4("f_impl", &values)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

fn to_vector4(what: &'static str, values: &[f64]) -> Result<na::Vector4<f64>> {
    if values.len() != State::SIZE {
        return Err(Error::DimensionMismatch {
            what,
            expected: State::SIZE,
            found: values.len(),
        });
    }
    Ok(na::Vector4::from_column_slice(values))
}

// 系ダイナミクスを記述 (式グラフを介さない閉形式)
pub fn dynamics(params: &Params, x: &State, u: &Input) -> na::Vector4<f64> {
    let (big_m, m, l, g) = (
        params.cart_mass(),
        params.pendulum_mass(),
        params.length(),
        params.gravity(),
    );
    let (sin, cos) = x.theta.sin_cos();
    let w2 = x.omega * x.omega;
    let a = -m * l * sin * w2 + m * g * cos * sin + u.f;
    let b = -m * l * cos * sin * w2 + u.f * cos + (big_m + m) * g * sin;
    let c = params.denominator(x.theta);
    na::Vector4::new(x.v, x.omega, a / c, b / (l * c))
}
