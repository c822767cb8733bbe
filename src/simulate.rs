use log::warn;

use crate::model::dynamics;
use crate::params::Params;
use crate::state::{Input, State};
use crate::trajectory::Trajectory;

/// Anything that maps the measured state at step `k` to a force.
pub trait Controller {
    fn control(&mut self, k: usize, t: f64, x: &State) -> Input;
}

impl<F> Controller for F
where
    F: FnMut(usize, f64, &State) -> Input,
{
    fn control(&mut self, k: usize, t: f64, x: &State) -> Input {
        self(k, t, x)
    }
}

/// One classic Runge-Kutta step with the input held constant.
pub fn rk4_step(params: &Params, x: &State, u: &Input, dt: f64) -> State {
    let f = |x: &na::Vector4<f64>| dynamics(params, &State::from(*x), u);
    let x0: na::Vector4<f64> = (*x).into();
    let k1 = dt * f(&x0);
    let k2 = dt * f(&(x0 + 0.5 * k1));
    let k3 = dt * f(&(x0 + 0.5 * k2));
    let k4 = dt * f(&(x0 + k3));
    const ONE_BY_SIX: f64 = 1.0 / 6.0;
    State::from(x0 + ONE_BY_SIX * (k1 + 2.0 * k2 + 2.0 * k3 + k4))
}

/// Run the plant for `n_steps` with the controller in the loop.
///
/// Inputs are saturated to `±F_max` before being applied. The run stops early
/// if the state stops being finite.
pub fn simulate<C: Controller + ?Sized>(
    params: &Params,
    x0: State,
    n_steps: usize,
    dt: f64,
    controller: &mut C,
) -> Trajectory {
    let mut traj = Trajectory::new(x0, dt);
    let mut x = x0;
    for k in 0..n_steps {
        let t = k as f64 * dt;
        let now = std::time::Instant::now();
        let u = controller.control(k, t, &x).saturate(params.f_max());
        let cpt = now.elapsed().as_secs_f64();

        x = rk4_step(params, &x, &u, dt);
        if !x.is_finite() {
            warn!("state diverged at t = {t:.3}, stopping");
            break;
        }
        traj.push(u, cpt, x);
    }
    traj
}
