use std::path::Path;

use crate::error::Result;
use crate::state::{Input, State};

/// Closed-loop run: states at `time`, piecewise-constant controls on `time_dt`.
///
/// `states.len() == time.len() == controls.len() + 1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub time: Vec<f64>,
    pub time_dt: Vec<f64>,
    pub states: Vec<State>,
    pub controls: Vec<Input>,
    /// Controller computation time per step [s].
    pub cpt: Vec<f64>,
    dt: f64,
}

impl Trajectory {
    pub fn new(x0: State, dt: f64) -> Self {
        Self {
            time: vec![0.0],
            time_dt: Vec::new(),
            states: vec![x0],
            controls: Vec::new(),
            cpt: Vec::new(),
            dt,
        }
    }

    pub fn push(&mut self, u: Input, cpt: f64, x_next: State) {
        let k = self.controls.len();
        self.time_dt.push(k as f64 * self.dt);
        self.controls.push(u);
        self.cpt.push(cpt);
        self.time.push((k + 1) as f64 * self.dt);
        self.states.push(x_next);
    }

    /// Number of control intervals.
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn last_state(&self) -> Option<&State> {
        self.states.last()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.states.iter().map(|x| x.p).collect()
    }

    pub fn angles(&self) -> Vec<f64> {
        self.states.iter().map(|x| x.theta).collect()
    }

    /// Write `t,p,theta,v,omega,F,cpt`; the final state row has empty control fields.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(["t", "p", "theta", "v", "omega", "F", "cpt"])?;
        for (i, (t, x)) in self.time.iter().zip(&self.states).enumerate() {
            let (f, cpt) = match (self.controls.get(i), self.cpt.get(i)) {
                (Some(u), Some(c)) => (u.f.to_string(), c.to_string()),
                _ => (String::new(), String::new()),
            };
            wtr.write_record(&[
                t.to_string(),
                x.p.to_string(),
                x.theta.to_string(),
                x.v.to_string(),
                x.omega.to_string(),
                f,
                cpt,
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}
