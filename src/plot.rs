//! Static figures of a closed-loop run.
//!
//! Every function renders one PNG per figure with the plotters bitmap
//! backend. Angles are shown in degrees, computation times in milliseconds.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::error::{Error, Result};
use crate::state::{Input, State};
use crate::trajectory::Trajectory;

const FIGURE_SIZE: (u32, u32) = (1280, 960);
const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);
const PREDICTION_COLOR: RGBColor = RGBColor(214, 39, 40);
const STATE_LABELS: [&str; State::SIZE] = ["p [m]", "theta [deg]", "v [m/s]", "omega [deg/s]"];

type Series = Vec<(f64, f64)>;

/// Receding-horizon solution at one simulation step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prediction {
    /// Predicted states on the shooting nodes.
    pub states: Vec<State>,
    /// Predicted controls, one fewer than `states`.
    pub controls: Vec<Input>,
}

/// Points of a step plot where `y[i]` holds on `[t[i], t[i+1])`.
pub fn step_post(t: &[f64], y: &[f64]) -> Series {
    let n = t.len().min(y.len());
    let mut points = Vec::with_capacity(2 * n);
    for i in 0..n {
        points.push((t[i], y[i]));
        if i + 1 < n {
            points.push((t[i + 1], y[i]));
        }
    }
    points
}

/// Axis range covering `values` with 5 % padding.
pub fn value_range<I: IntoIterator<Item = f64>>(values: I) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return (-1.0, 1.0);
    }
    let span = hi - lo;
    let pad = if span > 0.0 { 0.05 * span } else { 1.0 };
    (lo - pad, hi + pad)
}

fn time_range(t: &[f64]) -> (f64, f64) {
    match (t.first(), t.last()) {
        (Some(&a), Some(&b)) if b > a => (a, b),
        (Some(&a), _) => (a, a + 1.0),
        _ => (0.0, 1.0),
    }
}

/// Time of each predicted node: `t0 + nodes[i]`, or a uniform `ts` grid.
pub fn prediction_time(t0: f64, n: usize, ts: f64, shooting_nodes: Option<&[f64]>) -> Vec<f64> {
    match shooting_nodes {
        Some(nodes) => nodes.iter().take(n).map(|s| t0 + s).collect(),
        None => (0..n).map(|i| t0 + i as f64 * ts).collect(),
    }
}

fn state_component(x: &State, i: usize) -> f64 {
    match i {
        0 => x.p,
        1 => x.theta_deg(),
        2 => x.v,
        _ => x.omega_deg(),
    }
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    x_range: (f64, f64),
    y_label: &str,
    series: &[(Series, RGBColor)],
) -> Result<()> {
    let y_range = value_range(series.iter().flat_map(|(s, _)| s.iter().map(|p| p.1)));
    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)
        .map_err(Error::plot)?;
    chart
        .configure_mesh()
        .x_desc("time [s]")
        .y_desc(y_label)
        .draw()
        .map_err(Error::plot)?;
    for (points, color) in series {
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(Error::plot)?;
    }
    Ok(())
}

fn draw_states(
    path: &Path,
    time: &[f64],
    panels: [Vec<(Series, RGBColor)>; State::SIZE],
) -> Result<()> {
    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(Error::plot)?;
    let x_range = time_range(time);
    let areas = root.split_evenly((2, 2));
    for ((area, label), series) in areas.iter().zip(STATE_LABELS).zip(&panels) {
        draw_panel(area, x_range, label, series)?;
    }
    root.present().map_err(Error::plot)?;
    Ok(())
}

fn draw_single(
    path: &Path,
    x_range: (f64, f64),
    y_label: &str,
    series: &[(Series, RGBColor)],
) -> Result<()> {
    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(Error::plot)?;
    draw_panel(&root, x_range, y_label, series)?;
    root.present().map_err(Error::plot)?;
    Ok(())
}

fn measured_series(traj: &Trajectory, i: usize) -> Series {
    traj.time
        .iter()
        .zip(&traj.states)
        .map(|(t, x)| (*t, state_component(x, i)))
        .collect()
}

fn control_series(traj: &Trajectory) -> Series {
    let f: Vec<f64> = traj.controls.iter().map(|u| u.f).collect();
    step_post(&traj.time_dt, &f)
}

/// States (2x2 subplots) and the applied force of a run.
pub fn plot_results(traj: &Trajectory, states_path: &Path, control_path: &Path) -> Result<()> {
    let panels = std::array::from_fn(|i| vec![(measured_series(traj, i), LINE_COLOR)]);
    draw_states(states_path, &traj.time, panels)?;
    draw_single(
        control_path,
        time_range(&traj.time_dt),
        "F [N]",
        &[(control_series(traj), LINE_COLOR)],
    )
}

/// Like [`plot_results`], with the prediction made at step `k` overlaid in red.
pub fn plot_pred_traj(
    traj: &Trajectory,
    prediction: &Prediction,
    k: usize,
    shooting_nodes: Option<&[f64]>,
    states_path: &Path,
    control_path: &Path,
) -> Result<()> {
    let t0 = *traj.time_dt.get(k).ok_or(Error::IndexOutOfRange {
        what: "simulation step",
        index: k,
        len: traj.time_dt.len(),
    })?;
    let ts = match traj.time_dt.as_slice() {
        [.., a, b] => b - a,
        _ => traj.dt(),
    };
    let n = prediction.states.len();
    let time_pred = prediction_time(t0, n, ts, shooting_nodes);

    let panels = std::array::from_fn(|i| {
        let values: Vec<f64> = prediction.states.iter().map(|x| state_component(x, i)).collect();
        vec![
            (measured_series(traj, i), LINE_COLOR),
            (step_post(&time_pred, &values), PREDICTION_COLOR),
        ]
    });
    draw_states(states_path, &traj.time, panels)?;

    // repeat the last control so it spans the final interval
    let mut u_pred: Vec<f64> = prediction.controls.iter().map(|u| u.f).collect();
    if let Some(&last) = u_pred.last() {
        u_pred.push(last);
    }
    let x_range = time_range(&traj.time_dt);
    let x_range = (x_range.0, time_pred.last().map_or(x_range.1, |t| t.max(x_range.1)));
    draw_single(
        control_path,
        x_range,
        "F [N]",
        &[
            (control_series(traj), LINE_COLOR),
            (step_post(&time_pred, &u_pred), PREDICTION_COLOR),
        ],
    )
}

/// Solver computation time per step, with the real-time budget `ts` if given.
pub fn plot_cpt(t: &[f64], cpt: &[f64], ts: Option<f64>, path: &Path) -> Result<()> {
    let cpt_ms: Vec<f64> = cpt.iter().map(|c| c * 1000.0).collect();
    let points = step_post(t, &cpt_ms);
    let budget = ts.map(|ts| ts * 1000.0);
    let x_range = time_range(t);
    let y_range = value_range(cpt_ms.iter().copied().chain(budget));

    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(Error::plot)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)
        .map_err(Error::plot)?;
    chart
        .configure_mesh()
        .x_desc("time [s]")
        .y_desc("cpt [ms]")
        .draw()
        .map_err(Error::plot)?;
    chart
        .draw_series(LineSeries::new(points, LINE_COLOR.stroke_width(2)))
        .map_err(Error::plot)?;
    if let Some(budget) = budget {
        chart
            .draw_series(DashedLineSeries::new(
                [(x_range.0, budget), (x_range.1, budget)],
                10,
                6,
                BLACK.mix(0.7).stroke_width(2),
            ))
            .map_err(Error::plot)?;
    }
    root.present().map_err(Error::plot)?;
    Ok(())
}

/// Vertical markers at every instant of `grid`.
pub fn plot_grid(grid: &[f64], title: Option<&str>, path: &Path) -> Result<()> {
    let x_range = value_range(grid.iter().copied());

    let root = BitMapBackend::new(path, (FIGURE_SIZE.0, FIGURE_SIZE.1 / 3)).into_drawing_area();
    root.fill(&WHITE).map_err(Error::plot)?;
    let mut builder = ChartBuilder::on(&root);
    builder.margin(15).x_label_area_size(40).y_label_area_size(20);
    if let Some(title) = title {
        builder.caption(title, ("sans-serif", 28).into_font().style(FontStyle::Bold));
    }
    let mut chart = builder
        .build_cartesian_2d(x_range.0..x_range.1, 0.0..1.0)
        .map_err(Error::plot)?;
    chart
        .configure_mesh()
        .x_desc("time [s]")
        .y_labels(0)
        .disable_y_mesh()
        .draw()
        .map_err(Error::plot)?;
    chart
        .draw_series(
            grid.iter()
                .map(|&t| PathElement::new(vec![(t, 0.0), (t, 1.0)], LINE_COLOR.stroke_width(1))),
        )
        .map_err(Error::plot)?;
    root.present().map_err(Error::plot)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_post_holds_values_until_next_instant() {
        let points = step_post(&[0.0, 1.0, 2.0], &[5.0, 6.0, 7.0]);
        assert_eq!(
            points,
            vec![(0.0, 5.0), (1.0, 5.0), (1.0, 6.0), (2.0, 6.0), (2.0, 7.0)]
        );
        assert!(step_post(&[], &[]).is_empty());
        // extra samples on either side are ignored
        assert_eq!(step_post(&[0.0, 1.0], &[3.0]), vec![(0.0, 3.0)]);
    }

    #[test]
    fn value_range_pads_and_handles_degenerate_input() {
        assert_eq!(value_range([0.0, 10.0]), (-0.5, 10.5));
        assert_eq!(value_range([2.0, 2.0]), (1.0, 3.0));
        assert_eq!(value_range(std::iter::empty()), (-1.0, 1.0));
        assert_eq!(value_range([f64::NAN, 1.0, 3.0]), (0.9, 3.1));
    }

    #[test]
    fn prediction_time_uniform_and_explicit() {
        assert_eq!(prediction_time(1.0, 3, 0.5, None), vec![1.0, 1.5, 2.0]);
        let nodes = [0.0, 0.1, 0.3, 0.7];
        assert_eq!(prediction_time(2.0, 3, 0.5, Some(&nodes[..])), vec![2.0, 2.1, 2.3]);
    }

    #[test]
    fn prediction_step_must_exist() {
        let traj = Trajectory::new(State::default(), 0.1);
        let dir = std::env::temp_dir();
        let err = plot_pred_traj(
            &traj,
            &Prediction::default(),
            3,
            None,
            &dir.join("unused_states.png"),
            &dir.join("unused_control.png"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 3, len: 0, .. }));
    }

    fn short_run() -> Trajectory {
        let mut traj = Trajectory::new(State::new(0.0, 0.1, 0.0, 0.0), 0.1);
        for k in 0..5 {
            let x = State::new(0.1 * k as f64, 0.1 - 0.02 * k as f64, 0.1, -0.2);
            traj.push(Input::new(k as f64 - 2.0), 1e-4 * (k + 1) as f64, x);
        }
        traj
    }

    /// Unique file in the temp dir, removed on drop.
    struct TempPng(std::path::PathBuf);

    impl TempPng {
        fn new(name: &str) -> Self {
            let file = format!("inverted_pendulum_{}_{name}.png", std::process::id());
            Self(std::env::temp_dir().join(file))
        }

        fn assert_written(&self) {
            let len = std::fs::metadata(&self.0).unwrap().len();
            assert!(len > 0, "{} is empty", self.0.display());
        }
    }

    impl Drop for TempPng {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn results_are_rendered() {
        let (states, control) = (TempPng::new("results_states"), TempPng::new("results_control"));
        plot_results(&short_run(), &states.0, &control.0).unwrap();
        states.assert_written();
        control.assert_written();
    }

    #[test]
    fn prediction_is_rendered() {
        let traj = short_run();
        let prediction = Prediction {
            states: traj.states[2..].to_vec(),
            controls: traj.controls[2..].to_vec(),
        };
        let (states, control) = (TempPng::new("pred_states"), TempPng::new("pred_control"));
        let nodes = [0.0, 0.1, 0.25, 0.45];
        plot_pred_traj(&traj, &prediction, 2, Some(&nodes[..]), &states.0, &control.0).unwrap();
        states.assert_written();
        control.assert_written();

        // uniform grid when no nodes are given
        plot_pred_traj(&traj, &prediction, 4, None, &states.0, &control.0).unwrap();
        states.assert_written();
    }

    #[test]
    fn cpt_and_grid_are_rendered() {
        let traj = short_run();
        let cpt = TempPng::new("cpt");
        plot_cpt(&traj.time_dt, &traj.cpt, Some(0.1), &cpt.0).unwrap();
        cpt.assert_written();
        plot_cpt(&traj.time_dt, &traj.cpt, None, &cpt.0).unwrap();
        cpt.assert_written();

        let grid = TempPng::new("grid");
        plot_grid(&[0.0, 0.1, 0.3, 0.7], Some("Shooting nodes"), &grid.0).unwrap();
        grid.assert_written();
        plot_grid(&[], None, &grid.0).unwrap();
        grid.assert_written();
    }

    #[test]
    fn state_components_are_in_display_units() {
        let x = State::new(1.0, std::f64::consts::PI, 2.0, -std::f64::consts::PI);
        assert_eq!(state_component(&x, 0), 1.0);
        assert_eq!(state_component(&x, 1), 180.0);
        assert_eq!(state_component(&x, 2), 2.0);
        assert_eq!(state_component(&x, 3), -180.0);
    }
}
