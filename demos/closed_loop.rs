use std::path::Path;

use advanced_pid::{PidConfig, PidController, VelPid};
use inverted_pendulum::animation::{animate, AnimationConfig};
use inverted_pendulum::plot::{plot_cpt, plot_grid, plot_pred_traj, plot_results, Prediction};
use inverted_pendulum::simulate::{rk4_step, simulate};
use inverted_pendulum::{piecewise_constant, Input, Model, Params, SimConfig, State};
use rand_distr::{Distribution, Normal};

// cargo run --example closed_loop --release

fn main() -> anyhow::Result<()> {
    simple_logger::init_with_level(log::Level::Info)?;

    let params = Params::default();
    let sim = SimConfig::default();
    let dt = sim.dt();

    let model = Model::new(params);
    for (x, f) in model.x.iter().zip(&model.f_expl) {
        println!("d{x}/dt = {f}");
    }

    // 台車位置の目標値
    let reference = piecewise_constant(&[0.0, 0.5, -0.5], &[2.0, 3.0, 3.0], dt)?;
    let n_steps = reference.len() - 1;

    let mut pid_p = VelPid::new(PidConfig::new(0.1, 0.0, 0.2).with_limits(-0.2, 0.2));
    let mut pid_theta = VelPid::new(
        PidConfig::new(40.0, 1.0, 4.0).with_limits(-params.f_max(), params.f_max()),
    );

    // 角度センサのノイズ
    let mut rng = rand::thread_rng();
    let noise = Normal::new(0.0, 1e-3)?;

    let mut controller = |k: usize, _t: f64, x: &State| {
        let theta_meas = x.theta + noise.sample(&mut rng);
        // 進みたい方向に振子を傾ける
        let theta_ref = -pid_p.update(reference.samples[k], x.p, dt);
        Input::new(pid_theta.update(theta_ref, theta_meas, dt))
    };

    let now = std::time::Instant::now();
    let traj = simulate(&params, State::new(0.0, 0.1, 0.0, 0.0), n_steps, dt, &mut controller);
    println!("elapsed: {:.2} sec", now.elapsed().as_secs_f64());
    if let Some(x) = traj.last_state() {
        println!(
            "final x: [{:6.3}, {:6.3}, {:6.3}, {:6.3}] over {} steps",
            x.p,
            x.theta,
            x.v,
            x.omega,
            traj.len()
        );
    }

    // ログファイルの作成
    std::fs::create_dir_all("logs")?;
    traj.write_csv("logs/closed_loop.csv")?;

    plot_results(&traj, Path::new("logs/states.png"), Path::new("logs/control.png"))?;
    plot_cpt(&traj.time_dt, &traj.cpt, Some(dt), Path::new("logs/cpt.png"))?;
    let nodes = sim.shooting_nodes();
    plot_grid(&nodes, Some("Shooting nodes"), Path::new("logs/grid.png"))?;

    // 途中のステップで入力を保持した場合の予測軌道
    if !traj.is_empty() {
        let k = traj.len() / 2;
        let u = traj.controls[k];
        let mut x = traj.states[k];
        let mut pred = Prediction {
            states: vec![x],
            controls: Vec::new(),
        };
        for _ in 0..sim.n_horizon() {
            x = rk4_step(&params, &x, &u, sim.shooting_interval());
            pred.states.push(x);
            pred.controls.push(u);
        }
        plot_pred_traj(
            &traj,
            &pred,
            k,
            Some(nodes.as_slice()),
            Path::new("logs/pred_states.png"),
            Path::new("logs/pred_control.png"),
        )?;
    }

    let cfg = AnimationConfig {
        output: "logs/simulation.mp4".into(),
        ..AnimationConfig::default()
    };
    if let Err(e) = animate(&params, &traj.positions(), &traj.angles(), dt, &cfg) {
        log::warn!("animation skipped: {e}");
    }

    Ok(())
}
