use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{info, warn};
use plotters::prelude::*;

use crate::error::{Error, Result};
use crate::params::Params;

const CART_COLOR: RGBColor = RGBColor(167, 199, 231);
const PENDULUM_COLOR: RGBColor = RGBColor(65, 105, 225);
const MASS_COLOR: RGBColor = RGBColor(64, 224, 208);
const MASS_RADIUS: f64 = 0.1;
const X_LIMITS: (f64, f64) = (-3.0, 3.0);
const Y_LIMITS: (f64, f64) = (-1.0, 1.0);
const BASE_HALF_LENGTH: f64 = 2.5;

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationConfig {
    /// Output frame rate [frames/s].
    pub fps: u32,
    /// Frame size in pixels, both even for yuv420p.
    pub size: (u32, u32),
    pub cart_width: f64,
    pub cart_height: f64,
    pub output: PathBuf,
    /// Encoder executable reading raw rgb24 frames on stdin.
    pub encoder: String,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fps: 20,
            size: (1200, 480),
            cart_width: 1.0,
            cart_height: 0.5,
            output: PathBuf::from("simulation.mp4"),
            encoder: "ffmpeg".to_owned(),
        }
    }
}

/// Keep one sample out of `df` so that samples every `ts` play at `fps`.
///
/// Returns 0 when the samples are sparser than the frame rate.
pub fn decimation_factor(ts: f64, fps: u32) -> usize {
    (1.0 / (ts * fps as f64)) as usize
}

pub fn frame_indices(n_samples: usize, df: usize) -> Vec<usize> {
    (0..n_samples).step_by(df.max(1)).collect()
}

/// Position of the pendulum mass; theta = 0 is upright.
pub fn pendulum_tip(p: f64, theta: f64, l: f64) -> (f64, f64) {
    (p - l * theta.sin(), l * theta.cos())
}

/// Bytes of one rgb24 frame of `size` pixels.
pub fn frame_len(size: (u32, u32)) -> usize {
    size.0 as usize * size.1 as usize * 3
}

fn circle(center: (f64, f64), radius: f64) -> Vec<(f64, f64)> {
    const N: usize = 32;
    (0..N)
        .map(|i| {
            let a = 2.0 * std::f64::consts::PI * i as f64 / N as f64;
            (center.0 + radius * a.cos(), center.1 + radius * a.sin())
        })
        .collect()
}

/// Draw one frame into an rgb24 buffer of `cfg.size`.
pub fn render_frame(
    buf: &mut [u8],
    cfg: &AnimationConfig,
    l: f64,
    p: f64,
    theta: f64,
) -> Result<()> {
    let expected = frame_len(cfg.size);
    if buf.len() != expected {
        return Err(Error::DimensionMismatch {
            what: "frame buffer",
            expected,
            found: buf.len(),
        });
    }
    let root = BitMapBackend::with_buffer(buf, cfg.size).into_drawing_area();
    root.fill(&WHITE).map_err(Error::plot)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Inverted Pendulum simulation",
            ("sans-serif", 24).into_font().style(FontStyle::Bold),
        )
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(X_LIMITS.0..X_LIMITS.1, Y_LIMITS.0..Y_LIMITS.1)
        .map_err(Error::plot)?;
    chart
        .configure_mesh()
        .x_desc("x")
        .y_desc("y")
        .draw()
        .map_err(Error::plot)?;

    let (w, h) = (cfg.cart_width, cfg.cart_height);
    let tip = pendulum_tip(p, theta, l);
    chart
        .draw_series(LineSeries::new(
            [(-BASE_HALF_LENGTH, -h / 2.0), (BASE_HALF_LENGTH, -h / 2.0)],
            &BLACK,
        ))
        .map_err(Error::plot)?;
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(p - w / 2.0, -h / 2.0), (p + w / 2.0, h / 2.0)],
            CART_COLOR.filled(),
        )))
        .map_err(Error::plot)?;
    chart
        .draw_series(LineSeries::new(
            [(p, 0.0), tip],
            PENDULUM_COLOR.stroke_width(2),
        ))
        .map_err(Error::plot)?;
    chart
        .draw_series(std::iter::once(Polygon::new(
            circle(tip, MASS_RADIUS),
            MASS_COLOR.filled(),
        )))
        .map_err(Error::plot)?;
    root.present().map_err(Error::plot)?;
    Ok(())
}

/// Render the decimated trajectory frame by frame into `out`.
pub fn write_frames<W: Write>(
    out: &mut W,
    params: &Params,
    p: &[f64],
    theta: &[f64],
    df: usize,
    cfg: &AnimationConfig,
) -> Result<usize> {
    let frames = frame_indices(p.len().min(theta.len()), df);
    let mut buf = vec![0u8; frame_len(cfg.size)];
    let step = (frames.len() / 10).max(1);
    for (n, &i) in frames.iter().enumerate() {
        render_frame(&mut buf, cfg, params.length(), p[i], theta[i])?;
        out.write_all(&buf)?;
        if (n + 1) % step == 0 || n + 1 == frames.len() {
            info!("Generating Animation: {}/{} frames", n + 1, frames.len());
        }
    }
    Ok(frames.len())
}

/// Encode the cart-pendulum motion sampled every `ts` into `cfg.output`.
///
/// Frames are piped as raw rgb24 into the external encoder; the call blocks
/// until the encoder exits.
pub fn animate(
    params: &Params,
    p: &[f64],
    theta: &[f64],
    ts: f64,
    cfg: &AnimationConfig,
) -> Result<()> {
    if p.len() != theta.len() {
        return Err(Error::DimensionMismatch {
            what: "theta samples",
            expected: p.len(),
            found: theta.len(),
        });
    }
    if !(ts.is_finite() && ts > 0.0) {
        return Err(Error::InvalidSamplePeriod(ts));
    }
    let mut df = decimation_factor(ts, cfg.fps);
    if df == 0 {
        warn!(
            "sample period {ts} s is longer than a frame at {} fps; using every sample",
            cfg.fps
        );
        df = 1;
    }

    let (w, h) = cfg.size;
    let mut child = Command::new(&cfg.encoder)
        .args(["-y", "-loglevel", "error", "-f", "rawvideo", "-pixel_format", "rgb24"])
        .arg("-video_size")
        .arg(format!("{w}x{h}"))
        .arg("-framerate")
        .arg(cfg.fps.to_string())
        .args(["-i", "-", "-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .arg(&cfg.output)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .map_err(|e| Error::Encoder(format!("failed to run {}: {e}", cfg.encoder)))?;
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| Error::Encoder("encoder stdin is not piped".to_owned()))?;

    let written = write_frames(&mut stdin, params, p, theta, df, cfg);
    drop(stdin);
    let frames = match written {
        Ok(frames) => frames,
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }
    };

    let status = child.wait()?;
    if !status.success() {
        return Err(Error::Encoder(format!("{} exited with {status}", cfg.encoder)));
    }
    info!("wrote {frames} frames to {}", cfg.output.display());
    Ok(())
}
