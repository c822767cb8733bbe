use inverted_pendulum::piecewise_constant;

// cargo run --example reference_demo -- 0.25

fn main() -> anyhow::Result<()> {
    simple_logger::init_with_level(log::Level::Debug)?;

    let ts: f64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 0.5,
    };
    let reference = piecewise_constant(&[5.0, 10.0, -2.0], &[2.0, 1.0, 1.25], ts)?;

    for (t, r) in reference.time().iter().zip(&reference.samples) {
        println!("t: {t:6.3}, ref: {r:6.2}");
    }
    println!("samples: {}, Tf: {}", reference.len(), reference.horizon);
    Ok(())
}
