//! Headless tracer run
//!
//! Holds the configured force for the first half of the run, then lets the
//! flow decay, printing field statistics and tracer speeds along the way.
//!
//! Run with: cargo run --release --example headless_tracers [config.yaml|config.json]
//! Set RUST_LOG=flow3d=debug for per-frame solver logs.

use std::time::Instant;

use flow3d::{FluidSimulation3D, SimConfig};

const TICKS: u64 = 120;
const REPORT_EVERY: u64 = 20;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(&path)?,
        None => SimConfig {
            seed: Some(1),
            ..SimConfig::default()
        },
    };

    println!("=== flow3d headless tracers ===");
    println!(
        "Grid: {}x{}x{}, tracers: {}, dt: {}, Re: {:e}, scheme: {:?}",
        config.width,
        config.height,
        config.depth,
        config.tracer_count,
        config.delta_t,
        config.reynolds,
        config.pressure_scheme
    );

    let mut sim = FluidSimulation3D::new(config)?;

    let start = Instant::now();
    for tick in 0..TICKS {
        sim.step(tick < TICKS / 2);

        if sim.frame() % REPORT_EVERY == 0 {
            let stats = sim.stats();
            let samples = sim.tracer_positions();
            let mean_speed = samples.iter().map(|s| s.speed).sum::<f64>() / samples.len() as f64;
            let max_speed = samples.iter().fold(0.0f64, |m, s| m.max(s.speed));

            println!(
                "Frame {:4}: max_div={:.3e} max_vel={:.4} energy={:.4e} | tracer speed mean={:.4} max={:.4}",
                sim.frame(),
                stats.max_divergence,
                stats.max_speed,
                stats.kinetic_energy,
                mean_speed,
                max_speed
            );
        }
    }
    let elapsed = start.elapsed();
    println!(
        "{} ticks in {:.1} ms ({:.3} ms/tick)",
        TICKS,
        elapsed.as_secs_f64() * 1000.0,
        elapsed.as_secs_f64() * 1000.0 / TICKS as f64
    );

    let fastest = sim
        .tracer_positions()
        .into_iter()
        .max_by(|a, b| a.speed.total_cmp(&b.speed));
    if let Some(sample) = fastest {
        println!("Fastest tracer: {}", serde_json::to_string(&sample)?);
    }

    Ok(())
}
