use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, Level};

use flock_sim::config::SimConfig;
use flock_sim::flock::config::FlockConfig;
use flock_sim::sim::Simulation;
use flock_sim::util::vec3::Vec3;

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("flock-sim v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = SimConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Configuration loaded: {} boids, {} Hz, {}s, {} obstacles",
        config.boid_count, config.tick_rate, config.duration_secs, config.obstacle_count
    );

    let flock_config = match &config.settings_path {
        Some(path) => {
            info!("Loading flock settings from {}", path);
            FlockConfig::from_json_file(path)?
        }
        None => FlockConfig::default(),
    };

    let mut rng: StdRng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut sim = Simulation::new(flock_config)?;
    sim.spawn_flock(config.spawn_origin, config.boid_count, &mut rng);
    scatter_obstacles(&mut sim, &config, &mut rng);

    let dt = config.dt();
    let total_ticks = config.total_ticks();
    let started = Instant::now();

    for current in 0..total_ticks {
        sim.tick(dt);

        // One stats line per simulated second
        if (current + 1) % config.tick_rate as u64 == 0 {
            let stats = sim.flock_stats();
            info!(
                "t={:>4.0}s speed[{:.0}..{:.0}] mean={:.0} centroid=({:.0}, {:.0}, {:.0}) spread={:.0}",
                (current + 1) as f32 * dt,
                stats.min_speed,
                stats.max_speed,
                stats.mean_speed,
                stats.centroid.x,
                stats.centroid.y,
                stats.centroid.z,
                stats.spread,
            );
        }
    }

    let elapsed = started.elapsed();
    let grid = sim.grid_stats();
    info!(
        "Simulated {} ticks of {} boids in {:.2?} ({:.0} ticks/s); grid: {} cells, max {} per cell",
        total_ticks,
        sim.len(),
        elapsed,
        total_ticks as f64 / elapsed.as_secs_f64(),
        grid.non_empty_cells,
        grid.max_per_cell,
    );

    Ok(())
}

/// Scatter sphere obstacles on a shell around the spawn point
fn scatter_obstacles(sim: &mut Simulation, config: &SimConfig, rng: &mut StdRng) {
    for _ in 0..config.obstacle_count {
        let z: f32 = rng.gen_range(-1.0..=1.0);
        let theta: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
        let ring = (1.0 - z * z).max(0.0).sqrt();
        let direction = Vec3::new(ring * theta.cos(), ring * theta.sin(), z);
        let distance = rng.gen_range(config.world_radius * 0.4..=config.world_radius);
        let radius = rng.gen_range(60.0..=180.0);
        sim.add_obstacle(config.spawn_origin + direction * distance, radius);
    }
    if config.obstacle_count > 0 {
        info!("Placed {} obstacles", config.obstacle_count);
    }
}
