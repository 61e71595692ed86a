use crate::flock::constants::tick;
use crate::util::vec3::Vec3;

/// Headless runner configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of boids to spawn
    pub boid_count: usize,
    /// Fixed tick rate in Hz
    pub tick_rate: u32,
    /// How long to simulate, in seconds of simulated time
    pub duration_secs: f32,
    /// Where the flock spawns
    pub spawn_origin: Vec3,
    /// Number of obstacles scattered around the spawn point
    pub obstacle_count: usize,
    /// Radius of the shell obstacles are placed on
    pub world_radius: f32,
    /// RNG seed; None draws from entropy
    pub seed: Option<u64>,
    /// Optional path to a JSON flock settings file
    pub settings_path: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            boid_count: 200,
            tick_rate: tick::RATE,
            duration_secs: 30.0,
            spawn_origin: Vec3::ZERO,
            obstacle_count: 6,
            world_radius: 1500.0,
            seed: None,
            settings_path: None,
        }
    }
}

impl SimConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(count) = std::env::var("FLOCK_BOIDS") {
            if let Ok(parsed) = count.parse::<usize>() {
                if parsed > 0 {
                    config.boid_count = parsed;
                } else {
                    tracing::warn!("FLOCK_BOIDS must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid FLOCK_BOIDS '{}', using default", count);
            }
        }

        if let Ok(rate) = std::env::var("FLOCK_TICK_RATE") {
            if let Ok(parsed) = rate.parse::<u32>() {
                if parsed > 0 {
                    config.tick_rate = parsed;
                } else {
                    tracing::warn!("FLOCK_TICK_RATE must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid FLOCK_TICK_RATE '{}', using default", rate);
            }
        }

        if let Ok(duration) = std::env::var("FLOCK_DURATION_SECS") {
            if let Ok(parsed) = duration.parse::<f32>() {
                if parsed > 0.0 {
                    config.duration_secs = parsed;
                } else {
                    tracing::warn!("FLOCK_DURATION_SECS must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid FLOCK_DURATION_SECS '{}', using default", duration);
            }
        }

        if let Ok(count) = std::env::var("FLOCK_OBSTACLES") {
            if let Ok(parsed) = count.parse::<usize>() {
                config.obstacle_count = parsed;
            } else {
                tracing::warn!("Invalid FLOCK_OBSTACLES '{}', using default", count);
            }
        }

        if let Ok(radius) = std::env::var("FLOCK_WORLD_RADIUS") {
            if let Ok(parsed) = radius.parse::<f32>() {
                if parsed > 0.0 {
                    config.world_radius = parsed;
                } else {
                    tracing::warn!("FLOCK_WORLD_RADIUS must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid FLOCK_WORLD_RADIUS '{}', using default", radius);
            }
        }

        if let Ok(seed) = std::env::var("FLOCK_SEED") {
            if let Ok(parsed) = seed.parse::<u64>() {
                config.seed = Some(parsed);
            } else {
                tracing::warn!("Invalid FLOCK_SEED '{}', ignoring", seed);
            }
        }

        if let Ok(path) = std::env::var("FLOCK_SETTINGS") {
            config.settings_path = Some(path);
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.boid_count == 0 {
            return Err("boid_count must be at least 1".to_string());
        }
        if self.tick_rate == 0 {
            return Err("tick_rate must be at least 1".to_string());
        }
        if self.duration_secs <= 0.0 {
            return Err("duration_secs must be positive".to_string());
        }
        if self.world_radius <= 0.0 {
            return Err("world_radius must be positive".to_string());
        }
        Ok(())
    }

    /// Delta time per tick in seconds
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Total number of ticks for the configured duration
    pub fn total_ticks(&self) -> u64 {
        (self.duration_secs * self.tick_rate as f32).ceil() as u64
    }
}
