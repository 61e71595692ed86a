/// Speed envelope defaults (world units / second)
pub mod speed {
    /// Slowest a boid may fly; the clamp floor after every step
    pub const MIN: f32 = 300.0;
    /// Fastest a boid may fly; the clamp ceiling after every step
    pub const MAX: f32 = 600.0;
}

/// Perception defaults
pub mod perception {
    /// Radius of the neighbor-sensing sphere (world units)
    pub const RADIUS: f32 = 300.0;
    /// Field-of-view thresholds are cosines of the half angle: a flockmate
    /// is visible to a rule iff dot(forward, to_flockmate) > threshold
    pub const SEPARATION_FOV: f32 = -0.9;
    pub const ALIGNMENT_FOV: f32 = -0.5;
    pub const COHESION_FOV: f32 = -0.5;
}

/// Steering force strength defaults
pub mod steering {
    pub const SEPARATION: f32 = 300.0;
    pub const ALIGNMENT: f32 = 160.0;
    pub const COHESION: f32 = 120.0;
    pub const AVOIDANCE: f32 = 900.0;
}

/// Obstacle avoidance defaults
pub mod avoidance {
    /// Number of probe directions in the default sensor spiral
    pub const SENSOR_COUNT: usize = 32;
    /// How far ahead each sensor traces (world units)
    pub const SENSOR_RANGE: f32 = 400.0;
    /// Radius of the boid's own collision sphere, used to discard hits
    /// against obstacles the body is already inside
    pub const BODY_RADIUS: f32 = 32.0;
}

/// Fixed-tick defaults for the simulation driver
pub mod tick {
    /// Simulation tick rate in Hz
    pub const RATE: u32 = 30;
    /// Delta time per tick in seconds
    pub const DT: f32 = 1.0 / 30.0;
}
