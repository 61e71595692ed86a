//! Flock-wide tunable parameters
//!
//! One `FlockConfig` is shared read-only by every member of a flock. All
//! fields are externally settable between ticks (settings UI or JSON file);
//! an agent's step takes a single read lock so the values it sees are stable
//! for the duration of that step.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flock::constants::{avoidance, perception, speed, steering};
use crate::util::vec3::Vec3;

/// Sensors are validated as unit vectors to this tolerance
const SENSOR_UNIT_TOLERANCE: f32 = 1e-3;

/// Configuration errors surfaced by validation and settings-file loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("speed bounds invalid: min_speed {min} must be positive and <= max_speed {max}")]
    SpeedBounds { min: f32, max: f32 },
    #[error("{name} must be a cosine threshold in [-1, 1], got {value}")]
    FovRange { name: &'static str, value: f32 },
    #[error("{name} must be non-negative, got {value}")]
    NegativeStrength { name: &'static str, value: f32 },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("avoidance sensor {index} is not unit length (|v| = {length})")]
    NonUnitSensor { index: usize, length: f32 },
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunable parameters shared by all members of one flock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    /// Minimum flight speed (clamp floor)
    pub min_speed: f32,
    /// Maximum flight speed (clamp ceiling)
    pub max_speed: f32,
    /// Cosine FOV threshold for the separation rule
    pub separation_fov: f32,
    /// Cosine FOV threshold for the alignment rule
    pub alignment_fov: f32,
    /// Cosine FOV threshold for the cohesion rule
    pub cohesion_fov: f32,
    /// Separation force multiplier
    pub separation_strength: f32,
    /// Alignment force multiplier
    pub alignment_strength: f32,
    /// Cohesion force multiplier
    pub cohesion_strength: f32,
    /// Obstacle avoidance force multiplier
    pub avoidance_strength: f32,
    /// Radius of the neighbor-sensing sphere
    pub perception_radius: f32,
    /// Radius of each boid's own collision sphere
    pub body_radius: f32,
    /// Ordered local-space probe directions; index 0 is the forward probe
    /// and the order defines avoidance priority. Empty disables avoidance.
    pub avoidance_sensors: Vec<Vec3>,
    /// How far each sensor traces
    pub sensor_range: f32,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            min_speed: speed::MIN,
            max_speed: speed::MAX,
            separation_fov: perception::SEPARATION_FOV,
            alignment_fov: perception::ALIGNMENT_FOV,
            cohesion_fov: perception::COHESION_FOV,
            separation_strength: steering::SEPARATION,
            alignment_strength: steering::ALIGNMENT,
            cohesion_strength: steering::COHESION,
            avoidance_strength: steering::AVOIDANCE,
            perception_radius: perception::RADIUS,
            body_radius: avoidance::BODY_RADIUS,
            avoidance_sensors: Self::default_sensors(avoidance::SENSOR_COUNT),
            sensor_range: avoidance::SENSOR_RANGE,
        }
    }
}

impl FlockConfig {
    /// Build the default probe set: a golden-angle spiral over the unit
    /// sphere ordered by angle off +X, so the first entry is exactly the
    /// forward probe and priority sweeps outward toward the rear.
    pub fn default_sensors(count: usize) -> Vec<Vec3> {
        let golden_angle = std::f32::consts::PI * (3.0 - 5.0f32.sqrt());
        (0..count)
            .map(|k| {
                let x = if count > 1 {
                    1.0 - 2.0 * k as f32 / (count as f32 - 1.0)
                } else {
                    1.0
                };
                let ring = (1.0 - x * x).max(0.0).sqrt();
                let theta = golden_angle * k as f32;
                Vec3::new(x, ring * theta.cos(), ring * theta.sin())
            })
            .collect()
    }

    /// Load settings from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every field constraint
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_speed > 0.0 && self.min_speed <= self.max_speed) {
            return Err(ConfigError::SpeedBounds {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        for (name, value) in [
            ("separation_fov", self.separation_fov),
            ("alignment_fov", self.alignment_fov),
            ("cohesion_fov", self.cohesion_fov),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(ConfigError::FovRange { name, value });
            }
        }
        for (name, value) in [
            ("separation_strength", self.separation_strength),
            ("alignment_strength", self.alignment_strength),
            ("cohesion_strength", self.cohesion_strength),
            ("avoidance_strength", self.avoidance_strength),
        ] {
            if value < 0.0 {
                return Err(ConfigError::NegativeStrength { name, value });
            }
        }
        for (name, value) in [
            ("perception_radius", self.perception_radius),
            ("body_radius", self.body_radius),
            ("sensor_range", self.sensor_range),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        for (index, sensor) in self.avoidance_sensors.iter().enumerate() {
            let length = sensor.length();
            if (length - 1.0).abs() > SENSOR_UNIT_TOLERANCE {
                return Err(ConfigError::NonUnitSensor { index, length });
            }
        }
        Ok(())
    }
}
