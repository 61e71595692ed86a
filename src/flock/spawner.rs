//! Point spawning: a flock of boids released from one world location
//!
//! Each spawned boid starts at the spawner's origin with a uniformly random
//! heading and a speed drawn from the flock's speed envelope, and is
//! registered as a member before it is returned to the caller.

use rand::Rng;
use tracing::debug;

use crate::flock::boid::Boid;
use crate::flock::registry::FlockRegistry;
use crate::util::vec3::Vec3;

/// Spawns boids at a fixed world point in random directions
#[derive(Debug, Clone, Copy)]
pub struct PointSpawner {
    pub origin: Vec3,
}

impl PointSpawner {
    pub fn new(origin: Vec3) -> Self {
        Self { origin }
    }

    /// Spawn `count` boids into the given flock
    pub fn spawn<R: Rng + ?Sized>(
        &self,
        registry: &mut FlockRegistry,
        count: usize,
        rng: &mut R,
    ) -> Vec<Boid> {
        let (min_speed, max_speed) = {
            let config = registry.read_config();
            (config.min_speed, config.max_speed)
        };

        let boids: Vec<Boid> = (0..count)
            .map(|_| {
                let heading = random_unit(rng);
                let speed = rng.gen_range(min_speed..=max_speed);
                let boid =
                    Boid::new(self.origin, heading * speed).with_flock(registry.handle());
                registry.add_member(boid.id());
                boid
            })
            .collect();

        debug!(count = boids.len(), origin = ?self.origin, "spawned flock at point");
        boids
    }
}

/// Uniformly distributed unit vector
fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let theta: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
    let ring = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(ring * theta.cos(), ring * theta.sin(), z)
}
