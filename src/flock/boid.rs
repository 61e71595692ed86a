//! Per-agent state machine and steering core
//!
//! A boid owns its position and velocity and mutates them only inside its
//! own [`Boid::step`]. Each step reads a consistent snapshot of the world
//! (neighbor list + obstacle probe) supplied by the harness and a single
//! read-locked view of the shared flock configuration.

use smallvec::SmallVec;
use std::sync::Weak;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::flock::config::FlockConfig;
use crate::flock::perception::{Neighbor, ObstacleProbe};
use crate::flock::registry::FlockHandle;
use crate::util::quat::Quat;
use crate::util::vec3::Vec3;

/// Unique boid identifier
pub type BoidId = Uuid;

/// One simulated flocking agent
#[derive(Debug, Clone)]
pub struct Boid {
    /// Position in world space; mutated only by this boid's own step
    pub position: Vec3,
    /// Velocity vector; magnitude stays within the flock speed envelope
    /// after every step
    pub velocity: Vec3,
    /// Cached unit heading; always normalize(velocity) except while
    /// velocity is zero, where the previous heading is kept
    forward: Vec3,
    /// One-shot externally injected forces, drained entirely each step
    pending_forces: SmallVec<[Vec3; 4]>,
    /// Weak handle to the owning flock's configuration; steps are no-ops
    /// without one
    flock: Option<Weak<RwLock<FlockConfig>>>,
    id: BoidId,
}

impl Boid {
    /// Create a boid with no flock; its steps are no-ops until one is
    /// attached
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        let forward = if velocity.length_sq() > 0.0 {
            velocity.normalize()
        } else {
            Vec3::X
        };
        Self {
            position,
            velocity,
            forward,
            pending_forces: SmallVec::new(),
            flock: None,
            id: Uuid::new_v4(),
        }
    }

    pub fn with_flock(mut self, handle: FlockHandle) -> Self {
        self.flock = Some(handle);
        self
    }

    pub fn attach(&mut self, handle: FlockHandle) {
        self.flock = Some(handle);
    }

    pub fn id(&self) -> BoidId {
        self.id
    }

    /// Unit heading derived from velocity
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn has_flock(&self) -> bool {
        self.flock
            .as_ref()
            .map_or(false, |handle| handle.strong_count() > 0)
    }

    /// Queue a one-shot steering force (e.g. "go toward point"), applied by
    /// the next step and then discarded.
    ///
    /// Single-writer discipline: callers must not append concurrently with
    /// this boid's own step.
    pub fn add_target_force(&mut self, force: Vec3) {
        self.pending_forces.push(force);
    }

    /// Advance the boid by one tick
    ///
    /// `neighbors` is the start-of-tick snapshot of every other agent within
    /// the flock's perception radius; FOV filtering happens per rule here.
    /// No-op when `dt <= 0` or the flock reference is absent or dead.
    pub fn step(&mut self, dt: f32, neighbors: &[Neighbor], probe: &dyn ObstacleProbe) {
        if dt <= 0.0 {
            return;
        }
        let config = match self.flock.as_ref().and_then(|handle| handle.upgrade()) {
            Some(config) => config,
            None => return,
        };
        // One read lock for the whole step keeps the configuration stable
        // even if the settings surface writes between ticks
        let config = config.read();

        self.position += self.velocity * dt;
        if self.velocity.length_sq() > 0.0 {
            self.forward = self.velocity.normalize();
        }

        let mut acceleration = Vec3::ZERO;
        acceleration += self.separate(&config, neighbors);
        acceleration += self.align(&config, neighbors);
        acceleration += self.group_up(&config, neighbors);

        // Avoidance is added directly on top of the flocking forces, never
        // blended proportionally; with every sensor blocked the boid gets no
        // avoidance force this tick and may collide
        if self.is_obstacle_ahead(&config, probe) {
            acceleration += self.avoid_obstacle(&config, probe);
        }

        for force in self.pending_forces.drain(..) {
            acceleration += force;
        }

        self.velocity += acceleration * dt;
        if self.velocity.length_sq() == 0.0 {
            // Direction is undefined at zero speed; re-establish it from the
            // previous heading before enforcing the floor
            self.velocity = self.forward * config.min_speed;
        } else {
            self.velocity = self
                .velocity
                .clamp_length_min_max(config.min_speed, config.max_speed);
        }
    }

    /// FOV cone test shared by the three flocking rules: strict cutoff, a
    /// flockmate exactly on the threshold is excluded
    fn visible(forward: Vec3, to_flockmate: Vec3, fov_threshold: f32) -> bool {
        forward.dot(to_flockmate.normalize()) > fov_threshold
    }

    /// Steer away from flockmates, weighted by proximity
    fn separate(&self, config: &FlockConfig, neighbors: &[Neighbor]) -> Vec3 {
        let mut steering = Vec3::ZERO;
        let mut flock_count = 0u32;

        for flockmate in neighbors {
            if flockmate.id == self.id {
                continue;
            }
            let offset = flockmate.position - self.position;
            if !Self::visible(self.forward, offset, config.separation_fov) {
                continue;
            }
            // 0 = at the edge of perception, 1 = on top of us; a flockmate
            // reported outside the nominal radius (collision-shape overlap)
            // is skipped rather than given a negative weight
            let proximity = 1.0 - offset.length() / config.perception_radius;
            if proximity < 0.0 {
                continue;
            }
            steering += (self.position - flockmate.position).normalize() * proximity;
            flock_count += 1;
        }

        if flock_count == 0 {
            return Vec3::ZERO;
        }
        steering *= 1.0 / flock_count as f32;
        (steering.normalize() - self.velocity.normalize()) * config.separation_strength
    }

    /// Steer toward the average heading of visible flockmates
    fn align(&self, config: &FlockConfig, neighbors: &[Neighbor]) -> Vec3 {
        let mut steering = Vec3::ZERO;
        let mut flock_count = 0u32;

        for flockmate in neighbors {
            if flockmate.id == self.id {
                continue;
            }
            let offset = flockmate.position - self.position;
            if !Self::visible(self.forward, offset, config.alignment_fov) {
                continue;
            }
            steering += flockmate.velocity.normalize();
            flock_count += 1;
        }

        if flock_count == 0 {
            return Vec3::ZERO;
        }
        steering *= 1.0 / flock_count as f32;
        (steering.normalize() - self.velocity.normalize()) * config.alignment_strength
    }

    /// Steer toward the center of mass of visible flockmates
    fn group_up(&self, config: &FlockConfig, neighbors: &[Neighbor]) -> Vec3 {
        let mut average_position = Vec3::ZERO;
        let mut flock_count = 0u32;

        for flockmate in neighbors {
            if flockmate.id == self.id {
                continue;
            }
            let offset = flockmate.position - self.position;
            if !Self::visible(self.forward, offset, config.cohesion_fov) {
                continue;
            }
            average_position += flockmate.position;
            flock_count += 1;
        }

        if flock_count == 0 {
            return Vec3::ZERO;
        }
        average_position *= 1.0 / flock_count as f32;
        ((average_position - self.position).normalize() - self.velocity.normalize())
            * config.cohesion_strength
    }

    /// Whether the forward sensor reports an incoming collision
    ///
    /// A hit against an obstacle the body already overlaps is ignored so an
    /// agent spawned inside geometry does not read as permanently trapped.
    fn is_obstacle_ahead(&self, config: &FlockConfig, probe: &dyn ObstacleProbe) -> bool {
        let first = match config.avoidance_sensors.first() {
            Some(sensor) => *sensor,
            None => return false,
        };
        let rotation = Quat::rotation_arc(first, self.forward);
        let direction = rotation.rotate(first);
        match probe.trace(self.position, direction, config.sensor_range) {
            Some(hit) => !probe.overlaps(self.position, config.body_radius, hit.obstacle),
            None => false,
        }
    }

    /// Steering force away from the obstacle, from the first clear sensor
    ///
    /// Sensor order is probe priority. Returns zero when every direction is
    /// blocked: no escape route this tick.
    fn avoid_obstacle(&self, config: &FlockConfig, probe: &dyn ObstacleProbe) -> Vec3 {
        let first = match config.avoidance_sensors.first() {
            Some(sensor) => *sensor,
            None => return Vec3::ZERO,
        };
        let rotation = Quat::rotation_arc(first, self.forward);
        for sensor in &config.avoidance_sensors {
            let direction = rotation.rotate(*sensor);
            if probe
                .trace(self.position, direction, config.sensor_range)
                .is_none()
            {
                return (direction.normalize() - self.velocity.normalize())
                    * config.avoidance_strength;
            }
        }
        Vec3::ZERO
    }
}
