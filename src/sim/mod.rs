//! Reference harness: snapshots the world and drives every agent's step
//!
//! The driver upholds the tick contract the steering core assumes: all
//! neighbor queries for a tick observe the state every agent had at the
//! start of that tick, never a mid-tick mixture. It does this by snapshotting
//! positions and velocities into the spatial grid first and only then
//! stepping the agents (in parallel; per-agent state is disjoint).

pub mod obstacles;
pub mod spatial;

use rand::Rng;
use rayon::prelude::*;
use tracing::warn;

use crate::flock::boid::{Boid, BoidId};
use crate::flock::config::{ConfigError, FlockConfig};
use crate::flock::perception::{Neighbor, NeighborQuery, ObstacleId};
use crate::flock::registry::FlockRegistry;
use crate::flock::spawner::PointSpawner;
use crate::util::vec3::Vec3;

use self::obstacles::ObstacleField;
use self::spatial::BoidGrid;

/// Per-worker neighbor buffer capacity
const NEIGHBOR_BUFFER_CAPACITY: usize = 64;

/// Aggregate flock statistics for logging and tuning
#[derive(Debug, Clone, Copy)]
pub struct FlockStats {
    pub count: usize,
    pub min_speed: f32,
    pub max_speed: f32,
    pub mean_speed: f32,
    pub centroid: Vec3,
    /// Mean distance from the centroid
    pub spread: f32,
}

/// One flock plus the world it flies through
pub struct Simulation {
    registry: FlockRegistry,
    boids: Vec<Boid>,
    grid: BoidGrid,
    obstacles: ObstacleField,
    tick: u64,
}

impl Simulation {
    /// Build a simulation around a validated flock configuration
    pub fn new(config: FlockConfig) -> Result<Self, ConfigError> {
        let cell_size = config.perception_radius;
        Ok(Self {
            registry: FlockRegistry::new(config)?,
            boids: Vec::new(),
            grid: BoidGrid::new(cell_size),
            obstacles: ObstacleField::new(),
            tick: 0,
        })
    }

    /// Spawn a flock at a point with random headings and speeds
    pub fn spawn_flock<R: Rng + ?Sized>(&mut self, origin: Vec3, count: usize, rng: &mut R) {
        let spawned = PointSpawner::new(origin).spawn(&mut self.registry, count, rng);
        self.boids.extend(spawned);
    }

    /// Insert an externally constructed boid
    ///
    /// A boid without a flock reference is accepted but inert; that state is
    /// surfaced once here rather than on every silent step.
    pub fn insert(&mut self, boid: Boid) {
        if boid.has_flock() {
            self.registry.add_member(boid.id());
        } else {
            warn!(boid = %boid.id(), "boid has no flock; its steps will be no-ops");
        }
        self.boids.push(boid);
    }

    /// Remove a boid and deregister its membership
    pub fn despawn(&mut self, id: BoidId) -> bool {
        let Some(index) = self.boids.iter().position(|b| b.id() == id) else {
            return false;
        };
        self.boids.swap_remove(index);
        self.registry.remove_member(id);
        true
    }

    /// Queue a one-shot force onto a boid for its next step
    pub fn apply_target_force(&mut self, id: BoidId, force: Vec3) -> bool {
        match self.boids.iter_mut().find(|b| b.id() == id) {
            Some(boid) => {
                boid.add_target_force(force);
                true
            }
            None => false,
        }
    }

    /// Advance the whole flock by one tick
    pub fn tick(&mut self, dt: f32) {
        let Self {
            registry,
            boids,
            grid,
            obstacles,
            ..
        } = self;

        // Pass 1: freeze the start-of-tick state into the grid
        grid.rebuild(boids.iter().map(|boid| Neighbor {
            id: boid.id(),
            position: boid.position,
            velocity: boid.velocity,
        }));
        let perception_radius = registry.read_config().perception_radius;

        // Pass 2: step every agent against the frozen snapshot
        let grid = &*grid;
        let obstacles = &*obstacles;
        boids.par_iter_mut().for_each_init(
            || Vec::with_capacity(NEIGHBOR_BUFFER_CAPACITY),
            |buffer, boid| {
                buffer.clear();
                grid.neighbors_within(boid.id(), boid.position, perception_radius, buffer);
                boid.step(dt, buffer.as_slice(), obstacles);
            },
        );

        self.tick += 1;
    }

    pub fn add_obstacle(&mut self, center: Vec3, radius: f32) -> ObstacleId {
        self.obstacles.add(center, radius)
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn registry(&self) -> &FlockRegistry {
        &self.registry
    }

    /// Validated configuration replacement between ticks
    pub fn set_config(&self, config: FlockConfig) -> Result<(), ConfigError> {
        self.registry.set_config(config)
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn boid(&self, id: BoidId) -> Option<&Boid> {
        self.boids.iter().find(|b| b.id() == id)
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Occupancy of the spatial grid as of the last tick
    pub fn grid_stats(&self) -> spatial::BoidGridStats {
        self.grid.stats()
    }

    /// Aggregate speed/position statistics over the current flock
    pub fn flock_stats(&self) -> FlockStats {
        if self.boids.is_empty() {
            return FlockStats {
                count: 0,
                min_speed: 0.0,
                max_speed: 0.0,
                mean_speed: 0.0,
                centroid: Vec3::ZERO,
                spread: 0.0,
            };
        }

        let count = self.boids.len();
        let inv_count = 1.0 / count as f32;
        let mut min_speed = f32::INFINITY;
        let mut max_speed: f32 = 0.0;
        let mut speed_sum = 0.0;
        let mut centroid = Vec3::ZERO;

        for boid in &self.boids {
            let speed = boid.velocity.length();
            min_speed = min_speed.min(speed);
            max_speed = max_speed.max(speed);
            speed_sum += speed;
            centroid += boid.position;
        }
        centroid *= inv_count;

        let spread = self
            .boids
            .iter()
            .map(|boid| boid.position.distance_to(centroid))
            .sum::<f32>()
            * inv_count;

        FlockStats {
            count,
            min_speed,
            max_speed,
            mean_speed: speed_sum * inv_count,
            centroid,
            spread,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flock::constants::tick::DT;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_config() -> FlockConfig {
        FlockConfig {
            min_speed: 10.0,
            max_speed: 50.0,
            perception_radius: 100.0,
            ..FlockConfig::default()
        }
    }

    fn seeded_simulation(seed: u64, count: usize) -> Simulation {
        let mut sim = Simulation::new(test_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        sim.spawn_flock(Vec3::ZERO, count, &mut rng);
        sim
    }

    #[test]
    fn test_spawn_registers_members() {
        let sim = seeded_simulation(1, 40);
        assert_eq!(sim.len(), 40);
        assert_eq!(sim.registry().len(), 40);
    }

    #[test]
    fn test_despawn_deregisters() {
        let mut sim = seeded_simulation(2, 10);
        let id = sim.boids()[3].id();

        assert!(sim.despawn(id));
        assert_eq!(sim.len(), 9);
        assert!(!sim.registry().contains(id));
        assert!(!sim.despawn(id), "second despawn must report false");
    }

    #[test]
    fn test_clamp_invariant_across_ticks() {
        let mut sim = seeded_simulation(3, 60);
        sim.add_obstacle(Vec3::new(200.0, 0.0, 0.0), 50.0);

        for _ in 0..100 {
            sim.tick(DT);
        }

        let (min_speed, max_speed) = {
            let config = sim.registry().read_config();
            (config.min_speed, config.max_speed)
        };
        for boid in sim.boids() {
            let speed = boid.velocity.length();
            assert!(
                (min_speed - 1e-2..=max_speed + 1e-2).contains(&speed),
                "boid speed {} escaped [{}, {}]",
                speed,
                min_speed,
                max_speed
            );
        }
    }

    #[test]
    fn test_determinism_for_identical_seeds() {
        let mut a = seeded_simulation(42, 50);
        let mut b = seeded_simulation(42, 50);

        for _ in 0..100 {
            a.tick(DT);
            b.tick(DT);
        }

        for (left, right) in a.boids().iter().zip(b.boids()) {
            assert_eq!(left.position, right.position);
            assert_eq!(left.velocity, right.velocity);
        }
    }

    #[test]
    fn test_target_force_applied_exactly_once() {
        let mut sim = seeded_simulation(5, 1);
        let id = sim.boids()[0].id();

        // Control twin with the same state but no injected force
        let mut control = seeded_simulation(5, 1);

        assert!(sim.apply_target_force(id, Vec3::new(0.0, 100.0, 0.0)));
        sim.tick(DT);
        control.tick(DT);

        let forced = sim.boids()[0].velocity;
        let unforced = control.boids()[0].velocity;
        assert_ne!(forced, unforced, "injected force must alter the step");

        // Once drained, both evolve identically from their own states
        sim.tick(DT);
        let before = sim.boids()[0].velocity;
        sim.tick(DT);
        // Free flight with no neighbors/obstacles: velocity is stable
        assert_eq!(sim.boids()[0].velocity, before);
    }

    #[test]
    fn test_apply_target_force_unknown_id() {
        let mut sim = seeded_simulation(6, 2);
        assert!(!sim.apply_target_force(uuid::Uuid::new_v4(), Vec3::X));
    }

    #[test]
    fn test_obstacle_deflects_boid() {
        let mut config = test_config();
        config.min_speed = 20.0;
        config.max_speed = 20.0;

        let build = |with_obstacle: bool| {
            let mut sim = Simulation::new(config.clone()).unwrap();
            if with_obstacle {
                sim.add_obstacle(Vec3::new(300.0, 0.0, 0.0), 80.0);
            }
            let boid = Boid::new(Vec3::ZERO, Vec3::new(20.0, 0.0, 0.0))
                .with_flock(sim.registry.handle());
            sim.insert(boid);
            sim
        };

        let mut blocked = build(true);
        let mut free = build(false);
        blocked.tick(DT);
        free.tick(DT);

        let deflected = blocked.boids()[0].velocity;
        let straight = free.boids()[0].velocity;
        assert_ne!(deflected, straight, "avoidance steering must engage");
        assert!(straight.approx_eq(Vec3::new(20.0, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn test_detached_boid_is_inert() {
        let mut sim = seeded_simulation(7, 0);
        let detached = Boid::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(5.0, 0.0, 0.0));
        let id = detached.id();
        sim.insert(detached);

        sim.tick(DT);

        let boid = sim.boid(id).unwrap();
        assert_eq!(boid.position, Vec3::new(1.0, 2.0, 3.0));
        assert!(!sim.registry().contains(id));
    }

    #[test]
    fn test_flock_stats() {
        let mut sim = Simulation::new(test_config()).unwrap();
        let handle = sim.registry.handle();
        sim.insert(Boid::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0)).with_flock(handle.clone()));
        sim.insert(Boid::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(30.0, 0.0, 0.0)).with_flock(handle));

        let stats = sim.flock_stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min_speed, 10.0);
        assert_eq!(stats.max_speed, 30.0);
        assert_eq!(stats.mean_speed, 20.0);
        assert!(stats.centroid.approx_eq(Vec3::ZERO, 1e-5));
        assert!((stats.spread - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_simulation_ticks() {
        let mut sim = Simulation::new(test_config()).unwrap();
        sim.tick(DT);
        assert_eq!(sim.current_tick(), 1);
        assert_eq!(sim.flock_stats().count, 0);
    }

    #[test]
    fn test_two_boids_drift_apart() {
        // Facing each other inside perception range, separation dominates
        let mut config = test_config();
        config.alignment_strength = 0.0;
        config.cohesion_strength = 0.0;
        config.avoidance_sensors = Vec::new();

        let mut sim = Simulation::new(config).unwrap();
        let handle = sim.registry.handle();
        sim.insert(
            Boid::new(Vec3::new(-25.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0))
                .with_flock(handle.clone()),
        );
        sim.insert(
            Boid::new(Vec3::new(25.0, 0.0, 0.0), Vec3::new(-10.0, 0.0, 0.0)).with_flock(handle),
        );

        let initial_gap = 50.0;
        for _ in 0..60 {
            sim.tick(DT);
        }
        let gap = sim.boids()[0].position.distance_to(sim.boids()[1].position);
        assert!(
            gap > initial_gap,
            "separation should widen the gap: {} <= {}",
            gap,
            initial_gap
        );
    }
}
