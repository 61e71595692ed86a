//! What an agent can know about the world around it
//!
//! The steering core never walks the world itself: the harness hands each
//! step a list of [`Neighbor`] snapshots taken at the start of the tick, and
//! an [`ObstacleProbe`] for forward sensor traces. Both sides of that
//! contract live here.

use crate::flock::boid::BoidId;
use crate::util::vec3::Vec3;

/// Identifier for entities in the avoidance collision category
pub type ObstacleId = u64;

/// Read-only flockmate snapshot captured at the start of a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: BoidId,
    pub position: Vec3,
    pub velocity: Vec3,
}

/// A blocking hit reported by a sensor trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleHit {
    pub obstacle: ObstacleId,
    /// Distance from the trace origin to the hit point
    pub distance: f32,
}

/// Ray probe against the avoidance collision category
///
/// Agents never appear in this category; only obstacles do.
pub trait ObstacleProbe {
    /// Trace from `origin` along unit `direction` up to `range`, returning
    /// the nearest blocking hit if any.
    fn trace(&self, origin: Vec3, direction: Vec3, range: f32) -> Option<ObstacleHit>;

    /// Whether a body sphere at `position` already overlaps `obstacle`.
    /// Used to ignore hits the agent is trapped inside of.
    fn overlaps(&self, position: Vec3, radius: f32, obstacle: ObstacleId) -> bool;
}

/// Probe with nothing to hit
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObstacles;

impl ObstacleProbe for NoObstacles {
    fn trace(&self, _origin: Vec3, _direction: Vec3, _range: f32) -> Option<ObstacleHit> {
        None
    }

    fn overlaps(&self, _position: Vec3, _radius: f32, _obstacle: ObstacleId) -> bool {
        false
    }
}

/// Sphere-volume neighbor query supplied by the harness
///
/// Implementations fill `out` with every *other* agent whose position lies
/// within `radius` of `origin`, excluding the querying agent itself.
pub trait NeighborQuery {
    fn neighbors_within(&self, of: BoidId, origin: Vec3, radius: f32, out: &mut Vec<Neighbor>);
}
