//! Static sphere obstacles forming the avoidance collision category
//!
//! The field implements [`ObstacleProbe`]: sensor traces are ray/sphere
//! intersections, and the overlap test backs the "already inside this
//! shape" exemption in the steering core.

use crate::flock::perception::{ObstacleHit, ObstacleId, ObstacleProbe};
use crate::util::vec3::Vec3;

/// One blocking sphere in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereObstacle {
    pub id: ObstacleId,
    pub center: Vec3,
    pub radius: f32,
}

/// Collection of sphere obstacles with stable ids
#[derive(Debug, Default)]
pub struct ObstacleField {
    obstacles: Vec<SphereObstacle>,
    next_id: ObstacleId,
}

impl ObstacleField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sphere and return its id
    pub fn add(&mut self, center: Vec3, radius: f32) -> ObstacleId {
        let id = self.next_id;
        self.next_id += 1;
        self.obstacles.push(SphereObstacle { id, center, radius });
        id
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SphereObstacle> {
        self.obstacles.iter()
    }
}

impl ObstacleProbe for ObstacleField {
    fn trace(&self, origin: Vec3, direction: Vec3, range: f32) -> Option<ObstacleHit> {
        let mut nearest: Option<ObstacleHit> = None;
        for obstacle in &self.obstacles {
            let Some(distance) = ray_sphere(origin, direction, obstacle) else {
                continue;
            };
            if distance > range {
                continue;
            }
            if nearest.map_or(true, |hit| distance < hit.distance) {
                nearest = Some(ObstacleHit {
                    obstacle: obstacle.id,
                    distance,
                });
            }
        }
        nearest
    }

    fn overlaps(&self, position: Vec3, radius: f32, obstacle: ObstacleId) -> bool {
        self.obstacles
            .iter()
            .find(|o| o.id == obstacle)
            .map_or(false, |o| {
                position.distance_sq_to(o.center) <= (o.radius + radius).powi(2)
            })
    }
}

/// Distance along a unit-direction ray to a sphere, if it hits
///
/// An origin inside the sphere reports a hit at distance zero.
fn ray_sphere(origin: Vec3, direction: Vec3, sphere: &SphereObstacle) -> Option<f32> {
    let to_origin = origin - sphere.center;
    let b = to_origin.dot(direction);
    let c = to_origin.length_sq() - sphere.radius * sphere.radius;
    // Outside the sphere and pointing away from it
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some((-b - discriminant.sqrt()).max(0.0))
}
