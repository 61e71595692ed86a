//! Spatial hash grid for neighbor queries
//!
//! Divides the world into uniform cubic cells and stores start-of-tick boid
//! snapshots in each cell. A sphere query scans just the cells the sphere
//! can touch and distance-filters the contents.

use hashbrown::HashMap;

use crate::flock::boid::BoidId;
use crate::flock::perception::{Neighbor, NeighborQuery};
use crate::util::vec3::Vec3;

/// Grid cell key - (x, y, z) cell coordinates
pub type CellKey = (i32, i32, i32);

/// Initial capacity for the cell hashmap (number of expected non-empty cells)
const GRID_INITIAL_CAPACITY: usize = 256;

/// Initial capacity for snapshot vectors within cells
const CELL_INITIAL_CAPACITY: usize = 8;

/// Uniform spatial hash grid over boid snapshots
pub struct BoidGrid {
    /// Cell size in world units; queries stay correct for any radius, but
    /// a cell size near the perception radius keeps the scan at 27 cells
    cell_size: f32,
    /// Inverse cell size for fast position-to-cell conversion
    inv_cell_size: f32,
    cells: HashMap<CellKey, Vec<Neighbor>>,
}

impl BoidGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::with_capacity(GRID_INITIAL_CAPACITY),
        }
    }

    /// Clear all snapshots, keeping cell allocations for reuse
    #[inline]
    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
    }

    #[inline]
    fn position_to_cell(&self, position: Vec3) -> CellKey {
        (
            (position.x * self.inv_cell_size).floor() as i32,
            (position.y * self.inv_cell_size).floor() as i32,
            (position.z * self.inv_cell_size).floor() as i32,
        )
    }

    #[inline]
    pub fn insert(&mut self, snapshot: Neighbor) {
        let cell_key = self.position_to_cell(snapshot.position);
        self.cells
            .entry(cell_key)
            .or_insert_with(|| Vec::with_capacity(CELL_INITIAL_CAPACITY))
            .push(snapshot);
    }

    /// Rebuild the grid from a fresh tick snapshot
    pub fn rebuild(&mut self, snapshots: impl Iterator<Item = Neighbor>) {
        self.clear();
        for snapshot in snapshots {
            self.insert(snapshot);
        }
    }

    /// Get statistics about the grid
    pub fn stats(&self) -> BoidGridStats {
        let non_empty_cells = self.cells.values().filter(|c| !c.is_empty()).count();
        let total_boids: usize = self.cells.values().map(|c| c.len()).sum();
        let max_per_cell = self.cells.values().map(|c| c.len()).max().unwrap_or(0);

        BoidGridStats {
            non_empty_cells,
            total_boids,
            max_per_cell,
        }
    }
}

impl NeighborQuery for BoidGrid {
    fn neighbors_within(&self, of: BoidId, origin: Vec3, radius: f32, out: &mut Vec<Neighbor>) {
        let (cx, cy, cz) = self.position_to_cell(origin);
        // A point within `radius` can be at most this many cells away along
        // each axis
        let span = (radius * self.inv_cell_size).ceil() as i32;
        let radius_sq = radius * radius;

        for dx in -span..=span {
            for dy in -span..=span {
                for dz in -span..=span {
                    let Some(cell) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for snapshot in cell {
                        if snapshot.id != of
                            && snapshot.position.distance_sq_to(origin) <= radius_sq
                        {
                            out.push(*snapshot);
                        }
                    }
                }
            }
        }
    }
}

/// Statistics about the grid occupancy
#[derive(Debug, Clone)]
pub struct BoidGridStats {
    pub non_empty_cells: usize,
    pub total_boids: usize,
    pub max_per_cell: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn snapshot(x: f32, y: f32, z: f32) -> Neighbor {
        Neighbor {
            id: Uuid::new_v4(),
            position: Vec3::new(x, y, z),
            velocity: Vec3::X,
        }
    }

    #[test]
    fn test_new_grid() {
        let grid = BoidGrid::new(300.0);
        assert_eq!(grid.cell_size, 300.0);
        assert!((grid.inv_cell_size - 1.0 / 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_insert_and_query() {
        let mut grid = BoidGrid::new(100.0);
        let mate = snapshot(50.0, 50.0, 50.0);
        grid.insert(mate);

        let mut found = Vec::new();
        grid.neighbors_within(Uuid::new_v4(), Vec3::new(40.0, 50.0, 50.0), 20.0, &mut found);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, mate.id);
    }

    #[test]
    fn test_query_excludes_self() {
        let mut grid = BoidGrid::new(100.0);
        let me = snapshot(10.0, 10.0, 10.0);
        grid.insert(me);

        let mut found = Vec::new();
        grid.neighbors_within(me.id, me.position, 50.0, &mut found);
        assert!(found.is_empty());
    }

    #[test]
    fn test_query_filters_by_exact_distance() {
        let mut grid = BoidGrid::new(100.0);
        grid.insert(snapshot(30.0, 0.0, 0.0));
        grid.insert(snapshot(80.0, 0.0, 0.0)); // same cell, outside radius

        let mut found = Vec::new();
        grid.neighbors_within(Uuid::new_v4(), Vec3::ZERO, 50.0, &mut found);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].position.x, 30.0);
    }

    #[test]
    fn test_query_spans_cell_boundaries() {
        let mut grid = BoidGrid::new(100.0);
        // Neighboring cells on each side of the origin cell
        grid.insert(snapshot(-40.0, 0.0, 0.0));
        grid.insert(snapshot(140.0, 0.0, 0.0));
        grid.insert(snapshot(60.0, 90.0, -80.0));

        let mut found = Vec::new();
        grid.neighbors_within(Uuid::new_v4(), Vec3::new(50.0, 0.0, 0.0), 150.0, &mut found);
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_query_radius_larger_than_cell() {
        // Radius several times the cell size still finds distant snapshots
        let mut grid = BoidGrid::new(50.0);
        grid.insert(snapshot(220.0, 0.0, 0.0));

        let mut found = Vec::new();
        grid.neighbors_within(Uuid::new_v4(), Vec3::ZERO, 250.0, &mut found);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut grid = BoidGrid::new(100.0);
        grid.insert(snapshot(10.0, 0.0, 0.0));

        let fresh = [snapshot(0.0, 20.0, 0.0), snapshot(0.0, -20.0, 0.0)];
        grid.rebuild(fresh.into_iter());

        let mut found = Vec::new();
        grid.neighbors_within(Uuid::new_v4(), Vec3::ZERO, 500.0, &mut found);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|n| n.position.x == 0.0));
    }

    #[test]
    fn test_stats() {
        let mut grid = BoidGrid::new(100.0);
        for _ in 0..3 {
            grid.insert(snapshot(10.0, 10.0, 10.0));
        }
        grid.insert(snapshot(500.0, 500.0, 500.0));

        let stats = grid.stats();
        assert_eq!(stats.total_boids, 4);
        assert_eq!(stats.non_empty_cells, 2);
        assert_eq!(stats.max_per_cell, 3);
    }
}
