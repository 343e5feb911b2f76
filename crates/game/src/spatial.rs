use std::collections::HashMap;

use glam::Vec2;

use crate::entity::EntityId;

pub const DEFAULT_CELL_SIZE: f32 = 8.0;

/// Uniform cell-hash index over entity positions. Callers must mirror
/// every entity create, move, and remove into the grid in the same
/// operation; a stale entry here means ghost collisions and missed
/// nearby-entity queries.
#[derive(Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<EntityId>>,
    positions: HashMap<EntityId, Vec2>,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    fn cell_of(&self, position: Vec2) -> (i32, i32) {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    /// Insert and update are the same operation: the entry lands in the
    /// cell for `position` whether or not the id was tracked before.
    pub fn insert(&mut self, id: EntityId, position: Vec2) {
        self.update(id, position);
    }

    pub fn update(&mut self, id: EntityId, position: Vec2) {
        let new_cell = self.cell_of(position);
        match self.positions.insert(id, position) {
            None => {
                self.cells.entry(new_cell).or_default().push(id);
            }
            Some(old) => {
                let old_cell = self.cell_of(old);
                if old_cell == new_cell {
                    return;
                }
                if let Some(bucket) = self.cells.get_mut(&old_cell) {
                    bucket.retain(|other| *other != id);
                    if bucket.is_empty() {
                        self.cells.remove(&old_cell);
                    }
                }
                self.cells.entry(new_cell).or_default().push(id);
            }
        }
    }

    pub fn remove(&mut self, id: EntityId) {
        let Some(position) = self.positions.remove(&id) else {
            return;
        };
        let cell = self.cell_of(position);
        if let Some(bucket) = self.cells.get_mut(&cell) {
            bucket.retain(|other| *other != id);
            if bucket.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.positions.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.positions.clear();
    }

    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        let min = self.cell_of(center - Vec2::splat(radius));
        let max = self.cell_of(center + Vec2::splat(radius));
        let radius_sq = radius * radius;

        let mut hits = Vec::new();
        for cx in min.0..=max.0 {
            for cy in min.1..=max.1 {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for id in bucket {
                    let Some(position) = self.positions.get(id) else {
                        continue;
                    };
                    if center.distance_squared(*position) <= radius_sq {
                        hits.push(*id);
                    }
                }
            }
        }
        hits.sort_unstable();
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_radius() {
        let mut grid = SpatialGrid::default();
        grid.insert(1, Vec2::new(0.0, 0.0));
        grid.insert(2, Vec2::new(3.0, 4.0));
        grid.insert(3, Vec2::new(100.0, 100.0));

        assert_eq!(grid.query_radius(Vec2::ZERO, 6.0), vec![1, 2]);
        assert_eq!(grid.query_radius(Vec2::ZERO, 1.0), vec![1]);
    }

    #[test]
    fn test_update_moves_between_cells() {
        let mut grid = SpatialGrid::new(4.0);
        grid.insert(7, Vec2::new(1.0, 1.0));
        grid.update(7, Vec2::new(50.0, 50.0));

        assert!(grid.query_radius(Vec2::new(1.0, 1.0), 3.0).is_empty());
        assert_eq!(grid.query_radius(Vec2::new(50.0, 50.0), 3.0), vec![7]);
    }

    #[test]
    fn test_remove_clears_the_entry() {
        let mut grid = SpatialGrid::default();
        grid.insert(9, Vec2::new(2.0, 2.0));
        grid.remove(9);

        assert!(!grid.contains(9));
        assert!(grid.query_radius(Vec2::new(2.0, 2.0), 5.0).is_empty());
    }
}
