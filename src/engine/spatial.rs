/// Uniform-grid spatial index over players and food.
///
/// Divides the world into square cells and tracks which entities occupy each
/// cell, so a radius query only has to look at the handful of cells the query
/// circle overlaps instead of scanning every entity in the world.
use std::collections::HashMap;

use super::config::SPATIAL_CELL_SIZE;

/// Distinguishes the two kinds of entity the index tracks. Obstacles are
/// static and never move, so they are not indexed here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Food,
}

/// A stable handle into the index: which kind of entity, and its id within
/// that kind's entity-store map.
pub type EntityKey = (EntityKind, u32);

#[derive(Clone, Debug)]
struct CellEntry {
    key: EntityKey,
    x: f64,
    y: f64,
}

/// A mutable uniform grid supporting insert/remove/move and radius queries.
///
/// Entities are looked up at most once per query: each lives in exactly one
/// cell at a time, and `query_radius` visits each overlapping cell once.
pub struct SpatialIndex {
    width: f64,
    height: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<CellEntry>>,
    cell_of: HashMap<EntityKey, usize>,
}

impl SpatialIndex {
    pub fn new(width: f64, height: f64) -> Self {
        let cols = ((width / SPATIAL_CELL_SIZE).ceil() as usize).max(1);
        let rows = ((height / SPATIAL_CELL_SIZE).ceil() as usize).max(1);
        SpatialIndex {
            width,
            height,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
            cell_of: HashMap::new(),
        }
    }

    /// Insert an entity at the given position. Replaces any prior entry for
    /// the same key.
    pub fn insert(&mut self, key: EntityKey, x: f64, y: f64) {
        self.remove(key);
        let idx = self.cell_index(x, y);
        self.cells[idx].push(CellEntry { key, x, y });
        self.cell_of.insert(key, idx);
    }

    /// Remove an entity from the index. No-op if it was not present.
    pub fn remove(&mut self, key: EntityKey) {
        if let Some(idx) = self.cell_of.remove(&key) {
            self.cells[idx].retain(|e| e.key != key);
        }
    }

    /// Update an entity's position, moving it between cells if needed.
    pub fn move_entity(&mut self, key: EntityKey, x: f64, y: f64) {
        let new_idx = self.cell_index(x, y);
        if let Some(&old_idx) = self.cell_of.get(&key) {
            if old_idx == new_idx {
                if let Some(entry) = self.cells[old_idx].iter_mut().find(|e| e.key == key) {
                    entry.x = x;
                    entry.y = y;
                }
                return;
            }
            self.cells[old_idx].retain(|e| e.key != key);
        }
        self.cells[new_idx].push(CellEntry { key, x, y });
        self.cell_of.insert(key, new_idx);
    }

    /// Return every entity whose center lies within `radius` of (x, y).
    /// Each matching entity is returned exactly once.
    pub fn query_radius(&self, x: f64, y: f64, radius: f64) -> Vec<(EntityKey, f64, f64)> {
        let (min_col, min_row) = self.cell_coords(x - radius, y - radius);
        let (max_col, max_row) = self.cell_coords(x + radius, y + radius);
        let radius_sq = radius * radius;

        let mut results = Vec::new();
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                let idx = row * self.cols + col;
                for entry in &self.cells[idx] {
                    let dx = entry.x - x;
                    let dy = entry.y - y;
                    if dx * dx + dy * dy <= radius_sq {
                        results.push((entry.key, entry.x, entry.y));
                    }
                }
            }
        }
        results
    }

    fn cell_index(&self, x: f64, y: f64) -> usize {
        let (col, row) = self.cell_coords(x, y);
        row * self.cols + col
    }

    fn cell_coords(&self, x: f64, y: f64) -> (usize, usize) {
        let cx = (x.clamp(0.0, self.width - 1.0) / SPATIAL_CELL_SIZE) as usize;
        let cy = (y.clamp(0.0, self.height - 1.0) / SPATIAL_CELL_SIZE) as usize;
        (cx.min(self.cols - 1), cy.min(self.rows - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_dimensions() {
        let idx = SpatialIndex::new(2000.0, 2000.0);
        assert_eq!(idx.cols, 10);
        assert_eq!(idx.rows, 10);
    }

    #[test]
    fn test_insert_and_query_radius() {
        let mut idx = SpatialIndex::new(2000.0, 2000.0);
        idx.insert((EntityKind::Player, 1), 500.0, 500.0);
        idx.insert((EntityKind::Food, 2), 505.0, 500.0);
        idx.insert((EntityKind::Food, 3), 1900.0, 1900.0);

        let found = idx.query_radius(500.0, 500.0, 10.0);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_query_returns_each_entity_once() {
        let mut idx = SpatialIndex::new(2000.0, 2000.0);
        idx.insert((EntityKind::Player, 1), 0.0, 0.0);
        let found = idx.query_radius(0.0, 0.0, 3000.0);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut idx = SpatialIndex::new(2000.0, 2000.0);
        let key = (EntityKind::Player, 1);
        idx.insert(key, 500.0, 500.0);
        idx.remove(key);
        assert!(idx.query_radius(500.0, 500.0, 50.0).is_empty());
    }

    #[test]
    fn test_move_entity_crosses_cell_boundary() {
        let mut idx = SpatialIndex::new(2000.0, 2000.0);
        let key = (EntityKind::Player, 1);
        idx.insert(key, 10.0, 10.0);
        idx.move_entity(key, 1990.0, 1990.0);

        assert!(idx.query_radius(10.0, 10.0, 5.0).is_empty());
        let found = idx.query_radius(1990.0, 1990.0, 5.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, key);
    }

    #[test]
    fn test_move_within_same_cell_updates_position() {
        let mut idx = SpatialIndex::new(2000.0, 2000.0);
        let key = (EntityKind::Player, 1);
        idx.insert(key, 500.0, 500.0);
        idx.move_entity(key, 510.0, 500.0);

        let found = idx.query_radius(510.0, 500.0, 1.0);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_coords_clamp_out_of_bounds() {
        let mut idx = SpatialIndex::new(2000.0, 2000.0);
        idx.insert((EntityKind::Player, 1), -500.0, -500.0);
        let found = idx.query_radius(0.0, 0.0, 5.0);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_reinsert_replaces_entry() {
        let mut idx = SpatialIndex::new(2000.0, 2000.0);
        let key = (EntityKind::Player, 1);
        idx.insert(key, 10.0, 10.0);
        idx.insert(key, 1000.0, 1000.0);

        assert!(idx.query_radius(10.0, 10.0, 5.0).is_empty());
        assert_eq!(idx.query_radius(1000.0, 1000.0, 5.0).len(), 1);
    }
}
