/// Authoritative entity collections: players, food, obstacles.
///
/// The store is the sole owner of every entity. The spatial index only ever
/// holds identifiers plus a cached position, so every helper here that moves,
/// inserts, or removes an entity also keeps the index in sync, preserving the
/// store/index bijection invariant the simulation step depends on.
use std::collections::HashMap;

use super::config::{self, radius_for_mass, speed_for_mass, ObstacleSpec};
use super::spatial::{EntityKind, SpatialIndex};

pub type PlayerId = u32;
pub type FoodId = u32;
pub type ObstacleId = u32;

/// A connected, alive avatar.
#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: &'static str,
    pub x: f64,
    pub y: f64,
    pub mass: f64,
    /// Latest `move` target; motion integration steers towards this point.
    pub target_x: f64,
    pub target_y: f64,
    /// Tick count remaining on an active boost window, 0 when inactive.
    pub boost_ticks_remaining: u32,
}

impl Player {
    pub fn radius(&self) -> f64 {
        radius_for_mass(self.mass)
    }

    pub fn speed(&self) -> f64 {
        speed_for_mass(self.mass)
    }

    pub fn is_boosting(&self) -> bool {
        self.boost_ticks_remaining > 0
    }
}

/// A consumable mass pellet.
#[derive(Clone, Debug)]
pub struct Food {
    pub id: FoodId,
    pub x: f64,
    pub y: f64,
    pub mass: f64,
    pub color: &'static str,
}

/// A static, never-mutated axis-aligned rectangle.
#[derive(Clone, Debug)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Owns players, food, and obstacles; the spatial index is kept alongside so
/// mutation helpers can maintain the bijection invariant in one place.
pub struct EntityStore {
    pub players: HashMap<PlayerId, Player>,
    pub food: HashMap<FoodId, Food>,
    pub obstacles: HashMap<ObstacleId, Obstacle>,
    pub index: SpatialIndex,
    next_player_id: PlayerId,
    next_food_id: FoodId,
}

impl EntityStore {
    pub fn new() -> Self {
        let mut store = EntityStore {
            players: HashMap::new(),
            food: HashMap::new(),
            obstacles: HashMap::new(),
            index: SpatialIndex::new(config::MAP_WIDTH, config::MAP_HEIGHT),
            next_player_id: 1,
            next_food_id: 1,
        };
        for (i, spec) in config::default_obstacles().into_iter().enumerate() {
            store.obstacles.insert(
                i as ObstacleId,
                Obstacle { id: i as ObstacleId, x: spec.x, y: spec.y, width: spec.width, height: spec.height },
            );
        }
        store
    }

    pub fn obstacle_specs(&self) -> Vec<ObstacleSpec> {
        self.obstacles
            .values()
            .map(|o| ObstacleSpec { x: o.x, y: o.y, width: o.width, height: o.height })
            .collect()
    }

    /// Insert a newly joined player at `x, y` and index it. The color is
    /// assigned from the fixed palette by hashing the freshly issued id.
    pub fn insert_player(&mut self, name: String, x: f64, y: f64) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        let player = Player {
            id,
            name,
            color: color_for_player(id),
            x,
            y,
            mass: config::PLAYER_START_MASS,
            target_x: x,
            target_y: y,
            boost_ticks_remaining: 0,
        };
        self.index.insert((EntityKind::Player, id), x, y);
        self.players.insert(id, player);
        id
    }

    /// Move a player and keep the spatial index in sync.
    pub fn move_player(&mut self, id: PlayerId, x: f64, y: f64) {
        if let Some(player) = self.players.get_mut(&id) {
            player.x = x;
            player.y = y;
            self.index.move_entity((EntityKind::Player, id), x, y);
        }
    }

    /// Remove a player from the store and index. Returns the removed player.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        self.index.remove((EntityKind::Player, id));
        self.players.remove(&id)
    }

    pub fn insert_food(&mut self, x: f64, y: f64) -> FoodId {
        let id = self.next_food_id;
        self.next_food_id += 1;
        self.index.insert((EntityKind::Food, id), x, y);
        self.food.insert(id, Food { id, x, y, mass: config::FOOD_MASS, color: food_color(id) });
        id
    }

    pub fn remove_food(&mut self, id: FoodId) -> Option<Food> {
        self.index.remove((EntityKind::Food, id));
        self.food.remove(&id)
    }

    pub fn alive_player_count(&self) -> usize {
        self.players.len()
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Food pellets cycle through the palette by id, independent of player colors.
fn food_color(id: FoodId) -> &'static str {
    config::COLOR_PALETTE[id as usize % config::COLOR_PALETTE.len()]
}

/// Assign a color from the fixed palette by hashing the player identifier.
pub fn color_for_player(id: PlayerId) -> &'static str {
    config::COLOR_PALETTE[id as usize % config::COLOR_PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_has_default_obstacles() {
        let store = EntityStore::new();
        assert_eq!(store.obstacles.len(), 5);
    }

    #[test]
    fn test_insert_player_indexes_it() {
        let mut store = EntityStore::new();
        let id = store.insert_player("Ann".to_string(), 100.0, 100.0);
        assert_eq!(store.players.len(), 1);
        let found = store.index.query_radius(100.0, 100.0, 1.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, (EntityKind::Player, id));
    }

    #[test]
    fn test_remove_player_clears_index() {
        let mut store = EntityStore::new();
        let id = store.insert_player("Ann".to_string(), 100.0, 100.0);
        store.remove_player(id);
        assert!(store.players.is_empty());
        assert!(store.index.query_radius(100.0, 100.0, 1.0).is_empty());
    }

    #[test]
    fn test_move_player_updates_index() {
        let mut store = EntityStore::new();
        let id = store.insert_player("Ann".to_string(), 0.0, 0.0);
        store.move_player(id, 1000.0, 1000.0);
        assert!(store.index.query_radius(0.0, 0.0, 1.0).is_empty());
        assert_eq!(store.index.query_radius(1000.0, 1000.0, 1.0).len(), 1);
    }

    #[test]
    fn test_food_insert_remove() {
        let mut store = EntityStore::new();
        let id = store.insert_food(5.0, 5.0);
        assert_eq!(store.food.len(), 1);
        store.remove_food(id);
        assert!(store.food.is_empty());
        assert!(store.index.query_radius(5.0, 5.0, 1.0).is_empty());
    }

    #[test]
    fn test_ids_not_reused() {
        let mut store = EntityStore::new();
        let a = store.insert_player("A".to_string(), 0.0, 0.0);
        store.remove_player(a);
        let b = store.insert_player("B".to_string(), 0.0, 0.0);
        assert_ne!(a, b);
    }
}
