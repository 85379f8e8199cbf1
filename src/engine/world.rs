/// The arena map: bounds, static obstacles, and the geometry helpers the
/// simulation step needs to keep players out of them and to place spawns.
use rand::Rng;

use super::config::{self, ObstacleSpec};

/// The static part of the world: its bounds and obstacle rectangles.
pub struct World {
    pub width: f64,
    pub height: f64,
    pub obstacles: Vec<ObstacleSpec>,
}

impl World {
    pub fn new() -> Self {
        World {
            width: config::MAP_WIDTH,
            height: config::MAP_HEIGHT,
            obstacles: config::default_obstacles(),
        }
    }

    /// True if a circle centered at (x, y) with the given radius overlaps
    /// obstacle `o` at all (including edge contact).
    pub fn circle_overlaps_obstacle(x: f64, y: f64, radius: f64, o: &ObstacleSpec) -> bool {
        let nearest_x = x.clamp(o.x, o.x + o.width);
        let nearest_y = y.clamp(o.y, o.y + o.height);
        let dx = x - nearest_x;
        let dy = y - nearest_y;
        dx * dx + dy * dy < radius * radius
    }

    /// Push (x, y) out of obstacle `o` so the circle of the given radius just
    /// touches its boundary, by projecting along the axis of minimum
    /// penetration. Assumes the circle's center already overlaps `o`.
    pub fn resolve_obstacle(x: f64, y: f64, radius: f64, o: &ObstacleSpec) -> (f64, f64) {
        let left = x - o.x;
        let right = (o.x + o.width) - x;
        let top = y - o.y;
        let bottom = (o.y + o.height) - y;

        let min = left.min(right).min(top).min(bottom);
        if min == left {
            (o.x - radius, y)
        } else if min == right {
            (o.x + o.width + radius, y)
        } else if min == top {
            (x, o.y - radius)
        } else {
            (x, o.y + o.height + radius)
        }
    }

    /// Clamp a player center so its circle stays within the map bounds.
    pub fn clamp_to_bounds(&self, x: f64, y: f64, radius: f64) -> (f64, f64) {
        (
            x.clamp(radius, (self.width - radius).max(radius)),
            y.clamp(radius, (self.height - radius).max(radius)),
        )
    }

    /// Rejection-sample a spawn point for a player with `radius`, clear of
    /// every obstacle and every existing alive player. Gives up and returns
    /// the last candidate after `config::SPAWN_PLACEMENT_ATTEMPTS` tries.
    pub fn find_spawn_point(
        &self,
        radius: f64,
        existing: &[(f64, f64, f64)],
        rng: &mut impl Rng,
    ) -> (f64, f64) {
        let mut candidate = (self.width / 2.0, self.height / 2.0);
        for _ in 0..config::SPAWN_PLACEMENT_ATTEMPTS {
            let x = rng.gen_range(radius..=(self.width - radius).max(radius));
            let y = rng.gen_range(radius..=(self.height - radius).max(radius));
            candidate = (x, y);

            let blocked_by_obstacle = self
                .obstacles
                .iter()
                .any(|o| Self::circle_overlaps_obstacle(x, y, radius, o));
            if blocked_by_obstacle {
                continue;
            }
            let blocked_by_player = existing.iter().any(|&(ox, oy, orad)| {
                let dx = x - ox;
                let dy = y - oy;
                let min_dist = radius + orad;
                dx * dx + dy * dy < min_dist * min_dist
            });
            if blocked_by_player {
                continue;
            }
            return candidate;
        }
        candidate
    }

    /// Uniform random point anywhere inside the map interior; used for food
    /// respawn, which ignores obstacle overlap by design.
    pub fn random_point(&self, rng: &mut impl Rng) -> (f64, f64) {
        (rng.gen_range(0.0..self.width), rng.gen_range(0.0..self.height))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
