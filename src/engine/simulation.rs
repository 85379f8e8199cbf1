/// The simulation step: the fixed-order tick that advances the world by one
/// frame of elapsed time. Grounded on the teacher's `Game::tick()`
/// orchestration style — a sequence of `process_*` sub-steps run in a fixed
/// order every tick — generalized from creature/Lua bookkeeping to the
/// motion/collision/food model this spec defines.
use rand::Rng;
use tracing::debug;

use crate::metrics;

use super::config;
use super::entity::{EntityStore, PlayerId};
use super::spatial::EntityKind;
use super::world::World;

/// Events the simulation step produces for the broadcast layer to relay.
#[derive(Clone, Debug)]
pub enum SimEvent {
    PlayerDied { id: PlayerId },
}

/// Runs the ordered per-tick simulation step against an `EntityStore` and
/// `World`. Holds no state of its own beyond the injected RNG.
pub struct Simulation;

impl Simulation {
    /// Advance the world by `dt` seconds, in the fixed order the spec
    /// requires. Returns the events produced this tick.
    pub fn step(
        store: &mut EntityStore,
        world: &World,
        dt: f64,
        rng: &mut impl Rng,
    ) -> Vec<SimEvent> {
        Self::integrate_motion(store, dt);
        Self::clamp_to_bounds(store, world);
        Self::resolve_obstacles(store, world);
        // Steps 1-3 mutate positions directly; step 4 reconciles the index.
        Self::sync_spatial_index(store);
        Self::eat_food(store);
        let events = Self::eat_players(store);
        Self::replenish_food(store, world, rng);
        events
    }

    /// Step 1: motion integration, including the boost multiplier and its
    /// countdown.
    fn integrate_motion(store: &mut EntityStore, dt: f64) {
        for player in store.players.values_mut() {
            let dx = player.target_x - player.x;
            let dy = player.target_y - player.y;
            let dist = (dx * dx + dy * dy).sqrt();

            if player.boost_ticks_remaining > 0 {
                player.boost_ticks_remaining -= 1;
            }

            if dist < config::ARRIVAL_EPSILON {
                continue;
            }

            let mut speed = player.speed();
            if player.is_boosting() {
                speed *= config::BOOST_MULTIPLIER;
            }

            let step = (speed * dt).min(dist);
            player.x += dx / dist * step;
            player.y += dy / dist * step;
        }
    }

    /// Step 2: clamp every player's center so its circle stays on the map.
    fn clamp_to_bounds(store: &mut EntityStore, world: &World) {
        for player in store.players.values_mut() {
            let radius = player.radius();
            let (x, y) = world.clamp_to_bounds(player.x, player.y, radius);
            player.x = x;
            player.y = y;
        }
    }

    /// Step 3: push players out of any obstacle they now overlap.
    fn resolve_obstacles(store: &mut EntityStore, world: &World) {
        for player in store.players.values_mut() {
            let radius = player.radius();
            for obstacle in &world.obstacles {
                if World::circle_overlaps_obstacle(player.x, player.y, radius, obstacle) {
                    let (x, y) = World::resolve_obstacle(player.x, player.y, radius, obstacle);
                    player.x = x;
                    player.y = y;
                }
            }
        }
    }

    /// Step 4: reconcile the spatial index with every player's final
    /// position for this tick.
    fn sync_spatial_index(store: &mut EntityStore) {
        let moves: Vec<(PlayerId, f64, f64)> =
            store.players.values().map(|p| (p.id, p.x, p.y)).collect();
        for (id, x, y) in moves {
            store.index.move_entity((EntityKind::Player, id), x, y);
        }
    }

    /// Step 5: each player eats every food pellet within its radius,
    /// iterating players by ascending identifier.
    fn eat_food(store: &mut EntityStore) {
        let mut player_ids: Vec<PlayerId> = store.players.keys().copied().collect();
        player_ids.sort_unstable();

        for player_id in player_ids {
            let (px, py, radius) = {
                let p = &store.players[&player_id];
                (p.x, p.y, p.radius())
            };

            let candidates = store.index.query_radius(px, py, radius);
            let mut eaten_mass = 0.0;
            for (key, fx, fy) in candidates {
                if key.0 != EntityKind::Food {
                    continue;
                }
                let dx = fx - px;
                let dy = fy - py;
                if dx * dx + dy * dy <= radius * radius {
                    if let Some(food) = store.remove_food(key.1) {
                        eaten_mass += food.mass;
                        metrics::FOOD_EATEN_TOTAL.inc();
                    }
                }
            }
            if eaten_mass > 0.0 {
                store.players.get_mut(&player_id).unwrap().mass += eaten_mass;
            }
        }
    }

    /// Step 6: player-vs-player eating. Broad-phases the same way `eat_food`
    /// does: each player queries the spatial index around its own radius for
    /// nearby candidates, rather than scanning every other player. Whichever
    /// of a pair has the larger radius is guaranteed to see the other in its
    /// own query (the larger radius is always the predator's, since a bigger
    /// radius implies a bigger mass), so iterating every player once still
    /// finds every eligible pair regardless of identifier order. Iteration
    /// is in ascending identifier order for determinism, and each player
    /// eats, or is eaten, at most once per tick.
    fn eat_players(store: &mut EntityStore) -> Vec<SimEvent> {
        let mut ids: Vec<PlayerId> = store.players.keys().copied().collect();
        ids.sort_unstable();

        let mut has_eaten: std::collections::HashSet<PlayerId> = std::collections::HashSet::new();
        let mut events = Vec::new();

        for player_id in ids {
            if has_eaten.contains(&player_id) || !store.players.contains_key(&player_id) {
                continue;
            }

            let (px, py, radius, own_mass) = {
                let p = &store.players[&player_id];
                (p.x, p.y, p.radius(), p.mass)
            };

            let candidates = store.index.query_radius(px, py, radius);
            for (key, cx, cy) in candidates {
                if key.0 != EntityKind::Player || key.1 == player_id {
                    continue;
                }
                let other_id = key.1;
                if has_eaten.contains(&other_id) || !store.players.contains_key(&other_id) {
                    continue;
                }

                let other_mass = store.players[&other_id].mass;
                if own_mass == other_mass {
                    continue; // tie: no eat
                }

                let dx = cx - px;
                let dy = cy - py;
                let d = (dx * dx + dy * dy).sqrt();

                let (predator, predator_radius, predator_mass, prey, prey_mass) =
                    if own_mass > other_mass {
                        (player_id, radius, own_mass, other_id, other_mass)
                    } else {
                        let other_radius = store.players[&other_id].radius();
                        (other_id, other_radius, other_mass, player_id, own_mass)
                    };

                if predator_mass < config::EAT_MASS_RATIO * prey_mass {
                    continue;
                }
                if d >= predator_radius {
                    continue; // prey's center must lie inside the predator's radius
                }

                store.players.get_mut(&predator).unwrap().mass += prey_mass;
                store.remove_player(prey);
                has_eaten.insert(predator);
                events.push(SimEvent::PlayerDied { id: prey });
                debug!(predator, prey, "player eaten");

                if predator == player_id || prey == player_id {
                    break; // player_id has eaten, or been eaten, this tick
                }
            }
        }

        events
    }

    /// Step 7: top up food to the steady-state count. No obstacle rejection
    /// by design (see design notes on preserved source behavior).
    fn replenish_food(store: &mut EntityStore, world: &World, rng: &mut impl Rng) {
        while store.food.len() < config::FOOD_COUNT {
            let (x, y) = world.random_point(rng);
            store.insert_food(x, y);
        }
    }
}
