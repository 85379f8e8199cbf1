/// Wire-format snapshot types and the per-tick broadcast payload, matching
/// the event envelope in the external interface: an event name plus a JSON
/// payload, camelCase on the wire.
use serde::Serialize;

use super::config;
use super::entity::EntityStore;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub mass: f64,
    pub radius: f64,
    pub color: &'static str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSnapshot {
    pub id: String,
    pub x: i64,
    pub y: i64,
    pub radius: f64,
    pub color: &'static str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleSnapshot {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct LeaderEntry {
    pub name: String,
    pub mass: f64,
}

/// `{ event, payload }` envelope sent to clients; `#[serde(tag, content)]`
/// produces exactly that shape with each variant's name as the event string.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum ServerEvent {
    #[serde(rename = "player_joined")]
    PlayerJoined { player_id: String, player: PlayerSnapshot },
    #[serde(rename = "game_state")]
    GameState {
        players: Vec<PlayerSnapshot>,
        food: Vec<FoodSnapshot>,
        obstacles: Vec<ObstacleSnapshot>,
        leaderboard: Vec<LeaderEntry>,
    },
    #[serde(rename = "player_died")]
    PlayerDied { player_id: String },
}

pub fn player_snapshot(store: &EntityStore, id: super::entity::PlayerId) -> Option<PlayerSnapshot> {
    store.players.get(&id).map(|p| PlayerSnapshot {
        id: p.id.to_string(),
        name: p.name.clone(),
        x: p.x,
        y: p.y,
        mass: p.mass,
        radius: p.radius(),
        color: p.color,
    })
}

/// Build the full per-tick `game_state` event from the current store state.
pub fn build_game_state(store: &EntityStore) -> ServerEvent {
    let mut players: Vec<PlayerSnapshot> = store
        .players
        .values()
        .map(|p| PlayerSnapshot {
            id: p.id.to_string(),
            name: p.name.clone(),
            x: p.x,
            y: p.y,
            mass: p.mass,
            radius: p.radius(),
            color: p.color,
        })
        .collect();
    players.sort_by_key(|p| p.id.clone());

    let food: Vec<FoodSnapshot> = store
        .food
        .values()
        .map(|f| FoodSnapshot {
            id: f.id.to_string(),
            x: f.x.round() as i64,
            y: f.y.round() as i64,
            radius: config::FOOD_RADIUS,
            color: f.color,
        })
        .collect();

    let obstacles: Vec<ObstacleSnapshot> = store
        .obstacles
        .values()
        .map(|o| ObstacleSnapshot { x: o.x, y: o.y, width: o.width, height: o.height })
        .collect();

    let leaderboard = build_leaderboard(store);

    ServerEvent::GameState { players, food, obstacles, leaderboard }
}

/// Top-`LEADERBOARD_SIZE` alive players by mass descending, identifier
/// ascending tie-break.
pub fn build_leaderboard(store: &EntityStore) -> Vec<LeaderEntry> {
    let mut players: Vec<_> = store.players.values().collect();
    players.sort_by(|a, b| {
        b.mass
            .partial_cmp(&a.mass)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    players
        .into_iter()
        .take(config::LEADERBOARD_SIZE)
        .map(|p| LeaderEntry { name: p.name.clone(), mass: p.mass })
        .collect()
}
