// World configuration: immutable parameters for one arena run.
//
// All values here are compile-time constants for this specification; the
// only thing the process picks up from the environment is the listening
// port (see `crate::config`).

/// World dimensions in pixels.
pub const MAP_WIDTH: f64 = 2000.0;
pub const MAP_HEIGHT: f64 = 2000.0;

/// Simulation ticks per second.
pub const TICK_RATE: u32 = 20;
pub const TICK_DURATION_SECS: f64 = 1.0 / TICK_RATE as f64;

/// Admission cap on alive players.
pub const MAX_PLAYERS: usize = 100;

/// Steady-state food population and per-pellet stats.
pub const FOOD_COUNT: usize = 200;
pub const FOOD_MASS: f64 = 1.0;
pub const FOOD_RADIUS: f64 = 5.0;

/// Player mass/size/speed model.
pub const PLAYER_START_MASS: f64 = 10.0;
pub const PLAYER_RADIUS_MULTIPLIER: f64 = 1.5; // k_r
pub const PLAYER_BASE_SPEED: f64 = 300.0; // v_0, px/s
pub const SPEED_MASS_EXPONENT: f64 = 0.5; // alpha

/// A eats B only if mass_A >= ratio * mass_B.
pub const EAT_MASS_RATIO: f64 = 1.1;

/// Uniform grid cell size for the spatial index.
pub const SPATIAL_CELL_SIZE: f64 = MAP_WIDTH / 10.0;

/// Boost: multiplicative speed burst and its window.
pub const BOOST_MULTIPLIER: f64 = 2.0;
pub const BOOST_DURATION_SECS: f64 = 0.5;

/// Motion integration treats movement below this as "arrived".
pub const ARRIVAL_EPSILON: f64 = 1.0;

/// Rejection-sampling attempts for spawn placement before giving up.
pub const SPAWN_PLACEMENT_ATTEMPTS: u32 = 20;

/// Tick driver catch-up cap: at most this many nominal ticks of simulated
/// time run in response to a single stall.
pub const MAX_DELTA_TICKS: f64 = 4.0;

/// Outstanding snapshots a client's outbound queue may hold before the
/// oldest are dropped.
pub const OUTBOUND_QUEUE_CAP: usize = 5;

/// Leaderboard size.
pub const LEADERBOARD_SIZE: usize = 10;

/// Fixed color palette assigned at spawn by hashing the player identifier.
pub const COLOR_PALETTE: &[&str] = &[
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6",
    "#bcf60c", "#fabebe",
];

/// Name sanitization limits.
pub const NAME_MAX_LEN: usize = 20;
pub const DEFAULT_NAME: &str = "Anonymous";

/// A static axis-aligned rectangle obstacle, opaque to players.
#[derive(Clone, Copy, Debug)]
pub struct ObstacleSpec {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Default safe-zone rectangles, roughly evenly spread over the map.
pub fn default_obstacles() -> Vec<ObstacleSpec> {
    vec![
        ObstacleSpec { x: 200.0, y: 200.0, width: 150.0, height: 150.0 },
        ObstacleSpec { x: 1650.0, y: 200.0, width: 150.0, height: 150.0 },
        ObstacleSpec { x: 925.0, y: 925.0, width: 150.0, height: 150.0 },
        ObstacleSpec { x: 200.0, y: 1650.0, width: 150.0, height: 150.0 },
        ObstacleSpec { x: 1650.0, y: 1650.0, width: 150.0, height: 150.0 },
    ]
}

/// Derived radius for a given mass: r = k_r * sqrt(mass).
#[inline]
pub fn radius_for_mass(mass: f64) -> f64 {
    PLAYER_RADIUS_MULTIPLIER * mass.sqrt()
}

/// Derived base speed (pre-boost) for a given mass: v = v_0 / mass^alpha.
#[inline]
pub fn speed_for_mass(mass: f64) -> f64 {
    PLAYER_BASE_SPEED / mass.powf(SPEED_MASS_EXPONENT)
}
