// Prometheus metrics for the arena server.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Live WebSocket connections.
    pub static ref CONNECTED_WEBSOCKETS: IntGauge =
        IntGauge::new("arena_connected_websockets", "Live WebSocket connections").unwrap();

    /// Alive players in the world right now.
    pub static ref ALIVE_PLAYERS: IntGauge =
        IntGauge::new("arena_alive_players", "Alive players in the world").unwrap();

    /// Food pellets in the world right now.
    pub static ref FOOD_COUNT: IntGauge =
        IntGauge::new("arena_food_count", "Food pellets in the world").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("arena_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    /// Total WebSocket messages sent to clients.
    pub static ref WEBSOCKET_MESSAGES_SENT_TOTAL: IntCounter = IntCounter::new(
        "arena_websocket_messages_sent_total",
        "Total WebSocket messages sent",
    )
    .unwrap();

    /// Total players admitted via `join`/`respawn`.
    pub static ref PLAYERS_JOINED_TOTAL: IntCounter =
        IntCounter::new("arena_players_joined_total", "Total players joined").unwrap();

    /// Total players eaten by another player.
    pub static ref PLAYERS_DIED_TOTAL: IntCounter =
        IntCounter::new("arena_players_died_total", "Total players eaten").unwrap();

    /// Total joins refused because the world was at MaxPlayers.
    pub static ref JOIN_REFUSED_TOTAL: IntCounter =
        IntCounter::new("arena_join_refused_total", "Total joins refused at admission cap").unwrap();

    /// Total food pellets eaten by a player.
    pub static ref FOOD_EATEN_TOTAL: IntCounter =
        IntCounter::new("arena_food_eaten_total", "Total food pellets eaten").unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// Per-tick simulation processing time in milliseconds.
    pub static ref TICK_DURATION_MS: Histogram = Histogram::with_opts(
        HistogramOpts::new("arena_tick_duration_ms", "Per-tick processing time in ms")
            .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0]),
    )
    .unwrap();

    /// API request duration in seconds, by endpoint.
    pub static ref API_REQUEST_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "arena_api_request_duration_seconds",
            "API request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CONNECTED_WEBSOCKETS.clone()),
        Box::new(ALIVE_PLAYERS.clone()),
        Box::new(FOOD_COUNT.clone()),
        Box::new(API_REQUESTS_TOTAL.clone()),
        Box::new(WEBSOCKET_MESSAGES_SENT_TOTAL.clone()),
        Box::new(PLAYERS_JOINED_TOTAL.clone()),
        Box::new(PLAYERS_DIED_TOTAL.clone()),
        Box::new(JOIN_REFUSED_TOTAL.clone()),
        Box::new(FOOD_EATEN_TOTAL.clone()),
        Box::new(TICK_DURATION_MS.clone()),
        Box::new(API_REQUEST_DURATION_SECONDS.clone()),
    ];

    for c in collectors {
        REGISTRY.register(c).expect("failed to register metric");
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Normalize a URL path for metric labels: replace numeric path segments with `:id`
/// to prevent cardinality explosion.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.parse::<i64>().is_ok() {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn test_normalize_path_with_ids() {
        assert_eq!(normalize_path("/api/players/42"), "/api/players/:id");
    }

    #[test]
    fn test_gather_metrics_returns_string() {
        register_metrics();
        let output = gather_metrics();
        assert!(output.is_empty() || output.contains("arena_"));
    }

    #[test]
    fn test_metric_increments() {
        CONNECTED_WEBSOCKETS.inc();
        CONNECTED_WEBSOCKETS.dec();

        ALIVE_PLAYERS.set(5);
        assert_eq!(ALIVE_PLAYERS.get(), 5);

        PLAYERS_JOINED_TOTAL.inc();
        PLAYERS_DIED_TOTAL.inc();
        FOOD_EATEN_TOTAL.inc();
        WEBSOCKET_MESSAGES_SENT_TOTAL.inc();

        TICK_DURATION_MS.observe(1.5);
        API_REQUEST_DURATION_SECONDS.observe(0.01);

        API_REQUESTS_TOTAL
            .with_label_values(&["GET", "/health", "200"])
            .inc();
    }
}
