// HTTP API routes: health check, metrics, and the game WebSocket upgrade.

pub mod ws;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

use crate::engine::server::GameServer;
use crate::metrics;

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub game_server: Arc<GameServer>,
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let health = state.game_server.health();
    Json(json!({
        "status": "healthy",
        "players": health.players,
        "food": health.food,
    }))
}

async fn metrics_handler() -> impl IntoResponse {
    let body = metrics::gather_metrics();
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(game_server: Arc<GameServer>) -> Router {
    let state = AppState { game_server };

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/ws", get(ws::ws_game))
        .with_state(state)
}
