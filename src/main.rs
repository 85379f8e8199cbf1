#![allow(dead_code)]

mod api;
mod config;
mod engine;
mod metrics;

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::Response,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use config::Config;
use engine::server::GameServer;

/// Axum middleware that records per-request metrics (count and duration).
async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = metrics::normalize_path(req.uri().path());

    let start = std::time::Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();

    metrics::API_REQUESTS_TOTAL.with_label_values(&[&method, &path, &status]).inc();
    metrics::API_REQUEST_DURATION_SECONDS.with_label_values(&[&path]).observe(elapsed);

    response
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    metrics::register_metrics();

    let cfg = Config::load();

    let game_server = Arc::new(GameServer::start());

    let app: Router = api::router(game_server)
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(metrics_middleware));

    let addr = format!("0.0.0.0:{}", cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", addr));

    tracing::info!("arena server listening on port {}", cfg.port);
    axum::serve(listener, app).await.expect("Failed to start server");
}
