use axum::extract::State;
use axum::routing::{any, get};
use axum::{Json, Router};
use serde::Serialize;

use crate::AppState;

pub mod gateway;
pub mod starhub;

const BANNER: &str = concat!(
    "UCdn Gateway — use /qwerty/<path> via rewrite",
    " or /api/qwerty?path=<path>\n",
);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/qwerty", any(gateway::handle))
        .route("/api/qwerty/", any(gateway::handle))
        .route("/api/qwerty/{*rest}", any(gateway::handle))
        .route("/qwerty", any(gateway::handle))
        .route("/qwerty/", any(gateway::handle))
        .route("/qwerty/{*rest}", any(gateway::handle))
        .route("/starhub", get(starhub::handle))
        .route("/starhub/", get(starhub::handle))
        .route("/starhub/{*rest}", get(starhub::handle))
        .route("/health", get(health))
        .fallback(index)
        .with_state(state)
}

async fn index() -> &'static str {
    BANNER
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub name: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub proxy_mode_ready: bool,
    pub anchor_ready: bool,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        proxy_mode_ready: state.relay.is_ready(),
        anchor_ready: state.anchor.is_some(),
    })
}
