//! Health check handlers

use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Auth keys currently held, expired ones included until the next sweep
    pub active_keys: usize,
    pub hash_workers: usize,
}

/// Liveness probe - basic health check
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_secs(),
        active_keys: state.auth.keys().len(),
        hash_workers: state.auth.pool().worker_count(),
    })
}

/// Landing text for the API root
pub async fn index() -> &'static str {
    "Please visit http://www.github.com/jguthrie100/jingle-demo for information about this API"
}
