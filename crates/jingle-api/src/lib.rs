//! Jingle API - REST server for user accounts
//!
//! Provides HTTP endpoints for signup, login, profile edits, deletion and
//! lookup on top of [`jingle_auth::AuthService`].

pub mod error;
pub mod extract;
pub mod handlers;
pub mod repository;
pub mod routes;
pub mod state;

use axum::{body::Body, http::Request, routing::get, Router};
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;

/// Build the application router around shared state
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Span for one request
///
/// Records the path only. Query strings carry auth keys and passwords.
fn request_span(request: &Request<Body>) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

/// Router over fresh in-memory state with a small hashing pool
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    create_router(Arc::new(AppState::for_testing()))
}
