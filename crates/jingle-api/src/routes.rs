//! API route definitions

use crate::handlers::{delete_user, edit_user, get_user, index, login, signup};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

/// Create account routes
pub fn api_routes() -> Router<Arc<AppState>> {
    // Public routes
    let public_routes = Router::new()
        .route("/", get(index))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/user", get(get_user));

    // Routes that check an auth key inside the handler
    let keyed_routes = Router::new()
        .route("/edit", put(edit_user))
        .route("/delete", delete(delete_user));

    Router::new().merge(public_routes).merge(keyed_routes)
}
