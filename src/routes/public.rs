use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Account creation, session establishment and teardown. None of these read
/// or write notes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET/POST /register
        // Form, then account creation. Duplicate usernames are rejected.
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        // GET/POST /login
        // Form, then credential check and session creation.
        .route("/login", get(handlers::login_form).post(handlers::login))
        // GET /logout
        .route("/logout", get(handlers::logout))
}
