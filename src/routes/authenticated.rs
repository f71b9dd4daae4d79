use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// All note operations. The router is wrapped in the auth layer in
/// `create_router`, and each handler additionally takes `AuthUser`, which it
/// uses for the owner checks on single-note routes.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /?query=...&search_type=title|tags
        // Unsaved notes of the session user.
        .route("/", get(handlers::home))
        // GET /saved?query=...&search_type=title|tags
        .route("/saved", get(handlers::saved))
        // GET/POST /notes/new
        .route(
            "/notes/new",
            get(handlers::new_note_form).post(handlers::create_note),
        )
        // GET/POST /notes/{id}
        // Edit form and update. Owner only.
        .route(
            "/notes/{id}",
            get(handlers::edit_note_form).post(handlers::update_note),
        )
        // GET /notes/delete/{id}
        .route("/notes/delete/{id}", get(handlers::delete_note))
        // GET /notes/save/{id}
        // Marks the note saved; it moves from `/` to `/saved`.
        .route("/notes/save/{id}", get(handlers::save_note))
}
