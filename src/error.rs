use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::views;

/// Failures raised by the persistence layer.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Insert hit the `UNIQUE` constraint on `user.username`.
    #[error("username already taken")]
    UsernameTaken,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Terminal request failures that cannot be reported with a flash + redirect.
///
/// Everything user-correctable (bad credentials, ownership violations, duplicate
/// usernames) is handled in the handlers by redirecting with a flash message;
/// this type only covers the 404 page and internal faults.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Html(views::error_page("Not Found", "The requested note does not exist.")),
            )
                .into_response(),
            other => {
                // Internal detail stays in the logs.
                tracing::error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::error_page(
                        "Internal Server Error",
                        "Something went wrong. Please try again.",
                    )),
                )
                    .into_response()
            }
        }
    }
}
