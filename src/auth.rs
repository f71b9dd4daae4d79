use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{
    error::AppError,
    flash::{self, FlashCategory},
    repository::RepositoryState,
};

/// Session key holding the authenticated user's id.
pub const SESSION_USER_KEY: &str = "user_id";

/// AuthUser
///
/// The resolved identity of a logged-in request. Taking this as a handler
/// argument is what puts a route behind the auth gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

/// AuthUser Extractor Implementation
///
/// 1. Reuses an identity the auth route layer already stored in the request
///    extensions.
/// 2. Otherwise reads the user id from the session.
/// 3. Confirms the user still exists in the store.
///
/// Rejection: a `303` to `/login` with a warning flash. Store or session
/// faults reject with the 500 page instead.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already resolved by the route layer for this request.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match resolve(&session, &RepositoryState::from_ref(state)).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(login_required(&session).await),
            Err(e) => Err(e.into_response()),
        }
    }
}

async fn resolve(session: &Session, repo: &RepositoryState) -> Result<Option<AuthUser>, AppError> {
    let Some(user_id) = session.get::<i64>(SESSION_USER_KEY).await? else {
        return Ok(None);
    };

    match repo.get_user(user_id).await? {
        Some(user) => Ok(Some(AuthUser {
            id: user.id,
            username: user.username,
        })),
        None => {
            // Session outlived its account row.
            tracing::warn!(user_id, "session refers to unknown user");
            session.remove::<i64>(SESSION_USER_KEY).await?;
            Ok(None)
        }
    }
}

async fn login_required(session: &Session) -> Response {
    match flash::push(session, FlashCategory::Warning, "Please log in to access this page.").await
    {
        Ok(()) => Redirect::to("/login").into_response(),
        Err(e) => e.into_response(),
    }
}

/// Establish an authenticated session. The session id is rotated first so a
/// pre-login id cannot be reused after login.
pub async fn login_session(session: &Session, user_id: i64) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.insert(SESSION_USER_KEY, user_id).await?;
    Ok(())
}

/// Drop every session value, identity and pending flashes included.
pub async fn logout_session(session: &Session) -> Result<(), AppError> {
    session.flush().await?;
    Ok(())
}
