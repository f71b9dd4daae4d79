use crate::{
    AppState,
    auth::{self, AuthUser},
    error::{AppError, RepoError},
    flash::{self, FlashCategory},
    models::{CredentialsForm, Note, NoteFilter, NoteForm, NoteView, SearchParams},
    password, views,
};
use axum::{
    Form,
    extract::{FromRequestParts, Path, Query, State},
    http::request::Parts,
    response::{Html, IntoResponse, Redirect, Response},
};
use tokio::sync::OnceCell;
use tower_sessions::Session;

type HandlerResult = Result<Response, AppError>;

/// Hash verified against when the username does not exist, so a failed login
/// costs the same whether or not the account is real.
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

async fn dummy_hash() -> Result<&'static str, AppError> {
    DUMMY_HASH
        .get_or_try_init(|| password::hash_password_blocking("capture-dummy-password".into()))
        .await
        .map(String::as_str)
}

/// NoteId
///
/// The `{id}` segment of the single-note routes. Anything that is not a valid
/// id names no note, so it rejects with the 404 page rather than a 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteId(pub i64);

impl<S> FromRequestParts<S> for NoteId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;
        raw.parse().map(NoteId).map_err(|_| AppError::NotFound)
    }
}

/// Queue a flash and redirect (`303 See Other`).
async fn redirect_with(
    session: &Session,
    category: FlashCategory,
    message: &str,
    to: &str,
) -> HandlerResult {
    flash::push(session, category, message).await?;
    Ok(Redirect::to(to).into_response())
}

/// Loads a note and applies the owner check. `Ok(Err(response))` carries the
/// redirect for a foreign note.
async fn owned_note(
    state: &AppState,
    session: &Session,
    user: &AuthUser,
    id: i64,
    action: &str,
) -> Result<Result<Note, Response>, AppError> {
    let note = state.repo.get_note(id).await?.ok_or(AppError::NotFound)?;
    if note.user_id != user.id {
        tracing::warn!(note_id = id, user_id = user.id, action, "ownership check failed");
        let message = format!("You do not have permission to {action} this note.");
        let redirect = redirect_with(session, FlashCategory::Error, &message, "/").await?;
        return Ok(Err(redirect));
    }
    Ok(Ok(note))
}

// --- Listing ---

async fn list_view(
    view: NoteView,
    user: AuthUser,
    state: AppState,
    session: Session,
    params: SearchParams,
) -> HandlerResult {
    let filter = NoteFilter::new(view, params);
    let notes = state.repo.list_notes(user.id, &filter).await?;
    tracing::debug!(user_id = user.id, ?filter, count = notes.len(), "listed notes");
    let flashes = flash::take(&session).await?;
    Ok(Html(views::notes_page(&user.username, &filter, &notes, &flashes)).into_response())
}

/// home
///
/// GET / : the user's unsaved notes, optionally searched by `query` and
/// `search_type`.
pub async fn home(
    user: AuthUser,
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<SearchParams>,
) -> HandlerResult {
    list_view(NoteView::Home, user, state, session, params).await
}

/// saved
///
/// GET /saved : the user's saved notes, same search parameters as `/`.
pub async fn saved(
    user: AuthUser,
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<SearchParams>,
) -> HandlerResult {
    list_view(NoteView::Saved, user, state, session, params).await
}

// --- Note CRUD ---

/// GET /notes/new
pub async fn new_note_form(user: AuthUser, session: Session) -> HandlerResult {
    let flashes = flash::take(&session).await?;
    Ok(Html(views::new_note_page(&user.username, &flashes)).into_response())
}

/// create_note
///
/// POST /notes/new : creates an unsaved note owned by the session user.
pub async fn create_note(
    user: AuthUser,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<NoteForm>,
) -> HandlerResult {
    let input = match form.validate() {
        Ok(input) => input,
        Err(message) => {
            return redirect_with(&session, FlashCategory::Error, message, "/notes/new").await;
        }
    };

    let note = state.repo.create_note(user.id, input).await?;
    tracing::info!(note_id = note.id, user_id = user.id, "note created");
    redirect_with(&session, FlashCategory::Success, "Note created successfully!", "/").await
}

/// GET /notes/{id}
pub async fn edit_note_form(
    user: AuthUser,
    State(state): State<AppState>,
    session: Session,
    NoteId(id): NoteId,
) -> HandlerResult {
    let note = match owned_note(&state, &session, &user, id, "edit").await? {
        Ok(note) => note,
        Err(redirect) => return Ok(redirect),
    };
    let flashes = flash::take(&session).await?;
    Ok(Html(views::edit_note_page(&user.username, &note, &flashes)).into_response())
}

/// update_note
///
/// POST /notes/{id} : replaces title, content and tags. Existence is checked
/// before ownership, so a missing note is a 404 for everyone.
pub async fn update_note(
    user: AuthUser,
    State(state): State<AppState>,
    session: Session,
    NoteId(id): NoteId,
    Form(form): Form<NoteForm>,
) -> HandlerResult {
    if let Err(redirect) = owned_note(&state, &session, &user, id, "edit").await? {
        return Ok(redirect);
    }

    let input = match form.validate() {
        Ok(input) => input,
        Err(message) => {
            let back = format!("/notes/{id}");
            return redirect_with(&session, FlashCategory::Error, message, &back).await;
        }
    };

    // Owner-scoped again in SQL; None here means the row vanished meanwhile.
    state
        .repo
        .update_note(id, user.id, input)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(note_id = id, user_id = user.id, "note updated");
    redirect_with(&session, FlashCategory::Success, "Note updated successfully!", "/").await
}

/// GET /notes/delete/{id} : permanent removal, owner only.
pub async fn delete_note(
    user: AuthUser,
    State(state): State<AppState>,
    session: Session,
    NoteId(id): NoteId,
) -> HandlerResult {
    if let Err(redirect) = owned_note(&state, &session, &user, id, "delete").await? {
        return Ok(redirect);
    }

    if !state.repo.delete_note(id, user.id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(note_id = id, user_id = user.id, "note deleted");
    redirect_with(&session, FlashCategory::Success, "Note deleted successfully!", "/").await
}

/// GET /notes/save/{id} : one-way; there is no unsave.
pub async fn save_note(
    user: AuthUser,
    State(state): State<AppState>,
    session: Session,
    NoteId(id): NoteId,
) -> HandlerResult {
    if let Err(redirect) = owned_note(&state, &session, &user, id, "save").await? {
        return Ok(redirect);
    }

    if !state.repo.save_note(id, user.id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(note_id = id, user_id = user.id, "note saved");
    redirect_with(&session, FlashCategory::Success, "Note saved successfully!", "/").await
}

// --- Accounts ---

/// GET /register
pub async fn register_form(session: Session) -> HandlerResult {
    let flashes = flash::take(&session).await?;
    Ok(Html(views::register_page(&flashes)).into_response())
}

/// register
///
/// POST /register : rejects an existing username (exact match), otherwise
/// stores an Argon2 hash of the password.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> HandlerResult {
    const TAKEN: &str = "Username already exists. Please choose a different one.";

    if let Err(message) = form.validate() {
        return redirect_with(&session, FlashCategory::Error, message, "/register").await;
    }

    if state.repo.get_user_by_username(&form.username).await?.is_some() {
        return redirect_with(&session, FlashCategory::Error, TAKEN, "/register").await;
    }

    let hash = password::hash_password_blocking(form.password).await?;
    match state.repo.create_user(&form.username, &hash).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "user registered");
            redirect_with(
                &session,
                FlashCategory::Success,
                "Registration successful! Please log in.",
                "/login",
            )
            .await
        }
        // Lost a race with a concurrent registration.
        Err(RepoError::UsernameTaken) => {
            redirect_with(&session, FlashCategory::Error, TAKEN, "/register").await
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /login
pub async fn login_form(session: Session) -> HandlerResult {
    let flashes = flash::take(&session).await?;
    Ok(Html(views::login_page(&flashes)).into_response())
}

/// login
///
/// POST /login : unknown usernames and wrong passwords get the same message.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> HandlerResult {
    const INVALID: &str = "Invalid username or password.";

    if let Err(message) = form.validate() {
        return redirect_with(&session, FlashCategory::Error, message, "/login").await;
    }

    let user = state.repo.get_user_by_username(&form.username).await?;
    let authenticated = match &user {
        Some(user) => {
            password::verify_password_blocking(form.password, user.password_hash.clone()).await?
        }
        None => {
            let dummy = dummy_hash().await?;
            password::verify_password_blocking(form.password, dummy.to_owned()).await?;
            false
        }
    };

    match user {
        Some(user) if authenticated => {
            auth::login_session(&session, user.id).await?;
            tracing::info!(user_id = user.id, "user logged in");
            redirect_with(&session, FlashCategory::Success, "Logged in successfully!", "/").await
        }
        _ => {
            tracing::info!("failed login attempt");
            redirect_with(&session, FlashCategory::Error, INVALID, "/login").await
        }
    }
}

/// GET /logout
pub async fn logout(session: Session) -> HandlerResult {
    auth::logout_session(&session).await?;
    redirect_with(&session, FlashCategory::Info, "You have been logged out.", "/login").await
}
