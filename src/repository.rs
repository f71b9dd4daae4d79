use crate::{
    error::RepoError,
    models::{Note, NoteFilter, NoteInput, User},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    QueryBuilder, Sqlite, SqlitePool,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{str::FromStr, sync::Arc, time::Duration};

/// Schema migrations, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const NOTE_COLUMNS: &str =
    "id, title, content, tags, saved, user_id, created_at, updated_at";

/// Repository Trait
///
/// The persistence contract used by the handlers and the auth gate. Every note
/// mutation takes the acting user's id and only touches rows that user owns,
/// so ownership holds at the storage layer even if a handler forgets to check.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i64) -> Result<Option<User>, RepoError>;
    // Exact, case-sensitive match.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
    /// Fails with [`RepoError::UsernameTaken`] if the username exists.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, RepoError>;

    // --- Notes ---
    /// The owner's notes in the filter's saved-state, optionally narrowed by a
    /// case-insensitive substring match on the selected column.
    async fn list_notes(&self, user_id: i64, filter: &NoteFilter) -> Result<Vec<Note>, RepoError>;
    /// Any note by id, regardless of owner. Callers enforce ownership.
    async fn get_note(&self, id: i64) -> Result<Option<Note>, RepoError>;
    /// New notes are always unsaved.
    async fn create_note(&self, user_id: i64, input: NoteInput) -> Result<Note, RepoError>;
    /// Owner-only. `None` if the note is missing or owned by someone else.
    async fn update_note(
        &self,
        id: i64,
        user_id: i64,
        input: NoteInput,
    ) -> Result<Option<Note>, RepoError>;
    /// Owner-only. `true` if a row was removed.
    async fn delete_note(&self, id: i64, user_id: i64) -> Result<bool, RepoError>;
    /// Owner-only. Sets `saved = true`; `true` if the note matched.
    async fn save_note(&self, id: i64, user_id: i64) -> Result<bool, RepoError>;
}

/// RepositoryState
///
/// The shared handle stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

/// Open a SQLite pool. In-memory databases are pinned to a single, never
/// recycled connection, since each connection would otherwise see its own
/// empty database.
pub async fn connect_pool(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if db_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_options.connect_with(options).await
}

/// SqliteRepository
///
/// [`Repository`] backed by a SQLite pool.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn get_user(&self, id: i64) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM user WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM user WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// create_user
    ///
    /// Relies on the `UNIQUE` constraint rather than a prior lookup, so two
    /// racing registrations for one name cannot both succeed.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO user (username, password_hash) VALUES (?, ?)
             RETURNING id, username, password_hash",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => RepoError::UsernameTaken,
            other => RepoError::Database(other),
        })
    }

    /// list_notes
    ///
    /// Built with `QueryBuilder` so the optional search clause stays
    /// parameterized. The column name comes from a closed enum, never from
    /// user input.
    async fn list_notes(&self, user_id: i64, filter: &NoteFilter) -> Result<Vec<Note>, RepoError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        builder.push(NOTE_COLUMNS);
        builder.push(" FROM note WHERE user_id = ");
        builder.push_bind(user_id);
        builder.push(" AND saved = ");
        builder.push_bind(filter.view.saved_flag());

        if let Some(pattern) = filter.like_pattern() {
            builder.push(" AND LOWER(");
            builder.push(filter.search_type.column());
            builder.push(") LIKE ");
            builder.push_bind(pattern);
            builder.push(r" ESCAPE '\'");
        }

        builder.push(" ORDER BY created_at DESC, id DESC");

        let notes = builder
            .build_query_as::<Note>()
            .fetch_all(&self.pool)
            .await?;
        Ok(notes)
    }

    async fn get_note(&self, id: i64) -> Result<Option<Note>, RepoError> {
        let note = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM note WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(note)
    }

    async fn create_note(&self, user_id: i64, input: NoteInput) -> Result<Note, RepoError> {
        let now = Utc::now();
        let note = sqlx::query_as::<_, Note>(&format!(
            "INSERT INTO note (title, content, tags, saved, user_id, created_at, updated_at)
             VALUES (?, ?, ?, 0, ?, ?, ?)
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(input.title)
        .bind(input.content)
        .bind(input.tags)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(note)
    }

    /// update_note
    ///
    /// Replaces title, content and tags wholesale; the saved-flag is untouched.
    async fn update_note(
        &self,
        id: i64,
        user_id: i64,
        input: NoteInput,
    ) -> Result<Option<Note>, RepoError> {
        let note = sqlx::query_as::<_, Note>(&format!(
            "UPDATE note SET title = ?, content = ?, tags = ?, updated_at = ?
             WHERE id = ? AND user_id = ?
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(input.title)
        .bind(input.content)
        .bind(input.tags)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(note)
    }

    async fn delete_note(&self, id: i64, user_id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM note WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_note(&self, id: i64, user_id: i64) -> Result<bool, RepoError> {
        let result =
            sqlx::query("UPDATE note SET saved = 1, updated_at = ? WHERE id = ? AND user_id = ?")
                .bind(Utc::now())
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
