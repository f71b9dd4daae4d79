use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::FromRow;

/// Maximum length (in characters) of a note title.
pub const MAX_TITLE_LEN: usize = 100;
/// Maximum length (in characters) of a note's tag string.
pub const MAX_TAGS_LEN: usize = 100;
/// Maximum length (in characters) of a username.
pub const MAX_USERNAME_LEN: usize = 150;

// --- Core Records (Mapped to Database) ---

/// User
///
/// An account row from the `user` table. The password is only ever held as an
/// Argon2 PHC string; the plaintext never reaches this struct.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    // Unique, compared byte-for-byte.
    pub username: String,
    pub password_hash: String,
}

/// Note
///
/// A row from the `note` table. Every note belongs to exactly one user.
#[derive(Debug, Clone, FromRow, Default, PartialEq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    // Free text, may contain markup.
    pub content: String,
    // Comma separated by convention only.
    pub tags: Option<String>,
    pub saved: bool,
    // FK to user.id (owner).
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Form Payloads ---

/// NoteForm
///
/// Raw body of the create and edit forms. Fields default to empty so a missing
/// field surfaces as a validation flash instead of an extractor rejection.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NoteForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Option<String>,
}

/// NoteInput
///
/// A validated note payload, ready to be written by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoteInput {
    pub title: String,
    pub content: String,
    pub tags: Option<String>,
}

impl NoteForm {
    /// Checks presence and column limits. Blank tags collapse to `None`.
    pub fn validate(self) -> Result<NoteInput, &'static str> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err("Title is required.");
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err("Title must be at most 100 characters.");
        }
        if self.content.trim().is_empty() {
            return Err("Content is required.");
        }

        let tags = self
            .tags
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if tags.as_ref().is_some_and(|t| t.chars().count() > MAX_TAGS_LEN) {
            return Err("Tags must be at most 100 characters.");
        }

        Ok(NoteInput {
            title,
            content: self.content,
            tags,
        })
    }
}

/// CredentialsForm
///
/// Body of both the registration and the login forms.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl CredentialsForm {
    /// Presence check only. The username is kept exactly as typed, since
    /// lookups are case-sensitive and exact.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.is_empty() {
            return Err("Username is required.");
        }
        if self.username.chars().count() > MAX_USERNAME_LEN {
            return Err("Username must be at most 150 characters.");
        }
        if self.password.is_empty() {
            return Err("Password is required.");
        }
        Ok(())
    }
}

// --- Search & Filtering ---

/// Which note column a search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchType {
    #[default]
    Title,
    Tags,
}

impl SearchType {
    /// Unrecognised or missing selectors fall back to a title search.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("tags") => Self::Tags,
            _ => Self::Title,
        }
    }

    /// The `note` column this selector searches.
    pub fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Tags => "tags",
        }
    }
}

/// The two listing pages. Each one shows exactly one saved-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteView {
    /// `/`: notes not yet saved.
    Home,
    /// `/saved`: notes marked as saved.
    Saved,
}

impl NoteView {
    pub fn saved_flag(self) -> bool {
        matches!(self, Self::Saved)
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Saved => "/saved",
        }
    }
}

/// SearchParams
///
/// Query string accepted by `/` and `/saved`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchParams {
    pub query: Option<String>,
    pub search_type: Option<String>,
}

/// NoteFilter
///
/// A fully resolved listing request: which view, and an optional trimmed,
/// non-empty query against one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFilter {
    pub view: NoteView,
    pub query: Option<String>,
    pub search_type: SearchType,
}

impl NoteFilter {
    pub fn new(view: NoteView, params: SearchParams) -> Self {
        let query = params
            .query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        Self {
            view,
            query,
            search_type: SearchType::parse(params.search_type.as_deref()),
        }
    }

    /// ASCII-lowercased `LIKE` pattern for the query, with `\`, `%` and `_`
    /// escaped so they only match themselves (used with `ESCAPE '\'`).
    /// Folding matches SQLite's `LOWER`, which only folds ASCII.
    pub fn like_pattern(&self) -> Option<String> {
        self.query.as_ref().map(|q| {
            let mut pattern = String::with_capacity(q.len() + 2);
            pattern.push('%');
            for c in q.to_ascii_lowercase().chars() {
                if matches!(c, '\\' | '%' | '_') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }
}
