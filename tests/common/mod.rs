#![allow(dead_code)]

use async_trait::async_trait;
use axum::{http::header, response::Response};
use capture::{
    AppConfig, AppState, RepoError,
    models::{Note, NoteFilter, NoteInput, SearchType, User},
    repository::Repository,
};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tower_sessions::{MemoryStore, Session};

// --- IN-MEMORY MOCK REPOSITORY ---

#[derive(Default)]
struct MockData {
    users: Vec<User>,
    notes: Vec<Note>,
    next_user_id: i64,
    next_note_id: i64,
}

/// Vec-backed `Repository` with the same owner scoping as the SQLite one,
/// so handler tests can check state after a call.
#[derive(Default)]
pub struct MockRepo {
    data: Mutex<MockData>,
}

impl MockRepo {
    pub fn insert_user(&self, username: &str, password_hash: &str) -> User {
        let mut data = self.data.lock().unwrap();
        data.next_user_id += 1;
        let user = User {
            id: data.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        data.users.push(user.clone());
        user
    }

    pub fn insert_note(&self, user_id: i64, title: &str, tags: Option<&str>, saved: bool) -> Note {
        let mut data = self.data.lock().unwrap();
        data.next_note_id += 1;
        let note = Note {
            id: data.next_note_id,
            title: title.to_string(),
            content: format!("content of {title}"),
            tags: tags.map(String::from),
            saved,
            user_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        data.notes.push(note.clone());
        note
    }

    pub fn note(&self, id: i64) -> Option<Note> {
        self.data.lock().unwrap().notes.iter().find(|n| n.id == id).cloned()
    }

    pub fn notes(&self) -> Vec<Note> {
        self.data.lock().unwrap().notes.clone()
    }

    pub fn user(&self, username: &str) -> Option<User> {
        self.data
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn get_user(&self, id: i64) -> Result<Option<User>, RepoError> {
        Ok(self.data.lock().unwrap().users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self.user(username))
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, RepoError> {
        if self.user(username).is_some() {
            return Err(RepoError::UsernameTaken);
        }
        Ok(self.insert_user(username, password_hash))
    }

    async fn list_notes(&self, user_id: i64, filter: &NoteFilter) -> Result<Vec<Note>, RepoError> {
        let needle = filter.query.as_ref().map(|q| q.to_ascii_lowercase());
        let notes = self
            .data
            .lock()
            .unwrap()
            .notes
            .iter()
            .filter(|n| n.user_id == user_id && n.saved == filter.view.saved_flag())
            .filter(|n| match &needle {
                None => true,
                Some(q) => {
                    let haystack = match filter.search_type {
                        SearchType::Title => Some(n.title.as_str()),
                        SearchType::Tags => n.tags.as_deref(),
                    };
                    haystack.is_some_and(|h| h.to_ascii_lowercase().contains(q.as_str()))
                }
            })
            .cloned()
            .collect();
        Ok(notes)
    }

    async fn get_note(&self, id: i64) -> Result<Option<Note>, RepoError> {
        Ok(self.note(id))
    }

    async fn create_note(&self, user_id: i64, input: NoteInput) -> Result<Note, RepoError> {
        let mut note = self.insert_note(user_id, &input.title, input.tags.as_deref(), false);
        note.content = input.content;
        let mut data = self.data.lock().unwrap();
        if let Some(stored) = data.notes.iter_mut().find(|n| n.id == note.id) {
            *stored = note.clone();
        }
        Ok(note)
    }

    async fn update_note(
        &self,
        id: i64,
        user_id: i64,
        input: NoteInput,
    ) -> Result<Option<Note>, RepoError> {
        let mut data = self.data.lock().unwrap();
        Ok(data
            .notes
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .map(|n| {
                n.title = input.title;
                n.content = input.content;
                n.tags = input.tags;
                n.updated_at = Utc::now();
                n.clone()
            }))
    }

    async fn delete_note(&self, id: i64, user_id: i64) -> Result<bool, RepoError> {
        let mut data = self.data.lock().unwrap();
        let before = data.notes.len();
        data.notes.retain(|n| !(n.id == id && n.user_id == user_id));
        Ok(data.notes.len() < before)
    }

    async fn save_note(&self, id: i64, user_id: i64) -> Result<bool, RepoError> {
        let mut data = self.data.lock().unwrap();
        match data.notes.iter_mut().find(|n| n.id == id && n.user_id == user_id) {
            Some(n) => {
                n.saved = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// --- TEST UTILITIES ---

pub fn test_state(repo: Arc<MockRepo>) -> AppState {
    AppState {
        repo,
        config: AppConfig::default(),
    }
}

pub fn test_session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

/// `Location` header of a redirect response.
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
