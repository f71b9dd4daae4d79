use std::env;

/// AppConfig
///
/// Immutable runtime configuration, read once at startup and shared through
/// `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // SQLite connection string.
    pub db_url: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Idle minutes before a session expires.
    pub session_ttl_minutes: i64,
    // Runtime environment marker. Controls log format and cookie security.
    pub env: Env,
}

/// Env
///
/// `Local` logs human-readable output and allows plain-HTTP cookies;
/// `Production` logs JSON and marks session cookies `Secure`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_LOCAL_DB_URL: &str = "sqlite://capture.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;

impl Default for AppConfig {
    /// Test configuration: an in-memory database and local settings, with no
    /// environment lookups.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `DATABASE_URL` is not set, so the service
    /// never silently starts against a throwaway local file.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let db_url = match env {
            Env::Production => {
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL must be set in production.")
            }
            Env::Local => {
                env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_LOCAL_DB_URL.to_string())
            }
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let session_ttl_minutes = env::var("SESSION_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_MINUTES);

        Self {
            db_url,
            bind_addr,
            session_ttl_minutes,
            env,
        }
    }
}
