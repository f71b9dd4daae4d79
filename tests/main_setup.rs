use capture::{
    AppConfig,
    config::{DEFAULT_BIND_ADDR, DEFAULT_LOCAL_DB_URL, DEFAULT_SESSION_TTL_MINUTES, Env},
};
use serial_test::serial;
use std::{env, panic};

const CONFIG_VARS: [&str; 4] = ["APP_ENV", "DATABASE_URL", "BIND_ADDR", "SESSION_TTL_MINUTES"];

// --- Setup/Teardown Utilities ---

/// Run `test` with the given variables set (and every other config variable
/// cleared), restoring the original environment afterwards.
fn run_with_env<T, R>(vars: &[(&str, &str)], test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(key, val);
            } else {
                env::remove_var(key);
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    let result = panic::catch_unwind(|| {
        run_with_env(&[("APP_ENV", "production")], AppConfig::load)
    });

    assert!(
        result.is_err(),
        "Production config loading should panic without DATABASE_URL"
    );
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(&[("APP_ENV", "local")], AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.db_url, DEFAULT_LOCAL_DB_URL);
    assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
    assert_eq!(config.session_ttl_minutes, DEFAULT_SESSION_TTL_MINUTES);
}

#[test]
#[serial]
fn test_app_config_production_reads_env() {
    let config = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("DATABASE_URL", "sqlite:///var/lib/capture/notes.db"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("SESSION_TTL_MINUTES", "15"),
        ],
        AppConfig::load,
    );

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.db_url, "sqlite:///var/lib/capture/notes.db");
    assert_eq!(config.bind_addr, "127.0.0.1:8080");
    assert_eq!(config.session_ttl_minutes, 15);
}

#[test]
#[serial]
fn test_app_config_invalid_ttl_falls_back() {
    for bad in ["soon", "0", "-5"] {
        let config = run_with_env(&[("SESSION_TTL_MINUTES", bad)], AppConfig::load);
        assert_eq!(config.session_ttl_minutes, DEFAULT_SESSION_TTL_MINUTES, "{bad}");
    }
}
