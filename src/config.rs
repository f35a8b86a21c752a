// src/config.rs

use std::{env, path::PathBuf, str::FromStr};

use dotenvy::dotenv;

/// Default length of a quiz session before it counts as abandoned (15 minutes).
pub const DEFAULT_SESSION_TIMEOUT_MS: u64 = 15 * 60 * 1000;

/// Default interval between two expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Maximum attempts per (identity, quiz) inside the rolling window.
pub const MAX_ATTEMPTS_PER_WINDOW: usize = 3;

/// Length of the rolling rate-limit window.
pub const ATTEMPT_WINDOW_HOURS: i64 = 24;

/// Passing percentage used when a quiz does not configure one.
pub const DEFAULT_PASSING_PERCENTAGE: f64 = 60.0;

/// Number of questions sampled per attempt when a quiz does not configure it.
pub const DEFAULT_QUESTIONS_TO_SHOW: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub session_timeout_ms: u64,
    pub sweep_interval_secs: u64,
    pub cors_origin: String,
    pub port: u16,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// Environment values that were ignored in favour of a default.
    /// Reported by `main` once logging is up.
    pub rejected_env: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let cors_origin = env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let mut rejected = Vec::new();
        // Tokens live for 7 days unless overridden.
        let jwt_expiration = parse_or("JWT_EXPIRATION", 7 * 24 * 60 * 60, &mut rejected);
        let session_timeout_ms =
            parse_or("ATTEMPT_SESSION_TIMEOUT_MS", DEFAULT_SESSION_TIMEOUT_MS, &mut rejected);
        let sweep_interval_secs = at_least_one_second(
            parse_or("SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS, &mut rejected),
            &mut rejected,
        );
        let port = parse_or("PORT", 5000, &mut rejected);

        Self {
            data_dir,
            jwt_secret,
            jwt_expiration,
            rust_log,
            session_timeout_ms,
            sweep_interval_secs,
            cors_origin,
            port,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            rejected_env: rejected,
        }
    }

    /// Session timeout as a chrono duration, the unit the lifecycle code works in.
    pub fn session_timeout(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.session_timeout_ms as i64)
    }
}

/// Reads and parses an environment variable, falling back to `default`
/// when it is missing or malformed.
fn parse_or<T: FromStr>(key: &str, default: T, rejected: &mut Vec<String>) -> T {
    parse_value(key, env::var(key).ok(), default, rejected)
}

fn parse_value<T: FromStr>(
    key: &str,
    raw: Option<String>,
    default: T,
    rejected: &mut Vec<String>,
) -> T {
    match raw {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            rejected.push(format!("{}={:?} is not a valid value", key, raw));
            default
        }),
        None => default,
    }
}

/// A zero sweep interval would spin; the sweep runs at most once a second.
fn at_least_one_second(secs: u64, rejected: &mut Vec<String>) -> u64 {
    if secs == 0 {
        rejected.push("SWEEP_INTERVAL_SECS=0 raised to 1".to_string());
        return 1;
    }
    secs
}
