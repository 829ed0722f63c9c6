//! Application configuration.
//!
//! Values are resolved with priority: config.toml > environment (.env) > default.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::paths;

// ==================== Defaults ====================

/// Server address to bind to
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Server port
pub const DEFAULT_PORT: u16 = 3000;

/// Session lifetime in hours (1 week)
pub const DEFAULT_SESSION_HOURS: i64 = 24 * 7;

/// XP awarded by a lesson when the author does not set one
pub const DEFAULT_LESSON_XP: i64 = 10;

/// XP awarded by a game module when the author does not set one
pub const DEFAULT_MODULE_XP: i64 = 10;

/// Largest XP an author may attach to a lesson or game module
pub const MAX_XP_REWARD: i64 = 10_000;

/// Minimum accepted password length at sign-up
pub const MIN_PASSWORD_LEN: usize = 8;

// ==================== config.toml ====================

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    database: Option<DatabaseSection>,
    server: Option<ServerSection>,
    session: Option<SessionSection>,
}

#[derive(Debug, Deserialize)]
struct DatabaseSection {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct SessionSection {
    hours: Option<i64>,
}

/// Resolved runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub session_hours: i64,
}

impl Config {
    /// Load configuration from `config.toml` in the working directory and the environment.
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();
        Self::load_from(Path::new(paths::CONFIG_FILE), |key| std::env::var(key).ok())
    }

    /// Resolve configuration from an explicit file path and environment lookup.
    pub fn load_from(config_path: &Path, env: impl Fn(&str) -> Option<String>) -> Self {
        let file = match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Ignoring malformed {}: {}", config_path.display(), e);
                    FileConfig::default()
                }
            },
            Err(_) => FileConfig::default(),
        };

        let database_path = file
            .database
            .and_then(|d| d.path)
            .or_else(|| env("DATABASE_PATH"))
            .unwrap_or_else(paths::default_db_path);

        let (file_host, file_port) = file
            .server
            .map(|s| (s.host, s.port))
            .unwrap_or((None, None));

        let host = file_host
            .or_else(|| env("HOST"))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = file_port
            .or_else(|| env("PORT").and_then(|p| p.parse().ok()))
            .unwrap_or(DEFAULT_PORT);

        let session_hours = file
            .session
            .and_then(|s| s.hours)
            .or_else(|| env("SESSION_HOURS").and_then(|h| h.parse().ok()))
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_SESSION_HOURS);

        tracing::info!("Using database at {}", database_path);

        Config {
            database_path: PathBuf::from(database_path),
            host,
            port,
            session_hours,
        }
    }

    /// Full server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: PathBuf::from(paths::default_db_path()),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            session_hours: DEFAULT_SESSION_HOURS,
        }
    }
}
