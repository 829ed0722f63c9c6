//! File locations used by the server.
//!
//! ## Environment Variables
//!
//! - `DATA_DIR`: Override the base data directory (default: "data")
//!
//! Running isolated instances side by side:
//! ```bash
//! DATA_DIR=data/e2e PORT=3001 cargo run
//! ```

use std::env;
use std::sync::OnceLock;

/// Lazily initialized data directory from DATA_DIR env var
static DATA_DIR_VALUE: OnceLock<String> = OnceLock::new();

/// Get the base data directory (from DATA_DIR env var or default "data")
pub fn data_dir() -> &'static str {
    DATA_DIR_VALUE.get_or_init(|| env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
}

/// Default SQLite database path when neither config.toml nor env override it
pub fn default_db_path() -> String {
    format!("{}/coursequest.db", data_dir())
}

/// Optional TOML config file, read from the working directory
pub const CONFIG_FILE: &str = "config.toml";
