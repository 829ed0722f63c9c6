pub mod courses;
pub mod enrollments;
pub mod game_modules;
pub mod schema;
pub mod users;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Re-export all public items from submodules
pub use courses::*;
pub use enrollments::*;
pub use game_modules::*;
pub use schema::run_migrations;
pub use users::*;

pub type DbPool = Arc<Mutex<Connection>>;

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
    /// Log the error at warn level and return the default
    fn log_warn_default(self, context: &str) -> T
    where
        T: Default;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }

    fn log_warn_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                T::default()
            }
        }
    }
}

/// Error returned when database lock cannot be acquired
#[derive(Debug)]
pub struct DbLockError;

impl std::fmt::Display for DbLockError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Database unavailable")
  }
}

impl std::error::Error for DbLockError {}

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, DbLockError> {
  pool.lock().map_err(|_: PoisonError<_>| {
    tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
    DbLockError
  })
}

fn configure(conn: &Connection) -> Result<()> {
  conn.execute_batch("PRAGMA foreign_keys = ON;")
}

/// Open (creating if needed) the database file and bring the schema up to date
pub fn init_db(path: &Path) -> Result<DbPool> {
  if let Some(parent) = path.parent() {
    if let Err(e) = std::fs::create_dir_all(parent) {
      tracing::warn!("Could not create {}: {}", parent.display(), e);
    }
  }

  let conn = Connection::open(path)?;
  configure(&conn)?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

/// Fresh in-memory database with the full schema (tests, demos)
pub fn open_in_memory() -> Result<DbPool> {
  let conn = Connection::open_in_memory()?;
  configure(&conn)?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

/// Timestamps are stored as RFC 3339 text
pub(crate) fn to_db_time(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub(crate) fn parse_db_time(s: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .ok()
    .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a NOT NULL timestamp column, surfacing corrupt values as a conversion error
pub(crate) fn required_db_time(idx: usize, s: String) -> Result<DateTime<Utc>> {
  parse_db_time(&s).ok_or_else(|| {
    rusqlite::Error::FromSqlConversionFailure(
      idx,
      rusqlite::types::Type::Text,
      format!("invalid timestamp: {}", s).into(),
    )
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use tempfile::TempDir;

  #[test]
  fn test_init_db_creates_file_and_schema() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("test.db");
    let pool = init_db(&path).unwrap();
    assert!(path.exists());

    let conn = try_lock(&pool).unwrap();
    assert_eq!(schema::get_schema_version(&conn).unwrap(), schema::SCHEMA_VERSION);
  }

  #[test]
  fn test_init_db_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.db");
    drop(init_db(&path).unwrap());
    let pool = init_db(&path).unwrap();
    let conn = try_lock(&pool).unwrap();
    let versions: i64 = conn
      .query_row("SELECT COUNT(*) FROM db_version", [], |row| row.get(0))
      .unwrap();
    assert_eq!(versions, schema::SCHEMA_VERSION as i64);
  }

  #[test]
  fn test_time_round_trip() {
    let dt = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(parse_db_time(&to_db_time(dt)), Some(dt));
    assert_eq!(parse_db_time("yesterday"), None);
    assert!(required_db_time(0, "garbage".to_string()).is_err());
  }

  #[test]
  fn test_log_warn_default() {
    let failed: std::result::Result<i64, String> = Err("boom".to_string());
    assert_eq!(failed.log_warn_default("counting"), 0);
    let ok: std::result::Result<i64, String> = Ok(4);
    assert_eq!(ok.log_warn("counting"), Some(4));
  }
}
