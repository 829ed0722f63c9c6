//! Schema and version-gated migrations.
//!
//! Each migration checks the recorded version, runs inside a transaction and
//! records its version in `db_version`, so it runs exactly once per database.

use chrono::Utc;
use rusqlite::{params, Connection, Result};

/// Current schema version. Increment this when adding a new migration.
pub const SCHEMA_VERSION: i32 = 3;

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Bootstrap: ensure db_version table exists (needed to check version)
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS db_version (
      version INTEGER PRIMARY KEY,
      applied_at TEXT NOT NULL,
      description TEXT
    );
    "#,
  )?;

  let current_version = get_schema_version(conn)?;
  tracing::debug!("schema version: {}", current_version);

  if current_version < 1 {
    migrate_v0_to_v1(conn)?;
  }
  if current_version < 2 {
    migrate_v1_to_v2(conn)?;
  }
  if current_version < 3 {
    migrate_v2_to_v3(conn)?;
  }

  Ok(())
}

// ============================================================
// VERSION-GATED MIGRATIONS
// ============================================================

/// v0→v1: accounts, courses, lessons and enrollment tracking
fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
  tracing::info!("Running migration v0→v1: Create base tables");
  let tx = conn.unchecked_transaction()?;

  tx.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS users (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      email TEXT NOT NULL UNIQUE COLLATE NOCASE,
      password_hash TEXT NOT NULL,
      created_at TEXT NOT NULL,
      last_login_at TEXT
    );

    CREATE TABLE IF NOT EXISTS sessions (
      id TEXT PRIMARY KEY,
      user_id INTEGER NOT NULL,
      created_at TEXT NOT NULL,
      expires_at TEXT NOT NULL,
      last_access_at TEXT NOT NULL,
      FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS courses (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      title TEXT NOT NULL,
      description TEXT NOT NULL,
      created_by INTEGER NOT NULL,
      created_at TEXT NOT NULL,
      FOREIGN KEY (created_by) REFERENCES users(id)
    );

    -- position is the lesson "order" (a reserved word in SQL)
    CREATE TABLE IF NOT EXISTS lessons (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      course_id INTEGER NOT NULL,
      title TEXT NOT NULL,
      description TEXT,
      content TEXT,
      position INTEGER NOT NULL,
      is_locked INTEGER NOT NULL DEFAULT 1,
      xp_reward INTEGER NOT NULL DEFAULT 10,
      created_at TEXT NOT NULL,
      UNIQUE (course_id, position),
      FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS enrollments (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      course_id INTEGER NOT NULL,
      current_lesson_id INTEGER,
      total_xp INTEGER NOT NULL DEFAULT 0,
      streak_days INTEGER NOT NULL DEFAULT 0,
      last_activity_at TEXT,
      completed_at TEXT,
      enrolled_at TEXT NOT NULL,
      UNIQUE (user_id, course_id),
      FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
      FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE,
      FOREIGN KEY (current_lesson_id) REFERENCES lessons(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS lesson_progress (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      enrollment_id INTEGER NOT NULL,
      lesson_id INTEGER NOT NULL,
      completed_at TEXT NOT NULL,
      xp_earned INTEGER NOT NULL,
      UNIQUE (enrollment_id, lesson_id),
      FOREIGN KEY (enrollment_id) REFERENCES enrollments(id) ON DELETE CASCADE,
      FOREIGN KEY (lesson_id) REFERENCES lessons(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
    CREATE INDEX IF NOT EXISTS idx_lessons_course ON lessons(course_id, position);
    CREATE INDEX IF NOT EXISTS idx_enrollments_user ON enrollments(user_id);
    "#,
  )?;

  record_version(&tx, 1, "Create base tables (users, sessions, courses, lessons, enrollments)")?;
  tx.commit()
}

/// v1→v2: game modules with one payload table per module type
fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
  tracing::info!("Running migration v1→v2: Add game modules");
  let tx = conn.unchecked_transaction()?;

  tx.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS game_modules (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      lesson_id INTEGER NOT NULL,
      kind TEXT NOT NULL CHECK (kind IN ('MCQ', 'REARRANGE', 'MATCHING')),
      title TEXT NOT NULL,
      position INTEGER NOT NULL,
      xp_reward INTEGER NOT NULL DEFAULT 10,
      created_at TEXT NOT NULL,
      FOREIGN KEY (lesson_id) REFERENCES lessons(id) ON DELETE CASCADE
    );

    -- List and map columns hold JSON text
    CREATE TABLE IF NOT EXISTS mcq_challenges (
      module_id INTEGER PRIMARY KEY,
      question TEXT NOT NULL,
      options TEXT NOT NULL,
      correct INTEGER NOT NULL,
      FOREIGN KEY (module_id) REFERENCES game_modules(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS rearrange_challenges (
      module_id INTEGER PRIMARY KEY,
      prompt TEXT NOT NULL,
      items TEXT NOT NULL,
      correct_order TEXT NOT NULL,
      FOREIGN KEY (module_id) REFERENCES game_modules(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS matching_challenges (
      module_id INTEGER PRIMARY KEY,
      prompt TEXT NOT NULL,
      left_items TEXT NOT NULL,
      right_items TEXT NOT NULL,
      correct_pairs TEXT NOT NULL,
      FOREIGN KEY (module_id) REFERENCES game_modules(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_game_modules_lesson ON game_modules(lesson_id, position);
    "#,
  )?;

  record_version(&tx, 2, "Add game modules and typed payload tables")?;
  tx.commit()
}

/// v2→v3: remember the course a user last opened
fn migrate_v2_to_v3(conn: &Connection) -> Result<()> {
  tracing::info!("Running migration v2→v3: Add last accessed course");
  let tx = conn.unchecked_transaction()?;

  add_column_if_missing(&tx, "users", "last_accessed_course_id", "INTEGER REFERENCES courses(id)")?;

  record_version(&tx, 3, "Add users.last_accessed_course_id")?;
  tx.commit()
}

// ============================================================
// MIGRATION HELPERS
// ============================================================

/// Record a schema version after successful migration
fn record_version(conn: &Connection, version: i32, description: &str) -> Result<()> {
  let now = Utc::now().to_rfc3339();
  conn.execute(
    "INSERT INTO db_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
    params![version, now, description],
  )?;
  tracing::info!("Recorded schema version {} - {}", version, description);
  Ok(())
}

/// Get current schema version (0 if no versions recorded)
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
  conn.query_row(
    "SELECT COALESCE(MAX(version), 0) FROM db_version",
    [],
    |row| row.get(0),
  )
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}
