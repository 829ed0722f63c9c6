//! Accounts, sessions and the per-user "current course" pointer.

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};
use serde::Serialize;

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Create a new user, returns the user ID
pub fn create_user(conn: &Connection, name: &str, email: &str, password_hash: &str) -> Result<i64> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO users (name, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![name, email, password_hash, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Check if an email is already registered (case-insensitive)
pub fn email_exists(conn: &Connection, email: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Get user by email, returns (user, password_hash)
pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<(UserInfo, String)>> {
    conn.query_row(
        "SELECT id, name, email, password_hash FROM users WHERE email = ?1",
        params![email],
        |row| {
            Ok((
                UserInfo {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                },
                row.get(3)?,
            ))
        },
    )
    .optional()
}

pub fn get_user_by_id(conn: &Connection, user_id: i64) -> Result<Option<UserInfo>> {
    conn.query_row(
        "SELECT id, name, email FROM users WHERE id = ?1",
        params![user_id],
        |row| {
            Ok(UserInfo {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Update user's last login timestamp
pub fn update_last_login(conn: &Connection, user_id: i64) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE users SET last_login_at = ?1 WHERE id = ?2",
        params![now, user_id],
    )?;
    Ok(())
}

// ==================== Sessions ====================

/// Create a new session
pub fn create_session(
    conn: &Connection,
    user_id: i64,
    session_id: &str,
    duration_hours: i64,
) -> Result<()> {
    let now = Utc::now();
    let expires = now + Duration::hours(duration_hours);
    conn.execute(
        "INSERT INTO sessions (id, user_id, created_at, expires_at, last_access_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            session_id,
            user_id,
            now.to_rfc3339(),
            expires.to_rfc3339(),
            now.to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Validate session and get the user it belongs to
pub fn get_session_user(conn: &Connection, session_id: &str) -> Result<Option<UserInfo>> {
    let now = Utc::now().to_rfc3339();
    let user = conn
        .query_row(
            r#"
            SELECT u.id, u.name, u.email
            FROM sessions s
            JOIN users u ON s.user_id = u.id
            WHERE s.id = ?1 AND s.expires_at > ?2
            "#,
            params![session_id, now],
            |row| {
                Ok(UserInfo {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                })
            },
        )
        .optional()?;

    if user.is_some() {
        if let Err(e) = conn.execute(
            "UPDATE sessions SET last_access_at = ?1 WHERE id = ?2",
            params![now, session_id],
        ) {
            tracing::warn!("Failed to touch session: {}", e);
        }
    }
    Ok(user)
}

/// Delete a session (sign-out)
pub fn delete_session(conn: &Connection, session_id: &str) -> Result<()> {
    conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
    Ok(())
}

/// Cleanup expired sessions, returns count of deleted sessions
pub fn cleanup_expired_sessions(conn: &Connection) -> Result<usize> {
    let now = Utc::now().to_rfc3339();
    let count = conn.execute("DELETE FROM sessions WHERE expires_at < ?1", params![now])?;
    Ok(count)
}

// ==================== Current course ====================

pub fn get_last_accessed_course(conn: &Connection, user_id: i64) -> Result<Option<i64>> {
    let value: Option<Option<i64>> = conn
        .query_row(
            "SELECT last_accessed_course_id FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.flatten())
}

pub fn set_last_accessed_course(conn: &Connection, user_id: i64, course_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE users SET last_accessed_course_id = ?1 WHERE id = ?2",
        params![course_id, user_id],
    )?;
    Ok(())
}
