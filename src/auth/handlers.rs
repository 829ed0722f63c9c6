//! Authentication handlers for sign-up, sign-in, sign-out and session lookup.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar},
    WithRejection,
};
use serde::Deserialize;
use serde_json::json;

use super::middleware::{AuthContext, OptionalAuth, SESSION_COOKIE_NAME};
use super::password;
use crate::db::{self, LogOnError, UserInfo};
use crate::error::{ApiError, ApiResult, JsonBody};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Generate a new session ID (32 lowercase alphanumeric characters)
pub fn generate_session_id() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    (0..32)
        .map(|_| {
            let idx = rng.random_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect()
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn session_cookie(session_id: String, hours: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session_id))
        .path("/")
        .http_only(true)
        .secure(false) // Set to true in production with HTTPS
        .max_age(time::Duration::hours(hours))
        .build()
}

/// Create a session row and attach its cookie to the jar
fn start_session(state: &AppState, conn: &rusqlite::Connection, jar: CookieJar, user_id: i64) -> ApiResult<CookieJar> {
    let session_id = generate_session_id();
    db::create_session(conn, user_id, &session_id, state.config.session_hours)?;
    Ok(jar.add(session_cookie(session_id, state.config.session_hours)))
}

/// POST /api/auth/sign-up
pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): JsonBody<SignUpRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = req.name.trim();
    let email = normalize_email(&req.email);

    if name.is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::validation("A valid email address is required"));
    }
    password::validate_password_strength(&req.password).map_err(ApiError::Validation)?;

    let password_hash = password::hash_password(&req.password)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))?;

    let conn = db::try_lock(&state.db)?;
    if db::email_exists(&conn, &email)? {
        return Err(ApiError::Conflict("An account with this email already exists".to_string()));
    }

    let user_id = db::create_user(&conn, name, &email, &password_hash)?;
    let jar = start_session(&state, &conn, jar, user_id)?;
    tracing::info!("Account created for user {}", user_id);

    let user = UserInfo {
        id: user_id,
        name: name.to_string(),
        email,
    };
    Ok((StatusCode::CREATED, jar, Json(json!({ "user": user }))))
}

/// POST /api/auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): JsonBody<SignInRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let conn = db::try_lock(&state.db)?;
    let Some((user, password_hash)) = db::get_user_by_email(&conn, &email)? else {
        return Err(ApiError::Unauthorized);
    };
    if !password::verify_password(&req.password, &password_hash) {
        tracing::debug!("Failed sign-in for user {}", user.id);
        return Err(ApiError::Unauthorized);
    }

    db::update_last_login(&conn, user.id).log_warn("Failed to update last login");
    let jar = start_session(&state, &conn, jar, user.id)?;

    Ok((jar, Json(json!({ "user": user }))))
}

/// POST /api/auth/sign-out - Delete the session (if any) and clear the cookie
pub async fn sign_out(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    if let Some(auth) = auth {
        let conn = db::try_lock(&state.db)?;
        db::delete_session(&conn, &auth.session_id).log_warn("Failed to delete session during sign-out");
    }

    let removal = Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build();
    Ok((jar.remove(removal), Json(json!({ "message": "Signed out" }))))
}

/// GET /api/auth/session
pub async fn session(auth: AuthContext) -> Json<serde_json::Value> {
    Json(json!({ "user": auth.user }))
}
