use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;

use super::non_empty;
use crate::auth::AuthContext;
use crate::db;
use crate::domain::Course;
use crate::error::{ApiError, ApiResult, JsonBody};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateCourseRequest {
  pub title: Option<String>,
  pub description: Option<String>,
}

/// GET /api/course
pub async fn list_courses(_auth: AuthContext, State(state): State<AppState>) -> ApiResult<Json<Vec<Course>>> {
  let conn = db::try_lock(&state.db)?;
  Ok(Json(db::list_courses(&conn)?))
}

/// POST /api/course - the caller becomes the course owner
pub async fn create_course(
  auth: AuthContext,
  State(state): State<AppState>,
  WithRejection(Json(req), _): JsonBody<CreateCourseRequest>,
) -> ApiResult<impl IntoResponse> {
  let (Some(title), Some(description)) = (non_empty(req.title.as_deref()), non_empty(req.description.as_deref())) else {
    return Err(ApiError::validation("Title and description are required"));
  };

  let conn = db::try_lock(&state.db)?;
  let course = db::create_course(&conn, title, description, auth.user_id())?;
  tracing::info!("User {} created course {}", auth.user_id(), course.id);

  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Course created successfully", "course": course })),
  ))
}
