//! The user's last accessed course, and the course a lesson belongs to.

use axum::{
  extract::{Query, State},
  Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;

use super::{require_id, require_query_id, IdParam};
use crate::auth::AuthContext;
use crate::db;
use crate::error::{ApiError, ApiResult, JsonBody};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SetCurrentRequest {
  pub course_id: Option<IdParam>,
}

#[derive(Debug, Deserialize)]
pub struct CourseIdQuery {
  #[serde(rename = "lessonId")]
  pub lesson_id: Option<String>,
}

/// GET /api/current
pub async fn get_current_course(
  auth: AuthContext,
  State(state): State<AppState>,
) -> ApiResult<Json<serde_json::Value>> {
  let conn = db::try_lock(&state.db)?;
  let course_id = db::get_last_accessed_course(&conn, auth.user_id())?;
  Ok(Json(json!({ "lastAccessedCourseId": course_id })))
}

/// PATCH /api/current - only courses the caller is enrolled in
pub async fn set_current_course(
  auth: AuthContext,
  State(state): State<AppState>,
  WithRejection(Json(req), _): JsonBody<SetCurrentRequest>,
) -> ApiResult<Json<serde_json::Value>> {
  let course_id = require_id(req.course_id.as_ref(), "courseId")?;

  let conn = db::try_lock(&state.db)?;
  if !db::is_enrolled(&conn, auth.user_id(), course_id)? {
    return Err(ApiError::Forbidden("You are not enrolled in this course".to_string()));
  }
  db::set_last_accessed_course(&conn, auth.user_id(), course_id)?;

  Ok(Json(json!({ "message": "Course updated successfully", "lastAccessedCourseId": course_id })))
}

/// GET /api/course-id?lessonId=
pub async fn course_id_for_lesson(
  _auth: AuthContext,
  State(state): State<AppState>,
  Query(query): Query<CourseIdQuery>,
) -> ApiResult<Json<serde_json::Value>> {
  let lesson_id = require_query_id(query.lesson_id, "lessonId")?;

  let conn = db::try_lock(&state.db)?;
  let lesson = db::get_lesson(&conn, lesson_id)?.ok_or_else(|| ApiError::not_found("Course not found"))?;
  Ok(Json(json!({ "courseId": lesson.course_id })))
}
