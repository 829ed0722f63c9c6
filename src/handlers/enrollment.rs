use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;

use super::{require_id, IdParam};
use crate::auth::AuthContext;
use crate::db::{self, EnrolledCourse};
use crate::error::{ApiError, ApiResult, JsonBody};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnrollRequest {
  pub course_id: Option<IdParam>,
}

/// GET /api/enroll - the caller's enrollments
pub async fn list_enrollments(
  auth: AuthContext,
  State(state): State<AppState>,
) -> ApiResult<Json<Vec<EnrolledCourse>>> {
  let conn = db::try_lock(&state.db)?;
  Ok(Json(db::list_enrollments(&conn, auth.user_id())?))
}

/// POST /api/enroll
pub async fn enroll(
  auth: AuthContext,
  State(state): State<AppState>,
  WithRejection(Json(req), _): JsonBody<EnrollRequest>,
) -> ApiResult<impl IntoResponse> {
  let course_id = require_id(req.course_id.as_ref(), "courseId")?;

  let conn = db::try_lock(&state.db)?;
  if db::get_course(&conn, course_id)?.is_none() {
    return Err(ApiError::not_found("Course not found"));
  }

  let enrollment = db::enroll(&conn, auth.user_id(), course_id)?
    .ok_or_else(|| ApiError::Conflict("Already enrolled in this course".to_string()))?;

  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Course enrolled successfully", "enrollment": enrollment })),
  ))
}
