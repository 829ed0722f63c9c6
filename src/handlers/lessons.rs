use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;

use super::{check_xp_reward, non_empty, require_id, require_query_id, IdParam};
use crate::auth::AuthContext;
use crate::db::{self, NewLesson};
use crate::domain::Lesson;
use crate::error::{ApiError, ApiResult, JsonBody};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LessonsQuery {
  #[serde(rename = "courseId")]
  pub course_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateLessonRequest {
  pub course_id: Option<IdParam>,
  pub title: Option<String>,
  pub description: Option<String>,
  pub content: Option<String>,
  pub xp_reward: Option<i64>,
}

/// GET /api/lesson?courseId= - lessons in course order
pub async fn list_lessons(
  _auth: AuthContext,
  State(state): State<AppState>,
  Query(query): Query<LessonsQuery>,
) -> ApiResult<Json<Vec<Lesson>>> {
  let course_id = require_query_id(query.course_id, "courseId")?;

  let conn = db::try_lock(&state.db)?;
  if db::get_course(&conn, course_id)?.is_none() {
    return Err(ApiError::not_found("Course not found"));
  }
  Ok(Json(db::list_lessons(&conn, course_id)?))
}

/// POST /api/lesson - appended after the course's last lesson
pub async fn create_lesson(
  _auth: AuthContext,
  State(state): State<AppState>,
  WithRejection(Json(req), _): JsonBody<CreateLessonRequest>,
) -> ApiResult<impl IntoResponse> {
  let Some(title) = non_empty(req.title.as_deref()) else {
    return Err(ApiError::validation("Title and courseId are required"));
  };
  let course_id = require_id(req.course_id.as_ref(), "courseId")?;
  check_xp_reward(req.xp_reward)?;

  let conn = db::try_lock(&state.db)?;
  if db::get_course(&conn, course_id)?.is_none() {
    return Err(ApiError::not_found("Course not found"));
  }

  let lesson = db::create_lesson(
    &conn,
    course_id,
    &NewLesson {
      title: title.to_string(),
      description: req.description,
      content: req.content,
      xp_reward: req.xp_reward,
    },
  )?;

  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Lesson created successfully", "lesson": lesson })),
  ))
}
