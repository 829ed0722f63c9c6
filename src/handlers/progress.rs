use axum::{
  extract::{Query, State},
  Json,
};
use chrono::Utc;
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;

use super::{require_id, require_query_id, IdParam};
use crate::auth::AuthContext;
use crate::db::{self, LessonCompletion};
use crate::domain::CourseProgress;
use crate::error::{ApiError, ApiResult, JsonBody};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
  #[serde(rename = "courseId")]
  pub course_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompleteLessonRequest {
  pub lesson_id: Option<IdParam>,
}

/// GET /api/progress?courseId=
pub async fn progress(
  auth: AuthContext,
  State(state): State<AppState>,
  Query(query): Query<ProgressQuery>,
) -> ApiResult<Json<CourseProgress>> {
  let course_id = require_query_id(query.course_id, "courseId")?;

  let conn = db::try_lock(&state.db)?;
  db::get_progress(&conn, auth.user_id(), course_id)?
    .map(Json)
    .ok_or_else(|| ApiError::not_found("Enrollment not found"))
}

/// PATCH /api/complete-lesson
pub async fn complete_lesson(
  auth: AuthContext,
  State(state): State<AppState>,
  WithRejection(Json(req), _): JsonBody<CompleteLessonRequest>,
) -> ApiResult<Json<serde_json::Value>> {
  let lesson_id = require_id(req.lesson_id.as_ref(), "lessonId")?;

  let conn = db::try_lock(&state.db)?;
  match db::complete_lesson(&conn, auth.user_id(), lesson_id, Utc::now())? {
    LessonCompletion::Recorded(outcome) => Ok(Json(json!({
      "message": "Lesson completed successfully",
      "result": outcome,
    }))),
    LessonCompletion::LessonNotFound => Err(ApiError::not_found("Lesson not found")),
    LessonCompletion::NotEnrolled => Err(ApiError::not_found("User not enrolled in course")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::UserInfo;
  use crate::testing::{seed_course, test_state, SeededCourse};
  use std::marker::PhantomData;

  fn student(seeded: &SeededCourse) -> AuthContext {
    AuthContext {
      user: UserInfo {
        id: seeded.student_id,
        name: "Student".to_string(),
        email: "student@example.com".to_string(),
      },
      session_id: "test".to_string(),
    }
  }

  fn complete(lesson_id: i64) -> JsonBody<CompleteLessonRequest> {
    WithRejection(
      Json(CompleteLessonRequest {
        lesson_id: Some(IdParam::Number(lesson_id)),
      }),
      PhantomData,
    )
  }

  #[tokio::test]
  async fn test_completion_then_progress() {
    let state = test_state().unwrap();
    let seeded = {
      let conn = db::try_lock(&state.db).unwrap();
      let seeded = seed_course(&conn, 2).unwrap();
      db::enroll(&conn, seeded.student_id, seeded.course.id).unwrap();
      seeded
    };

    let Json(body) = complete_lesson(student(&seeded), State(state.clone()), complete(seeded.lessons[0].id))
      .await
      .unwrap();
    assert_eq!(body["result"]["nextLessonId"], json!(seeded.lessons[1].id));
    assert_eq!(body["result"]["courseCompleted"], json!(false));

    let query = Query(ProgressQuery {
      course_id: Some(seeded.course.id.to_string()),
    });
    let Json(progress) = progress(student(&seeded), State(state), query).await.unwrap();
    assert_eq!(progress.progress.completed, 1);
    assert_eq!(progress.progress.percentage, 50);
    assert_eq!(progress.streak_days, 1);
  }

  #[tokio::test]
  async fn test_completion_requires_enrollment() {
    let state = test_state().unwrap();
    let seeded = {
      let conn = db::try_lock(&state.db).unwrap();
      seed_course(&conn, 1).unwrap()
    };

    let err = complete_lesson(student(&seeded), State(state), complete(seeded.lessons[0].id))
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }

  #[tokio::test]
  async fn test_missing_course_id() {
    let state = test_state().unwrap();
    let seeded = {
      let conn = db::try_lock(&state.db).unwrap();
      seed_course(&conn, 1).unwrap()
    };
    let err = progress(student(&seeded), State(state), Query(ProgressQuery { course_id: None }))
      .await
      .unwrap_err();
    assert_eq!(err.to_string(), "courseId is required");
  }
}
