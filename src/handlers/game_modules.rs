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
use crate::db::{self, NewGameModule};
use crate::domain::{GameKind, GameModule, GamePayload};
use crate::error::{ApiError, ApiResult, JsonBody};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ModulesQuery {
  #[serde(rename = "lessonId")]
  pub lesson_id: Option<String>,
}

/// `gameData` is kept as raw JSON until `type` is known
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateModuleRequest {
  pub lesson_id: Option<IdParam>,
  #[serde(rename = "type")]
  pub kind: Option<String>,
  pub title: Option<String>,
  pub order: Option<i64>,
  pub xp_reward: Option<i64>,
  pub game_data: Option<serde_json::Value>,
}

/// GET /api/game-module?lessonId= - modules with their payloads, in play order
pub async fn list_game_modules(
  State(state): State<AppState>,
  Query(query): Query<ModulesQuery>,
) -> ApiResult<Json<Vec<GameModule>>> {
  let lesson_id = require_query_id(query.lesson_id, "lessonId")?;

  let conn = db::try_lock(&state.db)?;
  if db::get_lesson(&conn, lesson_id)?.is_none() {
    return Err(ApiError::not_found("Lesson not found"));
  }
  Ok(Json(db::list_game_modules(&conn, lesson_id)?))
}

/// POST /api/game-module
pub async fn create_game_module(
  _auth: AuthContext,
  State(state): State<AppState>,
  WithRejection(Json(req), _): JsonBody<CreateModuleRequest>,
) -> ApiResult<impl IntoResponse> {
  let (Some(kind), Some(title)) = (non_empty(req.kind.as_deref()), non_empty(req.title.as_deref())) else {
    return Err(ApiError::validation("Missing required fields: type, lessonId, title"));
  };
  let lesson_id = require_id(req.lesson_id.as_ref(), "lessonId")?;
  let kind = GameKind::from_str(kind)
    .ok_or_else(|| ApiError::validation(format!("Invalid module type: {}", kind)))?;
  check_xp_reward(req.xp_reward)?;

  let Some(data) = req.game_data else {
    return Err(ApiError::validation(format!("gameData is required for {} modules", kind.as_str())));
  };
  let payload = GamePayload::from_json(kind, data).map_err(ApiError::Validation)?;

  let conn = db::try_lock(&state.db)?;
  if db::get_lesson(&conn, lesson_id)?.is_none() {
    return Err(ApiError::not_found("Lesson not found"));
  }

  let module = db::create_game_module(
    &conn,
    &NewGameModule {
      lesson_id,
      title: title.to_string(),
      order: req.order,
      xp_reward: req.xp_reward,
      payload,
    },
  )?;

  Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": module }))))
}
