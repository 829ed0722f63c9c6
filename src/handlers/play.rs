//! Server-side scoring of a single module answer.

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use super::{require_id, IdParam};
use crate::db;
use crate::engine::{self, Answer, ModuleOutcome};
use crate::error::{ApiError, ApiResult, JsonBody};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckAnswerRequest {
  pub module_id: Option<IdParam>,
  pub answer: Option<serde_json::Value>,
}

/// POST /api/check-answer
pub async fn check_answer(
  State(state): State<AppState>,
  WithRejection(Json(req), _): JsonBody<CheckAnswerRequest>,
) -> ApiResult<Json<ModuleOutcome>> {
  let module_id = require_id(req.module_id.as_ref(), "moduleId")?;
  let answer: Answer = match req.answer {
    Some(raw) => serde_json::from_value(raw)
      .map_err(|e| ApiError::validation(format!("Invalid answer: {}", e)))?,
    None => return Err(ApiError::validation("answer is required")),
  };

  let module = {
    let conn = db::try_lock(&state.db)?;
    db::get_game_module(&conn, module_id)?
  }
  .ok_or_else(|| ApiError::not_found("Game module not found"))?;

  let correct = engine::check_answer(&module, &answer).map_err(|e| ApiError::validation(e.to_string()))?;
  tracing::debug!("Module {} answered, correct: {}", module.id, correct);

  Ok(Json(ModuleOutcome::new(module.id, correct)))
}
