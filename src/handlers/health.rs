use axum::{extract::State, Json};
use serde::Serialize;

use crate::db;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
  pub status: &'static str,
  pub version: &'static str,
  pub db_healthy: bool,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
  let db_healthy = db::try_lock(&state.db)
    .map(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).is_ok())
    .unwrap_or(false);

  Json(HealthResponse {
    status: if db_healthy { "ok" } else { "degraded" },
    version: env!("CARGO_PKG_VERSION"),
    db_healthy,
  })
}
