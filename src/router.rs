//! Application router shared by the binary and the HTTP tests.

use axum::{
  routing::{get, patch, post},
  Router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth;
use crate::handlers;
use crate::state::AppState;

fn api_routes() -> Router<AppState> {
  Router::new()
    .route("/auth/sign-up", post(auth::sign_up))
    .route("/auth/sign-in", post(auth::sign_in))
    .route("/auth/sign-out", post(auth::sign_out))
    .route("/auth/session", get(auth::session))
    .route("/course", get(handlers::list_courses).post(handlers::create_course))
    .route("/lesson", get(handlers::list_lessons).post(handlers::create_lesson))
    .route(
      "/game-module",
      get(handlers::list_game_modules).post(handlers::create_game_module),
    )
    .route("/complete-lesson", patch(handlers::complete_lesson))
    .route("/progress", get(handlers::progress))
    .route(
      "/current",
      get(handlers::get_current_course).patch(handlers::set_current_course),
    )
    .route("/course-id", get(handlers::course_id_for_lesson))
    .route("/enroll", get(handlers::list_enrollments).post(handlers::enroll))
    .route("/check-answer", post(handlers::check_answer))
}

/// Build the full application [`Router`] with request tracing.
pub fn build_app_router(state: AppState) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .nest("/api", api_routes())
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
    .with_state(state)
}
