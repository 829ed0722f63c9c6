use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursequest::{config::Config, db, db::LogOnError, router, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "coursequest=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::load();

  let pool = match db::init_db(&config.database_path) {
    Ok(pool) => pool,
    Err(e) => {
      tracing::error!("Failed to initialize database at {}: {}", config.database_path.display(), e);
      std::process::exit(1);
    }
  };

  if let Ok(conn) = db::try_lock(&pool) {
    if let Some(removed) = db::cleanup_expired_sessions(&conn).log_warn("Failed to clean up expired sessions") {
      tracing::info!("Removed {} expired sessions", removed);
    }
  }

  let bind_addr = config.bind_addr();
  let app = router::build_app_router(AppState::new(pool, config));

  let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
    Ok(listener) => listener,
    Err(e) => {
      tracing::error!("Failed to bind to {}: {}", bind_addr, e);
      std::process::exit(1);
    }
  };

  tracing::info!("Server running on http://{}", bind_addr);

  if let Err(e) = axum::serve(listener, app).await {
    tracing::error!("Server error: {}", e);
    std::process::exit(1);
  }
}
