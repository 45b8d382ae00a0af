use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use common::env::ensure_media_dir;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use service::session::SessionStore;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {}", e)))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
    }
}

const SESSION_SWEEP_EVERY: Duration = Duration::from_secs(10 * 60);

/// Periodically drop idle sessions from the in-memory store.
fn spawn_session_sweeper(sessions: SessionStore) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SESSION_SWEEP_EVERY);
        loop {
            tick.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                debug!(purged, remaining = sessions.len(), "expired sessions purged");
            }
        }
    });
}

/// Everything the router needs, from an already loaded config.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    Migrator::up(&db, None)
        .await
        .map_err(|e| StartupError::Database(format!("migrations: {}", e)))?;
    ensure_media_dir(&cfg.app.media_dir).await?;

    let state = ServerState::new(db, cfg.app.jwt_secret.clone(), cfg.app.media_dir.clone());
    spawn_session_sweeper(state.sessions.clone());
    Ok(routes::build_router(state, build_cors()))
}

/// Public entry: load config, build the app and serve until Ctrl+C.
pub async fn run() -> Result<(), StartupError> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, media_dir = %cfg.app.media_dir, "starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StartupError::Any(e.into()))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StartupError::Any(e.into()))?;
    info!("server stopped");
    Ok(())
}
