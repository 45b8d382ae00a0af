use sea_orm::DatabaseConnection;
use service::session::SessionStore;

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
}

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
    pub sessions: SessionStore,
    /// Root directory for uploaded files, served under `/media`.
    pub media_dir: String,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, jwt_secret: impl Into<String>, media_dir: impl Into<String>) -> Self {
        Self {
            db,
            auth: ServerAuthConfig { jwt_secret: jwt_secret.into() },
            sessions: SessionStore::new(),
            media_dir: media_dir.into(),
        }
    }
}
