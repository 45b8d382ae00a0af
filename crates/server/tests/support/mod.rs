#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;
use tower::Service;
use uuid::Uuid;

use models::user;
use server::routes;
use server::ServerState;
use service::auth::domain::AuthUser;
use service::auth::service::issue_token;

pub const SECRET: &str = "test-secret";

static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

fn db_config() -> Option<configs::DatabaseConfig> {
    let _ = dotenvy::dotenv();
    let mut cfg = configs::load_default().map(|c| c.database).unwrap_or_default();
    cfg.normalize_from_env();
    if cfg.url.trim().is_empty() {
        return None;
    }
    cfg.min_connections = 1;
    cfg.connect_timeout_secs = cfg.connect_timeout_secs.clamp(1, 5);
    cfg.acquire_timeout_secs = cfg.acquire_timeout_secs.clamp(1, 10);
    Some(cfg)
}

/// Migrated connection, or `None` when DB tests should be skipped.
pub async fn get_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let cfg = db_config()?;
    let migrated = *MIGRATED
        .get_or_init(|| async {
            match models::db::connect_with_config(&cfg).await {
                Ok(db) => match migration::Migrator::up(&db, None).await {
                    Ok(()) => true,
                    Err(e) => {
                        eprintln!("skip: migrate up failed: {}", e);
                        false
                    }
                },
                Err(e) => {
                    eprintln!("skip: cannot connect to db: {}", e);
                    false
                }
            }
        })
        .await;
    if !migrated {
        return None;
    }
    models::db::connect_with_config(&cfg).await.ok()
}

fn media_dir() -> String {
    std::env::temp_dir()
        .join(format!("garage-media-{}", Uuid::new_v4().simple()))
        .to_string_lossy()
        .into_owned()
}

pub fn app_with(db: DatabaseConnection) -> Router {
    routes::build_router(ServerState::new(db, SECRET, media_dir()), cors())
}

/// Router over a connection that never reaches a database; good for routes
/// that reject before any query.
pub fn offline_app() -> Router {
    app_with(DatabaseConnection::Disconnected)
}

/// Like [`offline_app`], also handing back the state so tests can inspect it.
pub fn offline_app_with_state() -> (Router, ServerState) {
    let state = ServerState::new(DatabaseConnection::Disconnected, SECRET, media_dir());
    (routes::build_router(state.clone(), cors()), state)
}

pub async fn seed_user(db: &DatabaseConnection, is_staff: bool) -> anyhow::Result<user::Model> {
    let u = user::create(db, user::NewUser {
        username: format!("u{}", Uuid::new_v4().simple()),
        first_name: "Ona".into(),
        last_name: "Jonaitė".into(),
        is_staff,
        ..Default::default()
    })
    .await?;
    Ok(u)
}

/// `Cookie` header value that signs `u` in.
pub fn auth_cookie(u: &user::Model) -> anyhow::Result<String> {
    let token = issue_token(SECRET, &AuthUser { id: u.id, username: u.username.clone(), is_staff: u.is_staff })?;
    Ok(format!("auth_token={}", token))
}

pub async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<Response<Body>> {
    Ok(app.clone().call(req).await?)
}

pub fn get(uri: &str, cookie: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut b = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
        b = b.header("cookie", c);
    }
    Ok(b.body(Body::empty())?)
}

pub fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> anyhow::Result<Request<Body>> {
    let mut b = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded");
    if let Some(c) = cookie {
        b = b.header("cookie", c);
    }
    Ok(b.body(Body::from(body.to_string()))?)
}

pub fn send_json(method: &str, uri: &str, cookie: &str, body: serde_json::Value) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("cookie", cookie)
        .body(Body::from(serde_json::to_vec(&body)?))?)
}

pub async fn json_body(resp: Response<Body>) -> anyhow::Result<serde_json::Value> {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// `name=value` of the first `Set-Cookie` for `name`.
pub fn set_cookie(resp: &Response<Body>, name: &str) -> Option<String> {
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|kv| kv.starts_with(&format!("{}=", name)))
        .map(str::to_string)
}
