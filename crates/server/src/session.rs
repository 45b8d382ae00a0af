use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use service::errors::ServiceError;
use service::session::{Notice, SessionStore};

use crate::errors::AppError;
use crate::state::ServerState;

pub const SESSION_COOKIE: &str = "sessionid";

/// Request-scoped handle on the caller's session.
#[derive(Clone)]
pub struct Session {
    key: String,
    store: SessionStore,
}

impl Session {
    pub fn key(&self) -> &str { &self.key }

    pub fn bump_visits(&self) -> u64 { self.store.bump_visits(&self.key) }

    pub fn notify(&self, text: impl Into<String>) {
        self.store.push_notice(&self.key, Notice::success(text));
    }

    pub fn take_notices(&self) -> Vec<Notice> { self.store.take_notices(&self.key) }

    /// Forget everything stored for this session.
    pub fn end(&self) { self.store.remove(&self.key) }
}

fn session_cookie(key: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, key);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// Expiring `sessionid` cookie for a signed-out browser.
pub fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookie
}

/// Attach a [`Session`] to every request. A cookie is only issued once the
/// handler has actually stored something under a new key.
pub async fn session_middleware(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let known = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|k| state.sessions.contains(k));
    let (key, fresh) = match known {
        Some(k) => (k, false),
        None => (SessionStore::new_key(), true),
    };
    req.extensions_mut().insert(Session { key: key.clone(), store: state.sessions.clone() });
    let resp = next.run(req).await;
    if fresh && state.sessions.contains(&key) {
        (jar.add(session_cookie(key)), resp).into_response()
    } else {
        resp
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Service(ServiceError::Db("session layer missing".into())))
    }
}
