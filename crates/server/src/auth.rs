//! Request identity: the user behind the `auth_token` cookie.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use models::user;
use service::auth::service::verify_token;
use service::policy::Requester;
use service::user_service;

use crate::errors::{AppError, LOGIN_URL};
use crate::state::ServerState;

pub const AUTH_COOKIE: &str = "auth_token";

/// The signed-in user, if any. Bad or expired tokens count as anonymous.
pub struct MaybeUser(pub Option<user::Model>);

/// The signed-in user; anonymous callers are redirected to the login page.
pub struct RequireUser(pub user::Model);

impl RequireUser {
    pub fn requester(&self) -> Requester { Requester::from(&self.0) }
}

#[async_trait]
impl FromRequestParts<ServerState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(AUTH_COOKIE) else { return Ok(MaybeUser(None)) };
        let claims = match verify_token(&state.auth.jwt_secret, cookie.value()) {
            Ok(c) => c,
            Err(e) => {
                debug!(err = %e, "ignoring invalid auth token");
                return Ok(MaybeUser(None));
            }
        };
        let Ok(uid) = claims.user_id() else { return Ok(MaybeUser(None)) };
        let user = user_service::get_active_user(&state.db, uid).await?;
        Ok(MaybeUser(user))
    }
}

#[async_trait]
impl FromRequestParts<ServerState> for RequireUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        match user {
            Some(u) => Ok(RequireUser(u)),
            None => {
                let next = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
                Err(Redirect::to(&login_redirect(next)).into_response())
            }
        }
    }
}

/// `/accounts/login/?next=<encoded path>`
pub fn login_redirect(next: &str) -> String {
    format!("{}?next={}", LOGIN_URL, encode_component(next))
}

/// Percent-encode everything outside the unreserved set and `/`.
fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Only same-site absolute paths are followed after login. Browsers read a
/// backslash as a slash and drop tabs and newlines, so those are refused too.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if is_local_path(n) => n,
        _ => "/",
    }
}

fn is_local_path(n: &str) -> bool {
    n.starts_with('/')
        && !n.starts_with("//")
        && !n.contains('\\')
        && !n.chars().any(char::is_control)
}
