//! Account pages: register, login and logout.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use service::auth::domain::{LoginInput, RegisterInput};
use service::auth::errors::AuthError;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::{AuthConfig, AuthService};
use service::errors::FormErrors;

use crate::auth::{safe_next, MaybeUser, AUTH_COOKIE};
use crate::errors::AppError;
use crate::render::{document, invalid_form, page};
use crate::session::{clear_session_cookie, Session};
use crate::state::ServerState;

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

fn auth_service(state: &ServerState) -> AuthService<SeaOrmAuthRepository> {
    let repo = Arc::new(SeaOrmAuthRepository { db: state.db.clone() });
    AuthService::new(repo, AuthConfig { jwt_secret: Some(state.auth.jwt_secret.clone()), password_algorithm: "argon2".into() })
}

pub async fn login_form(
    MaybeUser(user): MaybeUser,
    session: Session,
    Query(q): Query<NextQuery>,
) -> Response {
    page("registration/login.html", user.as_ref(), &session, json!({ "next": q.next }))
}

pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let input = LoginInput { username: form.username.trim().to_string(), password: form.password.clone() };
    let auth = match auth_service(&state).login(input).await {
        Ok(s) => s,
        Err(AuthError::Unauthorized) => {
            warn!(username = %form.username, "login rejected");
            let errors = FormErrors::single("__all__", "Please enter a correct username and password.");
            let doc = document("registration/login.html", None, &session, json!({ "form": form, "errors": errors }));
            return Ok((StatusCode::UNAUTHORIZED, Json(doc)).into_response());
        }
        Err(e) => return Err(e.into()),
    };
    let Some(token) = auth.token else {
        return Err(AuthError::TokenError("token generation failed".into()).into());
    };
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    session.notify(format!("Welcome back, {}.", auth.user.username));
    let to = safe_next(form.next.as_deref()).to_string();
    Ok((jar.add(cookie), Redirect::to(&to)).into_response())
}

/// Sign out and drop the server-side session along with its cookie.
pub async fn logout(session: Session, jar: CookieJar) -> Response {
    session.end();
    let mut gone = Cookie::from(AUTH_COOKIE);
    gone.set_path("/");
    let jar = jar.remove(gone).remove(clear_session_cookie());
    (jar, Redirect::to("/")).into_response()
}

pub async fn register_form(MaybeUser(user): MaybeUser, session: Session) -> Response {
    page("registration/register.html", user.as_ref(), &session, json!({}))
}

/// Create the account, its credentials and profile, then send the visitor
/// to the login page.
pub async fn register(
    State(state): State<ServerState>,
    session: Session,
    Form(input): Form<RegisterInput>,
) -> Result<Response, AppError> {
    let shown = json!({
        "form": {
            "username": input.username,
            "first_name": input.first_name,
            "last_name": input.last_name,
            "email": input.email,
        }
    });
    match auth_service(&state).register(input).await {
        Ok(user) => {
            session.notify(format!("Account {} created. You can log in now.", user.username));
            Ok(Redirect::to("/accounts/login/").into_response())
        }
        Err(AuthError::Validation(msg)) => Ok(invalid_form(
            "registration/register.html",
            None,
            &session,
            shown,
            &FormErrors::single("__all__", msg),
        )),
        Err(AuthError::Conflict) => {
            let mut resp = invalid_form(
                "registration/register.html",
                None,
                &session,
                shown,
                &FormErrors::single("username", "A user with that username already exists."),
            );
            *resp.status_mut() = StatusCode::CONFLICT;
            Ok(resp)
        }
        Err(e) => Err(e.into()),
    }
}
