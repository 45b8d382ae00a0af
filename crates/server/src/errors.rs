use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// Path of the login page; unauthenticated requests are sent here.
pub const LOGIN_URL: &str = "/accounts/login/";

/// Handler error. Form views render their own 422 pages; whatever reaches
/// this type is terminal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// JSON endpoints report bad input as 400 with a body.
    #[error("bad request")]
    BadRequest(serde_json::Value),
}

impl AppError {
    /// Map form validation onto 400 for JSON endpoints.
    pub fn api(e: ServiceError) -> Self {
        match e {
            ServiceError::Invalid(errs) => AppError::BadRequest(json!({ "errors": errs })),
            ServiceError::Validation(msg) => AppError::BadRequest(json!({ "error": msg })),
            other => AppError::Service(other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Service(e) => match e {
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
                ServiceError::Invalid(_) | ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ServiceError::Conflict(_) => StatusCode::CONFLICT,
                ServiceError::Unauthenticated => StatusCode::SEE_OTHER,
                ServiceError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Auth(e) => match e {
                AuthError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::Conflict => StatusCode::CONFLICT,
                AuthError::Unauthorized | AuthError::TokenError(_) => StatusCode::UNAUTHORIZED,
                AuthError::HashError(_) | AuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Service(ServiceError::Unauthenticated) => Redirect::to(LOGIN_URL).into_response(),
            AppError::Service(ServiceError::Invalid(errs)) => (status, Json(json!({ "errors": errs }))).into_response(),
            AppError::BadRequest(body) => (status, Json(body)).into_response(),
            other => {
                let msg = other.to_string();
                if status.is_server_error() {
                    error!(error = %msg, "request failed");
                } else {
                    warn!(status = status.as_u16(), error = %msg, "request refused");
                }
                (status, Json(json!({ "error": msg }))).into_response()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::errors::FormErrors;

    #[test]
    fn service_errors_map_to_distinct_statuses() {
        assert_eq!(AppError::from(ServiceError::not_found("car")).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(ServiceError::forbidden("edit")).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::from(ServiceError::Invalid(FormErrors::single("vin", "required"))).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::from(ServiceError::Db("boom".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unauthenticated_redirects_to_login() {
        let resp = AppError::from(ServiceError::Unauthenticated).into_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], LOGIN_URL);
    }

    #[test]
    fn api_validation_is_bad_request() {
        let err = AppError::api(ServiceError::Invalid(FormErrors::single("price", "bad")));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err = AppError::api(ServiceError::not_found("service"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
