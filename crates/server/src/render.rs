//! Page documents: the context a template would receive, as JSON.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};

use models::user;
use service::errors::FormErrors;

use crate::session::Session;

fn user_doc(user: Option<&user::Model>) -> Value {
    match user {
        Some(u) => json!({
            "id": u.id,
            "username": u.username,
            "display_name": u.display_name(),
            "is_staff": u.is_staff,
        }),
        None => Value::Null,
    }
}

/// Build the document for `template`. Queued notices are drained into
/// `messages`.
pub fn document(template: &str, user: Option<&user::Model>, session: &Session, context: Value) -> Value {
    let mut doc = match context {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("object".into(), other);
            map
        }
    };
    doc.insert("template".into(), Value::String(template.to_string()));
    doc.insert("user".into(), user_doc(user));
    doc.insert("messages".into(), json!(session.take_notices()));
    Value::Object(doc)
}

pub fn page(template: &str, user: Option<&user::Model>, session: &Session, context: Value) -> Response {
    Json(document(template, user, session, context)).into_response()
}

/// Re-render a form with field errors and the submitted values.
pub fn invalid_form(
    template: &str,
    user: Option<&user::Model>,
    session: &Session,
    mut context: Value,
    errors: &FormErrors,
) -> Response {
    if let Value::Object(map) = &mut context {
        map.insert("errors".into(), json!(errors));
    }
    (StatusCode::UNPROCESSABLE_ENTITY, Json(document(template, user, session, context))).into_response()
}
