use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

use crate::services::message_service::MessageResolver;

pub(crate) mod addresses;
pub(crate) mod admin;
pub(crate) mod auth;
pub(crate) mod change_password;
pub(crate) mod messages;
pub(crate) mod password_reset;
pub(crate) mod profile;

/// `{type, code, message}` with the text resolved from the catalog.
pub(crate) async fn coded_reply(
    messages: &MessageResolver,
    status: StatusCode,
    code: &str,
) -> Response {
    (status, Json(messages.resolve(code).await)).into_response()
}

/// `{field: message}` for each failing field; always a 400.
pub(crate) async fn field_errors_reply(
    messages: &MessageResolver,
    errors: &[(&str, &str)],
) -> Response {
    let mut body = Map::new();
    for (field, code) in errors {
        body.insert(field.to_string(), Value::String(messages.text(code).await));
    }
    (StatusCode::BAD_REQUEST, Json(Value::Object(body))).into_response()
}
