pub mod image;
pub mod usuario;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// `200` with the value as JSON, or `204` when there is nothing to return.
pub(crate) fn json_or_no_content<T: Serialize>(value: Option<T>) -> Response {
    match value {
        Some(value) => Json(value).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Empty lists are reported as `204` like a missing record.
pub(crate) fn list_or_no_content<T: Serialize>(items: Vec<T>) -> Response {
    json_or_no_content((!items.is_empty()).then_some(items))
}
