//! Panic recovery for the outermost pipeline stage.

use std::any::Any;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Converts a panic caught by `CatchPanicLayer` into the standard 500 JSON
/// rejection.
///
/// `Connection: close` marks the connection non-reusable so no further
/// requests are served over possibly corrupted state. The panic payload is
/// logged server-side and never reaches the client.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    tracing::error!(panic = %detail, "recovered from panic while handling request");

    let body = Json(json!({
        "error": "the server encountered a problem and could not process your request"
    }));

    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}
