use std::collections::HashMap;

use anyhow::Error;
use axum::Json;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application error mapped onto the JSON rejection envelope
/// `{"error": <string | field-to-message map>}`.
///
/// Client-facing messages are deliberately coarse: a malformed token and an
/// unknown token produce the same response, and a failed permission check
/// never reveals which permissions the caller does hold. Internal detail is
/// logged server-side only and never serialized to the client.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    message: ErrorMessage,
    challenge: Option<&'static str>,
    detail: Option<Error>,
}

#[derive(Debug)]
enum ErrorMessage {
    Text(String),
    Fields(HashMap<String, String>),
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: ErrorMessage::Text(message.into()),
            challenge: None,
            detail: None,
        }
    }

    /// 400 with the parse failure spelled out for the client.
    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err.into().to_string())
    }

    /// 422 carrying a field-to-message map.
    pub fn failed_validation(errors: HashMap<String, String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: ErrorMessage::Fields(errors),
            challenge: None,
            detail: None,
        }
    }

    /// 422 for a single offending field.
    pub fn failed_validation_field(field: &str, message: &str) -> Self {
        Self::failed_validation(HashMap::from([(field.to_string(), message.to_string())]))
    }

    pub fn not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "the requested resource could not be found",
        )
    }

    pub fn method_not_allowed(method: &Method) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("the {method} method is not supported for this resource"),
        )
    }

    pub fn edit_conflict() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "unable to update the record due to an edit conflict, please try again",
        )
    }

    pub fn rate_limit_exceeded() -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded")
    }

    pub fn invalid_credentials() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "invalid authentication credentials",
        )
    }

    /// 401 for a malformed, unknown or expired bearer token. Carries a
    /// `WWW-Authenticate` challenge naming the expected scheme.
    pub fn invalid_authentication_token() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: ErrorMessage::Text("invalid or missing authentication token".to_string()),
            challenge: Some("Bearer"),
            detail: None,
        }
    }

    pub fn authentication_required() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "you must be authenticated to access this resource",
        )
    }

    pub fn inactive_account() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "your user account must be activated to access this resource",
        )
    }

    pub fn not_permitted() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "your user account doesn't have the necessary permissions to access this resource",
        )
    }

    /// 500 with a generic client message. The underlying error is kept for
    /// the server-side log only.
    pub fn server_error<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: ErrorMessage::Text(
                "the server encountered a problem and could not process your request".to_string(),
            ),
            challenge: None,
            detail: Some(err.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.detail {
            tracing::error!(error = ?err, "internal server fault");
        }

        let body = match &self.message {
            ErrorMessage::Text(message) => json!({ "error": message }),
            ErrorMessage::Fields(fields) => json!({ "error": fields }),
        };

        let mut response = (self.status, Json(body)).into_response();
        if let Some(scheme) = self.challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(scheme));
        }
        response
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::server_error(err)
    }
}
