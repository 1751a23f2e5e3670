//! Bearer-token authentication and permission-based authorization.
//!
//! # Authentication Flow
//!
//! 1. The `authenticate` middleware runs once per request, before any route
//!    logic, and attaches an [`Identity`] to the request's extensions
//! 2. A request without an `Authorization` header proceeds as anonymous;
//!    whether that is acceptable is decided per route
//! 3. A presented token is resolved through its SHA-256 digest against the
//!    token store; malformed, unknown and expired tokens all produce the same
//!    401 response so the client cannot probe which tokens exist
//! 4. Protected handlers take an extractor generated by
//!    [`require_permission!`](crate::require_permission), which checks
//!    activation and the required permission code over the resolved identity
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::RequireMoviesWrite;
//!
//! async fn create_movie(
//!     RequireMoviesWrite(user): RequireMoviesWrite,
//! ) -> impl IntoResponse {
//!     // Only runs for an activated user holding "movies:write"
//! }
//! ```

use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::modules::tokens::model::{Token, TokenScope};
use crate::modules::users::model::{Permissions, User};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// The identity resolved for a request.
///
/// Exactly one is attached to the request's extensions per pipeline
/// execution. It is constructed fresh for every request, immutable once
/// attached, and never cached across requests.
#[derive(Clone, Debug)]
pub enum Identity {
    /// No credentials were presented. Route policy decides whether that is
    /// acceptable.
    Anonymous,
    /// A valid, unexpired authentication token was presented.
    User {
        user: User,
        permissions: Permissions,
    },
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }
}

/// Middleware resolving the request's identity, run once per request for all
/// routes, protected or not.
///
/// The absence of credentials is not an error here; it defers the decision to
/// per-route policy. A present-but-malformed header or token value is
/// rejected identically to an unknown token. A store failure is surfaced as a
/// server error, never as invalid credentials, and is not retried.
pub async fn authenticate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let mut response = match resolve_identity(&state, req).await {
        Ok(req) => next.run(req).await,
        Err(err) => err.into_response(),
    };

    // The response depends on the Authorization header, acceptance or
    // rejection alike; caches must key on it.
    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

/// Resolves the identity and attaches it to the request's extensions.
async fn resolve_identity(state: &AppState, mut req: Request) -> Result<Request, AppError> {
    let identity = match req.headers().get(header::AUTHORIZATION) {
        None => Identity::Anonymous,
        Some(value) => {
            let plaintext =
                parse_bearer_token(value).ok_or_else(AppError::invalid_authentication_token)?;

            let digest = Token::digest(&plaintext);
            let user = UserService::get_for_token(&state.db, TokenScope::Authentication, &digest)
                .await?
                .ok_or_else(AppError::invalid_authentication_token)?;

            // Permissions are loaded here so route-level authorization stays
            // a pure decision over the resolved identity.
            let permissions = UserService::permissions_for_user(&state.db, user.id).await?;

            Identity::User { user, permissions }
        }
    };

    req.extensions_mut().insert(identity);
    Ok(req)
}

/// Extracts the token plaintext from an `Authorization` header value.
///
/// The header must be exactly the two tokens `Bearer <value>`, and the value
/// must have the 26-character shape produced by token generation. Anything
/// else yields `None` and is treated the same as an unknown token.
fn parse_bearer_token(value: &HeaderValue) -> Option<String> {
    let value = value.to_str().ok()?;

    let mut parts = value.split(' ');
    let (scheme, token) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || scheme != "Bearer" {
        return None;
    }
    if token.len() != Token::PLAINTEXT_LENGTH {
        return None;
    }

    Some(token.to_string())
}

/// Authorization decision over an already-resolved identity. Pure: performs
/// no I/O and terminates the chain before the permission set is consulted if
/// the account is anonymous or not yet activated.
pub fn check_permission<'a>(identity: &'a Identity, code: &str) -> Result<&'a User, AppError> {
    match identity {
        Identity::Anonymous => Err(AppError::authentication_required()),
        Identity::User { user, permissions } => {
            if !user.activated {
                return Err(AppError::inactive_account());
            }
            if !permissions.include(code) {
                return Err(AppError::not_permitted());
            }
            Ok(user)
        }
    }
}

/// Generates an extractor type gating a handler on a permission code.
///
/// Checks run in order: the request must be authenticated, the account must
/// be activated, and only then is the permission set consulted.
#[macro_export]
macro_rules! require_permission {
    ($name:ident, $code:literal) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::modules::users::model::User);

        impl ::axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = $crate::utils::errors::AppError;

            async fn from_request_parts(
                parts: &mut ::axum::http::request::Parts,
                _state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let identity = parts
                    .extensions
                    .get::<$crate::middleware::auth::Identity>()
                    .ok_or_else(|| {
                        $crate::utils::errors::AppError::server_error(::anyhow::anyhow!(
                            "no identity attached to request, authenticate middleware missing"
                        ))
                    })?;

                let user = $crate::middleware::auth::check_permission(identity, $code)?;
                Ok($name(user.clone()))
            }
        }
    };
}

require_permission!(RequireMoviesRead, "movies:read");
require_permission!(RequireMoviesWrite, "movies:write");

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;

    fn test_user(activated: bool) -> User {
        User {
            id: 1,
            created_at: Utc::now(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "irrelevant".to_string(),
            activated,
            version: 1,
        }
    }

    fn identity(activated: bool, codes: &[&str]) -> Identity {
        Identity::User {
            user: test_user(activated),
            permissions: Permissions::new(codes.iter().map(|c| c.to_string()).collect()),
        }
    }

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    const SAMPLE_TOKEN: &str = "Y3QMGX3PJ3WLRL2YRTQGQ6KRHU";

    #[test]
    fn parses_well_formed_bearer_header() {
        let value = header(&format!("Bearer {SAMPLE_TOKEN}"));
        assert_eq!(parse_bearer_token(&value).as_deref(), Some(SAMPLE_TOKEN));
    }

    #[test]
    fn rejects_malformed_headers() {
        for raw in [
            SAMPLE_TOKEN,                          // missing scheme
            "Bearer",                              // missing value
            "Basic Y3QMGX3PJ3WLRL2YRTQGQ6KRHU",    // wrong scheme
            "bearer Y3QMGX3PJ3WLRL2YRTQGQ6KRHU",   // scheme is case-sensitive
            "Bearer Y3QMGX3PJ3WLRL2YRTQGQ6KRHU x", // extra token
        ] {
            assert_eq!(parse_bearer_token(&header(raw)), None, "accepted {raw:?}");
        }
    }

    #[test]
    fn rejects_values_with_the_wrong_length() {
        assert_eq!(parse_bearer_token(&header("Bearer abc")), None);
        assert_eq!(
            parse_bearer_token(&header(&format!("Bearer {SAMPLE_TOKEN}X"))),
            None
        );
    }

    #[test]
    fn anonymous_identity_requires_authentication() {
        let err = check_permission(&Identity::Anonymous, "movies:read").unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unactivated_account_is_rejected_before_permissions() {
        // The account holds the permission, but activation is the stronger
        // precondition and is checked first.
        let err = check_permission(&identity(false, &["movies:read"]), "movies:read").unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let err = check_permission(&identity(true, &["movies:read"]), "movies:write").unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn activated_account_with_code_passes() {
        let binding = identity(true, &["movies:read", "movies:write"]);
        let user = check_permission(&binding, "movies:write").unwrap();
        assert_eq!(user.id, 1);
    }
}
