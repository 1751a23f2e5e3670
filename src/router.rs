use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::logging::logging_middleware;
use crate::middleware::auth::authenticate;
use crate::middleware::rate_limit::rate_limit;
use crate::middleware::recover::handle_panic;
use crate::modules::healthcheck::init_healthcheck_router;
use crate::modules::movies::router::init_movies_router;
use crate::modules::tokens::router::init_tokens_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Builds the application router wrapped in the gatekeeping pipeline.
///
/// Axum applies layers bottom-up, so they are added here in inner-to-outer
/// order: authentication innermost, then rate limiting (so excess load is
/// shed before credential work), CORS, request logging, and panic recovery
/// outermost so a fault in any inner stage still produces a controlled
/// response.
pub fn init_router(state: AppState) -> Router {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ]);

    Router::new()
        .nest(
            "/v1",
            Router::new()
                .merge(init_healthcheck_router())
                .nest("/movies", init_movies_router())
                .nest("/users", init_users_router())
                .nest("/tokens", init_tokens_router()),
        )
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::not_found()
}

async fn method_not_allowed(method: Method) -> AppError {
    AppError::method_not_allowed(&method)
}
