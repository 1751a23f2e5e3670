use axum::{Router, routing::post};

use crate::modules::tokens::controller::{create_activation_token, create_authentication_token};
use crate::state::AppState;

pub fn init_tokens_router() -> Router<AppState> {
    Router::new()
        .route("/authentication", post(create_authentication_token))
        .route("/activation", post(create_activation_token))
}
