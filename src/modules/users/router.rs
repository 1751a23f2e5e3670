use axum::{
    Router,
    routing::{post, put},
};

use crate::modules::users::controller::{activate_user, register_user};
use crate::state::AppState;

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_user))
        .route("/activated", put(activate_user))
}
