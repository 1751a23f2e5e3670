use axum::{Json, extract::State, http::StatusCode};
use chrono::Duration;
use serde_json::{Value, json};
use tracing::instrument;

use crate::modules::tokens::model::{Token, TokenScope};
use crate::modules::tokens::service::TokenService;
use crate::modules::users::model::{ActivateUserDto, RegisterUserDto};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::password::hash_password;
use crate::validator::ValidatedJson;

/// Registers a new, unactivated account and mails out an activation token.
///
/// Responds 202: the account exists, but the welcome email is still being
/// processed in the background when the response goes out.
#[instrument(skip(state, dto))]
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterUserDto>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let password_hash = hash_password(&dto.password)?;
    let user = UserService::insert(&state.db, &dto.name, &dto.email, &password_hash).await?;

    // New accounts can read the catalog straight away; write access is
    // granted administratively.
    UserService::grant_permissions(&state.db, user.id, &["movies:read"]).await?;

    let token =
        TokenService::new_token(&state.db, user.id, Duration::days(3), TokenScope::Activation)
            .await?;

    // Fire-and-forget: the response does not wait on SMTP, and a delivery
    // failure is only logged.
    let mailer = state.mailer.clone();
    let (email, name, plaintext) = (user.email.clone(), user.name.clone(), token.plaintext.clone());
    tokio::spawn(async move {
        if let Err(err) = mailer.send_welcome_email(&email, &name, &plaintext).await {
            tracing::error!(error = ?err, "failed to send welcome email");
        }
    });

    Ok((StatusCode::ACCEPTED, Json(json!({ "user": user }))))
}

/// Activates the account matching a valid activation token, then burns every
/// activation token the user holds.
#[instrument(skip(state, dto))]
pub async fn activate_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ActivateUserDto>,
) -> Result<Json<Value>, AppError> {
    let digest = Token::digest(&dto.token);
    let user = UserService::get_for_token(&state.db, TokenScope::Activation, &digest)
        .await?
        .ok_or_else(|| {
            AppError::failed_validation_field("token", "invalid or expired activation token")
        })?;

    let user = UserService::activate(&state.db, &user).await?;
    TokenService::delete_all_for_user(&state.db, TokenScope::Activation, user.id).await?;

    Ok(Json(json!({ "user": user })))
}
