use axum::{Json, extract::State, http::StatusCode};
use chrono::Duration;
use serde_json::{Value, json};
use tracing::instrument;

use crate::modules::tokens::model::{
    CreateActivationTokenDto, CreateAuthenticationTokenDto, TokenScope,
};
use crate::modules::tokens::service::TokenService;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::password::verify_password;
use crate::validator::ValidatedJson;

/// Exchanges an email and password for a 24-hour authentication token.
///
/// Unknown email and wrong password produce the same 401, so the endpoint
/// does not reveal which addresses have accounts.
#[instrument(skip(state, dto))]
pub async fn create_authentication_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateAuthenticationTokenDto>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user = UserService::get_by_email(&state.db, &dto.email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&dto.password, &user.password_hash)? {
        return Err(AppError::invalid_credentials());
    }

    let token =
        TokenService::new_token(&state.db, user.id, Duration::hours(24), TokenScope::Authentication)
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "authentication_token": token })),
    ))
}

/// Issues a fresh activation token for a not-yet-activated account and mails
/// it out in the background.
#[instrument(skip(state, dto))]
pub async fn create_activation_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateActivationTokenDto>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user = UserService::get_by_email(&state.db, &dto.email)
        .await?
        .ok_or_else(|| {
            AppError::failed_validation_field("email", "no matching email address found")
        })?;

    if user.activated {
        return Err(AppError::failed_validation_field(
            "email",
            "user has already been activated",
        ));
    }

    let token =
        TokenService::new_token(&state.db, user.id, Duration::days(3), TokenScope::Activation)
            .await?;

    // Fire-and-forget: the 202 below is sent without waiting on SMTP, and a
    // delivery failure is only logged.
    let mailer = state.mailer.clone();
    let (email, name, plaintext) = (user.email.clone(), user.name.clone(), token.plaintext.clone());
    tokio::spawn(async move {
        if let Err(err) = mailer.send_activation_token(&email, &name, &plaintext).await {
            tracing::error!(error = ?err, "failed to send activation token email");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "an email will be sent to you containing activation instructions"
        })),
    ))
}
