use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A registered account.
///
/// The password hash and the optimistic-locking version never appear in JSON
/// responses.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub activated: bool,
    #[serde(skip_serializing)]
    pub version: i32,
}

/// The set of permission codes held by one user, like `movies:read`.
///
/// Queried during authorization, never mutated by it; grants happen through
/// an administrative path.
#[derive(Clone, Debug, Default)]
pub struct Permissions(Vec<String>);

impl Permissions {
    pub fn new(codes: Vec<String>) -> Self {
        Self(codes)
    }

    pub fn include(&self, code: &str) -> bool {
        self.0.iter().any(|held| held == code)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 bytes long"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 72, message = "must be between 8 and 72 bytes long"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActivateUserDto {
    #[validate(length(equal = 26, message = "must be 26 bytes long"))]
    pub token: String,
}
