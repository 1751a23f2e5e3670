use sqlx::PgPool;
use tracing::instrument;

use crate::modules::tokens::model::TokenScope;
use crate::modules::users::model::{Permissions, User};
use crate::utils::errors::AppError;

const USER_COLUMNS: &str = "id, created_at, name, email, password_hash, activated, version";

/// PostgreSQL error code for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

pub struct UserService;

impl UserService {
    #[instrument(skip(db, password_hash))]
    pub async fn insert(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, activated)
             VALUES ($1, $2, $3, false)
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .fetch_one(db)
            .await
            .map_err(|err| {
                if let sqlx::Error::Database(db_err) = &err {
                    if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                        return AppError::failed_validation_field(
                            "email",
                            "a user with this email address already exists",
                        );
                    }
                }
                err.into()
            })
    }

    #[instrument(skip(db))]
    pub async fn get_by_email(db: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(db)
            .await?;

        Ok(user)
    }

    /// Marks the account activated under optimistic locking. A concurrent
    /// update to the same row surfaces as an edit conflict.
    #[instrument(skip(db, user))]
    pub async fn activate(db: &PgPool, user: &User) -> Result<User, AppError> {
        let query = format!(
            "UPDATE users SET activated = true, version = version + 1
             WHERE id = $1 AND version = $2
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(user.version)
            .fetch_optional(db)
            .await?
            .ok_or_else(AppError::edit_conflict)
    }

    /// Resolves a token digest to its owner, restricted to the given scope
    /// and to tokens that have not expired. An expired token behaves exactly
    /// like one that never existed.
    #[instrument(skip(db, digest))]
    pub async fn get_for_token(
        db: &PgPool,
        scope: TokenScope,
        digest: &[u8; 32],
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT users.id, users.created_at, users.name, users.email,
                    users.password_hash, users.activated, users.version
             FROM users
             INNER JOIN tokens ON tokens.user_id = users.id
             WHERE tokens.hash = $1
               AND tokens.scope = $2
               AND tokens.expiry > now()",
        )
        .bind(digest.as_slice())
        .bind(scope.as_str())
        .fetch_optional(db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn permissions_for_user(db: &PgPool, user_id: i64) -> Result<Permissions, AppError> {
        let codes: Vec<String> = sqlx::query_scalar(
            "SELECT permissions.code
             FROM permissions
             INNER JOIN users_permissions ON users_permissions.permission_id = permissions.id
             WHERE users_permissions.user_id = $1",
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(Permissions::new(codes))
    }

    #[instrument(skip(db))]
    pub async fn grant_permissions(
        db: &PgPool,
        user_id: i64,
        codes: &[&str],
    ) -> Result<(), AppError> {
        let codes: Vec<String> = codes.iter().map(|code| code.to_string()).collect();

        sqlx::query(
            "INSERT INTO users_permissions
             SELECT $1, permissions.id FROM permissions WHERE permissions.code = ANY($2)",
        )
        .bind(user_id)
        .bind(codes)
        .execute(db)
        .await?;

        Ok(())
    }
}
