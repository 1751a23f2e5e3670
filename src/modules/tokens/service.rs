use chrono::Duration;
use sqlx::PgPool;
use tracing::instrument;

use crate::modules::tokens::model::{Token, TokenScope};
use crate::utils::errors::AppError;

pub struct TokenService;

impl TokenService {
    /// Generates a token and persists its digest in one step. The plaintext
    /// on the returned token is the only copy that will ever exist.
    #[instrument(skip(db))]
    pub async fn new_token(
        db: &PgPool,
        user_id: i64,
        ttl: Duration,
        scope: TokenScope,
    ) -> Result<Token, AppError> {
        let token = Token::generate(user_id, ttl, scope)?;
        Self::insert(db, &token).await?;
        Ok(token)
    }

    #[instrument(skip(db, token))]
    pub async fn insert(db: &PgPool, token: &Token) -> Result<(), AppError> {
        sqlx::query("INSERT INTO tokens (hash, user_id, expiry, scope) VALUES ($1, $2, $3, $4)")
            .bind(token.hash.as_slice())
            .bind(token.user_id)
            .bind(token.expiry)
            .bind(token.scope.as_str())
            .execute(db)
            .await?;

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn delete_all_for_user(
        db: &PgPool,
        scope: TokenScope,
        user_id: i64,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM tokens WHERE scope = $1 AND user_id = $2")
            .bind(scope.as_str())
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(())
    }
}
