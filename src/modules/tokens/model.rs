use chrono::{DateTime, Duration, Utc};
use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use validator::Validate;

use crate::utils::errors::AppError;

/// Purpose tag for a token. A token issued for one scope is never accepted
/// for another, so an activation token cannot be replayed as a login.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenScope {
    Activation,
    Authentication,
}

impl TokenScope {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenScope::Activation => "activation",
            TokenScope::Authentication => "authentication",
        }
    }
}

/// An opaque credential tied to one user.
///
/// The plaintext exists only transiently: it is generated, handed out exactly
/// once (in an email or API response) and is never retrievable again. Only
/// the SHA-256 digest is persisted, and all verification compares digests.
/// Equal digests imply equal plaintexts with cryptographic confidence.
#[derive(Debug, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip_serializing)]
    pub hash: [u8; 32],
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub scope: TokenScope,
}

impl Token {
    /// Length of the base-32 plaintext produced by [`Token::generate`]:
    /// 16 random bytes encode to 26 characters without padding.
    pub const PLAINTEXT_LENGTH: usize = 26;

    /// Generates a new token from 16 bytes of OS-level randomness.
    ///
    /// An unavailable entropy source is a hard failure; a weaker source is
    /// never substituted.
    pub fn generate(user_id: i64, ttl: Duration, scope: TokenScope) -> Result<Token, AppError> {
        let mut random_bytes = [0u8; 16];
        OsRng.try_fill_bytes(&mut random_bytes).map_err(|err| {
            AppError::server_error(anyhow::anyhow!("entropy source unavailable: {err}"))
        })?;

        let plaintext = BASE32_NOPAD.encode(&random_bytes);
        let hash = Self::digest(&plaintext);

        Ok(Token {
            plaintext,
            hash,
            user_id,
            expiry: Utc::now() + ttl,
            scope,
        })
    }

    /// One-way digest of a token plaintext. Deterministic, so the value
    /// computed at generation time and the value computed at verification
    /// time are directly comparable.
    pub fn digest(plaintext: &str) -> [u8; 32] {
        Sha256::digest(plaintext.as_bytes()).into()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAuthenticationTokenDto {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 72, message = "must be between 8 and 72 bytes long"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateActivationTokenDto {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_plaintext_is_26_base32_characters() {
        let token = Token::generate(1, Duration::hours(1), TokenScope::Activation).unwrap();

        assert_eq!(token.plaintext.len(), Token::PLAINTEXT_LENGTH);
        assert!(
            token
                .plaintext
                .chars()
                .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
        );
    }

    #[test]
    fn digest_is_deterministic_and_matches_generation() {
        let token = Token::generate(1, Duration::hours(1), TokenScope::Authentication).unwrap();

        assert_eq!(Token::digest(&token.plaintext), token.hash);
        assert_eq!(
            Token::digest(&token.plaintext),
            Token::digest(&token.plaintext)
        );
    }

    #[test]
    fn distinct_generations_do_not_collide() {
        let mut digests = HashSet::new();
        for _ in 0..1_000 {
            let token = Token::generate(1, Duration::hours(1), TokenScope::Activation).unwrap();
            assert!(digests.insert(token.hash), "digest collision");
        }
    }

    #[test]
    fn expiry_is_now_plus_ttl() {
        let before = Utc::now();
        let token = Token::generate(1, Duration::days(3), TokenScope::Activation).unwrap();
        let after = Utc::now();

        assert!(token.expiry >= before + Duration::days(3));
        assert!(token.expiry <= after + Duration::days(3));
    }

    #[test]
    fn scopes_serialize_to_distinct_storage_tags() {
        assert_eq!(TokenScope::Activation.as_str(), "activation");
        assert_eq!(TokenScope::Authentication.as_str(), "authentication");
    }

    #[test]
    fn token_json_exposes_only_plaintext_and_expiry() {
        let token = Token::generate(7, Duration::hours(24), TokenScope::Authentication).unwrap();
        let json = serde_json::to_value(&token).unwrap();

        assert!(json.get("token").is_some());
        assert!(json.get("expiry").is_some());
        assert!(json.get("hash").is_none());
        assert!(json.get("user_id").is_none());
        assert!(json.get("scope").is_none());
    }
}
