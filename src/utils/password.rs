use bcrypt::{DEFAULT_COST, hash, verify};

use crate::utils::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    Ok(hash(password, DEFAULT_COST)?)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    Ok(verify(password, password_hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hashed = hash_password("pa55word12345").unwrap();

        assert_ne!(hashed, "pa55word12345");
        assert!(verify_password("pa55word12345", &hashed).unwrap());
        assert!(!verify_password("wrong password", &hashed).unwrap());
    }
}
