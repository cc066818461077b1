use bcrypt::{DEFAULT_COST, hash, verify};

use crate::error::AppError;

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    hash(plain, DEFAULT_COST).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, AppError> {
    verify(plain, hashed).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_password() {
        let hashed = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hashed).unwrap());
        assert!(!verify_password("wrong password", &hashed).unwrap());
    }
}
