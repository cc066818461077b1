use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Issues a fresh plaintext invitation token and its SHA-256 hex digest.
/// Only the digest is ever persisted (`UserInvitation::token_hash`); the
/// plaintext is mailed to the user and never stored.
pub fn issue() -> (String, String) {
    let token = Uuid::new_v4().to_string();
    let hash = hash_token(&token);
    (token, hash)
}

pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let (token, hash) = issue();
        assert_eq!(hash_token(&token), hash);
    }

    #[test]
    fn distinct_tokens_hash_differently() {
        let (_, hash_a) = issue();
        let (_, hash_b) = issue();
        assert_ne!(hash_a, hash_b);
    }
}
