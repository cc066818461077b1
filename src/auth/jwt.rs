use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TokenAuthConfig;
use crate::error::AppError;

/// Claims carried by every issued token: `sub`, `iat`, `nbf`, `exp`, `iss`,
/// `aud` — `iss` and `aud` both carry the single configured `cfg.iss` value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

pub fn issue(user_id: Uuid, cfg: &TokenAuthConfig) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        nbf: now.timestamp(),
        exp: (now + Duration::days(cfg.exp_days)).timestamp(),
        iss: cfg.iss.clone(),
        aud: cfg.iss.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

pub fn validate(token: &str, cfg: &TokenAuthConfig) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&cfg.iss]);
    validation.set_audience(&[&cfg.iss]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.secret.as_ref()),
        &validation,
    )
    .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TokenAuthConfig {
        TokenAuthConfig {
            secret: "test-secret".to_string(),
            exp_days: 7,
            iss: "resa".to_string(),
        }
    }

    #[test]
    fn round_trips_a_token() {
        let cfg = config();
        let user_id = Uuid::new_v4();
        let token = issue(user_id, &cfg).unwrap();
        let claims = validate(&token, &cfg).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.aud, cfg.iss);
    }

    #[test]
    fn rejects_token_signed_with_a_different_secret() {
        let cfg = config();
        let token = issue(Uuid::new_v4(), &cfg).unwrap();

        let other = TokenAuthConfig {
            secret: "a-different-secret".to_string(),
            ..cfg
        };
        assert!(validate(&token, &other).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let cfg = TokenAuthConfig {
            exp_days: -1,
            ..config()
        };
        let token = issue(Uuid::new_v4(), &cfg).unwrap();
        assert!(validate(&token, &cfg).is_err());
    }
}
