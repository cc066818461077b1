use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GoogleOAuthConfig;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct OAuthIdentity {
    pub provider_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

/// Boundary around the Google identity provider: the provider itself is
/// out of scope here, but RESA still needs to exchange an authorization
/// code for the caller's identity.
#[async_trait]
pub trait OAuthVerifier: Send + Sync {
    async fn exchange(&self, code: &str) -> Result<OAuthIdentity, AppError>;
}

#[derive(Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    given_name: Option<String>,
    family_name: Option<String>,
    picture: Option<String>,
}

pub struct GoogleOAuthVerifier {
    client: reqwest::Client,
    config: GoogleOAuthConfig,
}

impl GoogleOAuthVerifier {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl OAuthVerifier for GoogleOAuthVerifier {
    async fn exchange(&self, code: &str) -> Result<OAuthIdentity, AppError> {
        let token_response: GoogleTokenResponse = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Unauthorized(format!("oauth code exchange failed: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::Unauthorized(format!("oauth token response malformed: {e}")))?;

        let user_info: GoogleUserInfo = self
            .client
            .get("https://openidconnect.googleapis.com/v1/userinfo")
            .bearer_auth(token_response.access_token)
            .send()
            .await
            .map_err(|e| AppError::Unauthorized(format!("oauth userinfo fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::Unauthorized(format!("oauth userinfo malformed: {e}")))?;

        Ok(OAuthIdentity {
            provider_id: user_info.sub,
            email: user_info.email,
            first_name: user_info.given_name.unwrap_or_default(),
            last_name: user_info.family_name.unwrap_or_default(),
            avatar_url: user_info.picture,
        })
    }
}

/// Test double returning a fixed identity, for handler/service tests that
/// don't want to reach the network.
pub struct StaticOAuthVerifier {
    pub identity: OAuthIdentity,
}

#[async_trait]
impl OAuthVerifier for StaticOAuthVerifier {
    async fn exchange(&self, _code: &str) -> Result<OAuthIdentity, AppError> {
        Ok(self.identity.clone())
    }
}
