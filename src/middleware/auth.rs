use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};

use crate::auth::jwt;
use crate::config::Config;
use crate::database::models::User;
use crate::database::repositories::UserRepository;
use crate::error::AppError;

/// The authenticated caller, loaded from the `Authorization: Bearer <jwt>`
/// header. Async because the user row has to be loaded after the token is
/// validated — structurally an `impl FromRequest for Claims` widened to
/// load the user.
pub struct AuthenticatedUser {
    pub user: User,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let config = req
                .app_data::<Data<Config>>()
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("missing Config in app data")))?;

            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

            let claims = jwt::validate(token, &config.auth_token)?;

            let repo = req
                .app_data::<Data<Arc<dyn UserRepository>>>()
                .ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!("missing UserRepository in app data"))
                })?;

            let user = repo
                .find_by_id(claims.sub)
                .await?
                .filter(|u| u.is_active)
                .ok_or_else(|| AppError::Unauthorized("account is not active".to_string()))?;

            Ok(AuthenticatedUser { user })
        })
    }
}
