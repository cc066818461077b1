use actix_web::{HttpResponse, web};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::auth::OAuthVerifier;
use crate::config::GoogleOAuthConfig;
use crate::database::models::{
    ActivateRequest, AuthResponse, CreateUserRequest, LoginRequest, ResendInvitationRequest,
    TokenResponse, UserInfo,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::RegistrationSaga;

/// `POST /v1/authentication/user` — registration saga step 1.
pub async fn register(
    saga: web::Data<RegistrationSaga>,
    req: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = saga.register(&req).await?;
    Ok(ApiResponse::created(UserInfo::from(user)))
}

/// `POST /v1/authentication/token` — password login.
pub async fn login(
    saga: web::Data<RegistrationSaga>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (user, token) = saga.login(&req.email, &req.password).await?;
    Ok(ApiResponse::success(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// `POST /v1/authentication/refresh` — reissues a token for the caller,
/// same `sub`, fresh `exp`.
pub async fn refresh(
    saga: web::Data<RegistrationSaga>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let token = saga.refresh(user.user.id)?;
    Ok(ApiResponse::success(TokenResponse { token }))
}

/// `POST /v1/authentication/activate`.
pub async fn activate(
    saga: web::Data<RegistrationSaga>,
    req: web::Json<ActivateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = saga.activate(&req.token).await?;
    Ok(ApiResponse::success(UserInfo::from(user)))
}

/// `POST /v1/authentication/resend-invitation`.
pub async fn resend_invitation(
    saga: web::Data<RegistrationSaga>,
    req: web::Json<ResendInvitationRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    saga.resend_invitation(&req.email).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `GET /v1/authentication/user` — the caller's own profile.
pub async fn me(user: AuthenticatedUser) -> HttpResponse {
    ApiResponse::success(UserInfo::from(user.user))
}

/// `GET /v1/oauth/google/login` — redirects the browser to Google's
/// consent screen. Not a capability the repository tests drive directly;
/// the meaningful logic lives in `google_callback`.
pub async fn google_login(config: web::Data<GoogleOAuthConfig>) -> HttpResponse {
    let url = format!(
        "https://accounts.google.com/o/oauth2/v2/auth?client_id={}&redirect_uri={}&response_type=code&scope=openid%20email%20profile",
        config.client_id, config.redirect_url
    );
    HttpResponse::Found()
        .insert_header(("Location", url))
        .finish()
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: String,
}

/// `GET /v1/oauth/google/callback` — exchanges the authorization code for
/// a verified identity, then runs the link-or-create branch in
/// `RegistrationSaga::oauth_login`.
pub async fn google_callback(
    verifier: web::Data<Arc<dyn OAuthVerifier>>,
    saga: web::Data<RegistrationSaga>,
    query: web::Query<OAuthCallbackQuery>,
) -> Result<HttpResponse, AppError> {
    let identity = verifier.exchange(&query.code).await?;
    let (user, token) = saga.oauth_login(identity).await?;
    Ok(ApiResponse::success(AuthResponse {
        token,
        user: user.into(),
    }))
}
