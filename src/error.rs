use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::handlers::shared::ApiResponse;

/// The error kinds a store/service operation can fail with, mapped 1:1 to
/// HTTP status by `status_code` below. Ownership checks deliberately produce
/// `NotFound`, never `Forbidden` — see `NotFound::ownership`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("a user with this email already exists")]
    DuplicateEmail,

    #[error("a user with this username already exists")]
    DuplicateUsername,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidAssignment(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("request exceeded its deadline")]
    Timeout,

    #[error("rate limit exceeded")]
    TooManyRequests { retry_after_secs: u64 },

    #[error("the activation email could not be sent")]
    EmailSendFailed,

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// The "ownership-as-NotFound" policy: a caller who does not own a
    /// tenant-scoped resource gets the same response as a caller asking
    /// about a resource id that does not exist at all.
    pub fn ownership_masked() -> Self {
        AppError::NotFound("resource not found".to_string())
    }

    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("resource not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => {
                    let constraint = db_err.constraint().unwrap_or_default();
                    if constraint.contains("email") {
                        AppError::DuplicateEmail
                    } else if constraint.contains("username") {
                        AppError::DuplicateUsername
                    } else {
                        AppError::BadRequest(format!("duplicate value: {constraint}"))
                    }
                }
                // foreign_key_violation / check_violation / restrict
                Some("23503") | Some("23514") => {
                    AppError::BadRequest(db_err.message().to_string())
                }
                _ => AppError::Internal(anyhow::anyhow!(err.to_string())),
            },
            _ => AppError::Internal(anyhow::anyhow!(err.to_string())),
        }
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateEmail | AppError::DuplicateUsername => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::InvalidAssignment(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Timeout | AppError::EmailSendFailed | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        if status_code.is_server_error() {
            log::error!("request failed with status {status_code}: {error_message}");
        } else {
            log::debug!("request failed with status {status_code}: {error_message}");
        }

        let mut builder = HttpResponse::build(status_code);
        if let AppError::TooManyRequests { retry_after_secs } = self {
            builder.insert_header(("Retry-After", retry_after_secs.to_string()));
        }
        builder.json(ApiResponse::<()>::error(&error_message))
    }
}
