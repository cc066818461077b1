use actix_web::HttpResponse;
use serde::Serialize;
use std::marker::PhantomData;

/// The two shapes on RESA's wire: `{ "data": ... }` on success, `{ "error":
/// "..." }` on failure. Kept as a thin helper-function idiom rather than a
/// single enum, because
/// only the error variant is ever constructed generically — success bodies
/// are built straight from handler return values.
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub error: &'a str,
}

/// `T` is only ever used by the `error` constructor (callers that have no
/// success payload in scope write `ApiResponse::<()>::error(...)`); it
/// carries no data of its own.
pub struct ApiResponse<T = ()>(PhantomData<T>);

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK with `{ "data": ... }`.
    pub fn success(data: T) -> HttpResponse {
        HttpResponse::Ok().json(DataEnvelope { data })
    }

    /// 201 Created with `{ "data": ... }`.
    pub fn created(data: T) -> HttpResponse {
        HttpResponse::Created().json(DataEnvelope { data })
    }

    /// 204 No Content.
    pub fn deleted() -> HttpResponse {
        HttpResponse::NoContent().finish()
    }

    /// Builds the body used by `AppError::error_response`.
    pub fn error(message: &str) -> ErrorEnvelope<'_> {
        ErrorEnvelope { error: message }
    }
}
