use actix_web::{
    Error, HttpResponse, Result,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use futures_util::future::LocalBoxFuture;
use std::rc::Rc;

use crate::config::BasicAuthConfig;
use crate::handlers::shared::ApiResponse;

/// Guards `/v1/docs` with HTTP Basic auth. Reuses the `base64` crate the
/// teacher already depends on for cache-tag encoding
/// (`src/middleware/cache.rs`), here for its literal purpose.
#[derive(Clone)]
pub struct BasicAuthMiddleware {
    config: BasicAuthConfig,
}

impl BasicAuthMiddleware {
    pub fn new(config: BasicAuthConfig) -> Self {
        Self { config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BasicAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = BasicAuthService<S>;
    type InitError = ();
    type Future = futures_util::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        futures_util::future::ready(Ok(BasicAuthService {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct BasicAuthService<S> {
    service: Rc<S>,
    config: BasicAuthConfig,
}

impl<S, B> Service<ServiceRequest> for BasicAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let expected_user = self.config.user.clone();
        let expected_pass = self.config.pass.clone();

        let authorized = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.strip_prefix("Basic "))
            .and_then(|encoded| STANDARD.decode(encoded).ok())
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(|decoded| {
                let (user, pass) = decoded.split_once(':')?;
                Some(user == expected_user && pass == expected_pass)
            })
            .unwrap_or(false);

        if !authorized {
            let response = HttpResponse::Unauthorized()
                .insert_header((header::WWW_AUTHENTICATE, "Basic realm=\"resa-docs\""))
                .json(ApiResponse::<()>::error("authentication required"));
            return Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) });
        }

        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
