use actix_web::{
    Error, HttpResponse, Result,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::rc::Rc;
use std::time::Duration;

use crate::handlers::shared::ApiResponse;

/// Whole-request safety net applied on top of the per-operation deadline
/// each `Pg*Repository` method already enforces around its own `sqlx`
/// future via `query_timeout`. A single slow request can still issue
/// several repository calls in sequence, each individually within budget
/// but summing past what a client should have to wait on; this middleware
/// bounds that total.
#[derive(Clone)]
pub struct RequestDeadline {
    timeout: Duration,
}

impl RequestDeadline {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestDeadline
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequestDeadlineService<S>;
    type InitError = ();
    type Future = futures_util::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        futures_util::future::ready(Ok(RequestDeadlineService {
            service: Rc::new(service),
            timeout: self.timeout,
        }))
    }
}

pub struct RequestDeadlineService<S> {
    service: Rc<S>,
    timeout: Duration,
}

impl<S, B> Service<ServiceRequest> for RequestDeadlineService<S>
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
        let timeout = self.timeout;
        let http_req = req.request().clone();
        let path = req.path().to_string();

        Box::pin(async move {
            match tokio::time::timeout(timeout, service.call(req)).await {
                Ok(result) => Ok(result?.map_into_left_body()),
                Err(_) => {
                    log::warn!("request to {path} exceeded its deadline");
                    let response = HttpResponse::InternalServerError()
                        .json(ApiResponse::<()>::error("request exceeded its deadline"));
                    Ok(ServiceResponse::new(http_req, response).map_into_right_body())
                }
            }
        })
    }
}
