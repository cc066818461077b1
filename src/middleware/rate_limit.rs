use actix_web::{
    Error, HttpResponse, Result,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
};
use chrono::{DateTime, Duration, Utc};
use futures_util::future::LocalBoxFuture;
use std::{
    collections::HashMap,
    net::IpAddr,
    rc::Rc,
    sync::{Arc, Mutex},
};

use crate::config::RateLimiterConfig;
use crate::handlers::shared::ApiResponse;

/// Per-remote-address token bucket, built around a
/// `RequestTracker`/`Mutex<HashMap<IpAddr, RequestTracker>>`,
/// parameterized by `Config.rate_limiter`
/// and emitting a `Retry-After` header on `429`.
#[derive(Debug, Clone)]
struct RequestTracker {
    count: u32,
    window_start: DateTime<Utc>,
}

impl RequestTracker {
    fn new() -> Self {
        Self {
            count: 1,
            window_start: Utc::now(),
        }
    }

    fn seconds_remaining(&self, window_seconds: i64) -> i64 {
        let window = Duration::seconds(window_seconds);
        let elapsed = Utc::now() - self.window_start;
        (window - elapsed).num_seconds().max(0)
    }

    fn is_expired(&self, window_seconds: i64) -> bool {
        self.seconds_remaining(window_seconds) == 0
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    trackers: Arc<Mutex<HashMap<IpAddr, RequestTracker>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            trackers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns `None` when the request is allowed, `Some(retry_after_secs)`
    /// when it should be rejected.
    fn check(&self, ip: IpAddr) -> Option<u64> {
        if !self.config.enabled {
            return None;
        }

        let mut trackers = self.trackers.lock().unwrap();
        let tracker = trackers.entry(ip).or_insert_with(RequestTracker::new);

        if tracker.is_expired(self.config.time_frame_secs) {
            *tracker = RequestTracker::new();
            return None;
        }

        if tracker.count >= self.config.requests_count {
            return Some(tracker.seconds_remaining(self.config.time_frame_secs) as u64);
        }

        tracker.count += 1;
        None
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimiterService<S>;
    type InitError = ();
    type Future = futures_util::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        futures_util::future::ready(Ok(RateLimiterService {
            service: Rc::new(service),
            limiter: self.clone(),
        }))
    }
}

pub struct RateLimiterService<S> {
    service: Rc<S>,
    limiter: RateLimiter,
}

impl<S, B> Service<ServiceRequest> for RateLimiterService<S>
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
        let limiter = self.limiter.clone();

        let client_ip = req
            .connection_info()
            .peer_addr()
            .and_then(|addr| addr.split(':').next())
            .and_then(|ip| ip.parse::<IpAddr>().ok());

        if let Some(ip) = client_ip {
            if let Some(retry_after_secs) = limiter.check(ip) {
                log::warn!("rate limit exceeded for {ip}, retry after {retry_after_secs}s");
                let response = HttpResponse::TooManyRequests()
                    .insert_header((header::RETRY_AFTER, retry_after_secs.to_string()))
                    .json(ApiResponse::<()>::error("rate limit exceeded"));
                return Box::pin(async move {
                    Ok(req.into_response(response).map_into_right_body())
                });
            }
        }

        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(requests_count: u32) -> RateLimiterConfig {
        RateLimiterConfig {
            enabled: true,
            requests_count,
            time_frame_secs: 60,
        }
    }

    #[test]
    fn allows_requests_under_the_limit() {
        let limiter = RateLimiter::new(config(2));
        let ip = IpAddr::from([127, 0, 0, 1]);
        assert!(limiter.check(ip).is_none());
        assert!(limiter.check(ip).is_none());
    }

    #[test]
    fn blocks_requests_over_the_limit() {
        let limiter = RateLimiter::new(config(1));
        let ip = IpAddr::from([127, 0, 0, 1]);
        assert!(limiter.check(ip).is_none());
        assert!(limiter.check(ip).is_some());
    }

    #[test]
    fn disabled_limiter_never_blocks() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            enabled: false,
            requests_count: 1,
            time_frame_secs: 60,
        });
        let ip = IpAddr::from([127, 0, 0, 1]);
        assert!(limiter.check(ip).is_none());
        assert!(limiter.check(ip).is_none());
    }
}
