pub mod auth;
pub mod basic_auth;
pub mod deadline;
pub mod rate_limit;
pub mod request_id;
pub mod restaurant_context;

pub use auth::AuthenticatedUser;
pub use basic_auth::{BasicAuthMiddleware, BasicAuthService};
pub use deadline::{RequestDeadline, RequestDeadlineService};
pub use rate_limit::{RateLimiter, RateLimiterService};
pub use request_id::{RequestIdExt, RequestIdMiddleware, RequestIdMiddlewareService};
pub use restaurant_context::RestaurantContext;
