//! HTTP 中间件

mod auth;
mod capability;
mod rate_limit;

pub use auth::auth_middleware;
pub use capability::require_capability;
pub use rate_limit::{RateLimiter, rate_limit_middleware};
