/// Request middleware
pub mod jwt_auth;
pub mod metrics;

pub use jwt_auth::{JwtAuthMiddleware, UserId};
pub use metrics::MetricsMiddleware;
