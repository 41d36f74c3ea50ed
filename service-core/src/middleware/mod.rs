pub mod auth;
pub mod bot_detection;
pub mod rate_limit;
pub mod security_headers;
pub mod tracing;

pub use auth::{bearer_auth_middleware, AuthUser};
