//! Middleware for the web server.

pub mod cors;
pub mod rate_limit;
pub mod security;

pub use cors::create_cors_layer;
pub use rate_limit::{upload_rate_limit, UploadRateLimiter};
pub use security::security_headers;
