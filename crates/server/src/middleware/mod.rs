//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, error capture)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. Rate limiting on `/api` (governor)
//!
//! Authentication is not a layer: handlers opt in through the
//! [`CurrentUser`] and [`MaybeUser`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{CurrentUser, MaybeUser};
pub use rate_limit::{AttemptLimiter, ClientKey, api_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{clear_session_cookie, session_cookie};
