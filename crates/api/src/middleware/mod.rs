//! HTTP middleware stack for the recipe API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span with `request_id` and `user_id` fields)
//! 3. Request ID (adopt or generate `x-request-id`)
//! 4. Rate limiting on the token endpoint (governor)
//!
//! Authentication is an extractor ([`RequireAuth`]) rather than a layer, as
//! is JSON body decoding ([`ValidJson`]).

pub mod auth;
pub mod json;
pub mod rate_limit;
pub mod request_id;

pub use auth::RequireAuth;
pub use json::ValidJson;
pub use rate_limit::token_rate_limiter;
pub use request_id::request_id_middleware;
