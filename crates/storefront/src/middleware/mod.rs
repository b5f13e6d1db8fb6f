//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. Request ID (add unique ID to each request)
//! 3. Security headers (CSP, frame and isolation policies)
//! 4. `TraceLayer` (request tracing)
//! 5. Session layer (tower-sessions with in-memory store)
//! 6. Rate limiting on order placement (governor)

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use rate_limit::order_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
