//! HTTP middleware and extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (the WebApp front-end may be served from another origin)
//!
//! Admin authentication is an extractor ([`RequireAdmin`]) rather than a
//! layer so each handler states its own requirement.

pub mod admin_auth;
pub mod request_id;

pub use admin_auth::{ADMIN_TOKEN_HEADER, RequireAdmin, admin_token};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
