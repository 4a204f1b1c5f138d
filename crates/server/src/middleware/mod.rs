//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded into the span)
//! 4. CORS
//!
//! Authentication is not a layer: protected handlers take the
//! [`RequireIdentity`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::{RequireIdentity, bearer_token};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
