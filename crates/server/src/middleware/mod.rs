//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (`/api` only)
//! 5. Security headers (HTML pages and static files)
//!
//! [`ClientInfo`](crate::models::ClientInfo) is not a layer but an extractor
//! reading the caller's address and user agent.

pub mod client_info;
pub mod request_id;
pub mod security_headers;

pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
