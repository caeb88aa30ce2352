//! HTTP middleware stack for the gateway.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (correlation id in span, scope and response)
//! 4. Route guard (login redirect for protected paths)

pub mod guard;
pub mod request_id;
pub mod session;

pub use guard::route_guard;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use session::RequestSession;
