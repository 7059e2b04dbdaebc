//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, timeout)
//!     → /check, logout endpoints (logout.rs), or the redirect fallback
//!     → request.rs (path, raw query, host, protocol)
//!     → [routing layer resolves the destination]
//!     → response.rs (redirect, conditional page, debug report)
//!     → Send to client
//! ```

pub mod logout;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestError, RequestInfo, RequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer, RedirectPolicy, ServerError};
