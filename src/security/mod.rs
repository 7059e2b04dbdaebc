//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Logout / conditional-redirect request:
//!     → redirect_uri.rs (extract, decode, alias, allow-list check)
//!     → validated target or the default landing page
//!     → Pass to the logout flow
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject anything not explicitly allowed
//! - No trust in client input

pub mod redirect_uri;

pub use redirect_uri::{RedirectValidator, REDIRECT_URI_PARAM};
