//! Catalog redirect service library.
//!
//! Maps URLs of retired catalog front-ends onto the research catalog and the
//! circulating catalog.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod lookup;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
