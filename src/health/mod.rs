//! Liveness check.
//!
//! `/check` answers 200 with the running version as long as the process can
//! serve requests. It never consults the record lookup.

use axum::Json;
use serde::Serialize;

/// Body of the `/check` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthStatus {
    pub fn current() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Handler for `/check`.
pub async fn check() -> Json<HealthStatus> {
    Json(HealthStatus::current())
}
