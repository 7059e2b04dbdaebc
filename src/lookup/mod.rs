//! External record classification.
//!
//! # Data Flow
//! ```text
//! oclc rule handler
//!     → RecordClassifier::classify(identifier)
//!     → classifier.rs (deadline, error → Unknown)
//!     → client.rs (lazy client: OAuth token → GET /bibs)
//!     → RecordSource { Primary | Secondary | Unknown }
//! ```
//!
//! # Design Decisions
//! - Classification never fails; errors and timeouts mean Unknown
//! - No retries; a failed lookup degrades that one request
//! - The client is built once and shared read-only by every request

pub mod classifier;
pub mod client;
pub mod types;

use async_trait::async_trait;

pub use classifier::PlatformClassifier;
pub use client::{LazyPlatformClient, PlatformClient};
pub use types::LookupError;

/// Which catalog currently owns a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    /// Research catalog.
    Primary,
    /// Circulating catalog, with that catalog's record id.
    Secondary { record_id: String },
    Unknown,
}

impl RecordSource {
    pub fn label(&self) -> &'static str {
        match self {
            RecordSource::Primary => "primary",
            RecordSource::Secondary { .. } => "secondary",
            RecordSource::Unknown => "unknown",
        }
    }
}

/// Decides which catalog owns a record identified by a standard number.
#[async_trait]
pub trait RecordClassifier: Send + Sync + std::fmt::Debug {
    async fn classify(&self, identifier: &str) -> RecordSource;
}

/// Classifier with a fixed answer. Used when the lookup is disabled.
#[derive(Debug, Clone)]
pub struct StaticClassifier {
    source: RecordSource,
}

impl StaticClassifier {
    pub fn new(source: RecordSource) -> Self {
        Self { source }
    }
}

#[async_trait]
impl RecordClassifier for StaticClassifier {
    async fn classify(&self, _identifier: &str) -> RecordSource {
        self.source.clone()
    }
}
