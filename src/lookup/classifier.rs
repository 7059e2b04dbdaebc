//! Record classification against the platform API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::time::timeout;

use crate::config::LookupConfig;
use crate::lookup::client::LazyPlatformClient;
use crate::lookup::types::{BibRecord, LookupError, LookupResult};
use crate::lookup::{RecordClassifier, RecordSource};
use crate::observability::metrics;

/// MARC field carrying the collection code.
const COLLECTION_TAG: &str = "910";
const COLLECTION_SUBFIELD: &str = "a";
const RESEARCH_COLLECTION: &str = "RL";
const CIRCULATING_COLLECTION: &str = "BL";

/// Classifies OCLC numbers by the collection code of the matching record.
#[derive(Debug)]
pub struct PlatformClassifier {
    client: LazyPlatformClient,
    deadline: Duration,
}

impl PlatformClassifier {
    pub fn new(config: LookupConfig) -> Self {
        let deadline = Duration::from_millis(config.timeout_ms);
        Self {
            client: LazyPlatformClient::new(config),
            deadline,
        }
    }

    async fn lookup(&self, identifier: &str) -> LookupResult<RecordSource> {
        let client = self.client.get().await?;
        let records = client.bibs_by_control_number(identifier).await?;
        Ok(records
            .first()
            .map(source_from_record)
            .unwrap_or(RecordSource::Unknown))
    }
}

/// Map a record's collection code to where it lives.
pub fn source_from_record(record: &BibRecord) -> RecordSource {
    match record.subfield(COLLECTION_TAG, COLLECTION_SUBFIELD) {
        Some(RESEARCH_COLLECTION) => RecordSource::Primary,
        Some(CIRCULATING_COLLECTION) => RecordSource::Secondary {
            record_id: record.id.clone(),
        },
        _ => RecordSource::Unknown,
    }
}

#[async_trait]
impl RecordClassifier for PlatformClassifier {
    async fn classify(&self, identifier: &str) -> RecordSource {
        let started = Instant::now();

        let result = match timeout(self.deadline, self.lookup(identifier)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout(self.deadline.as_millis() as u64)),
        };

        match result {
            Ok(source) => {
                tracing::debug!(identifier = %identifier, source = ?source, "Record classified");
                metrics::record_lookup(source.label(), started);
                source
            }
            Err(e) => {
                tracing::warn!(identifier = %identifier, error = %e, "Record lookup failed");
                metrics::record_lookup("error", started);
                RecordSource::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::types::{Subfield, VarField};

    fn record(code: &str) -> BibRecord {
        BibRecord {
            id: "21317167".to_string(),
            var_fields: vec![VarField {
                marc_tag: Some("910".to_string()),
                subfields: vec![Subfield {
                    tag: "a".to_string(),
                    content: code.to_string(),
                }],
            }],
        }
    }

    #[test]
    fn test_collection_codes() {
        assert_eq!(source_from_record(&record("RL")), RecordSource::Primary);
        assert_eq!(
            source_from_record(&record("BL")),
            RecordSource::Secondary {
                record_id: "21317167".to_string()
            }
        );
        assert_eq!(source_from_record(&record("XX")), RecordSource::Unknown);
        assert_eq!(source_from_record(&BibRecord::default()), RecordSource::Unknown);
    }

    #[tokio::test]
    async fn test_unreachable_platform_is_unknown() {
        let classifier = PlatformClassifier::new(LookupConfig {
            enabled: true,
            platform_base_url: "http://127.0.0.1:9/api".to_string(),
            token_url: "http://127.0.0.1:9/oauth/token".to_string(),
            timeout_ms: 500,
            ..LookupConfig::default()
        });

        assert_eq!(classifier.classify("1081334684").await, RecordSource::Unknown);
        assert!(classifier.client.is_initialized());
    }
}
