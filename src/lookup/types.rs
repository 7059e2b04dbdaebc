//! Platform API types and lookup errors.

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Result type for platform lookups.
pub type LookupResult<T> = Result<T, LookupError>;

/// Errors raised while talking to the platform API.
///
/// These never reach a caller of the classifier; they are logged and turned
/// into an unknown classification.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("token response has no access_token")]
    MissingToken,

    #[error("lookup timed out after {0}ms")]
    Timeout(u64),
}

/// OAuth client-credentials token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    /// Lifetime in seconds. Tokens without one are kept until rejected.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Sierra sends explicit nulls for absent arrays and strings.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `GET /bibs` response envelope.
#[derive(Debug, Default, Deserialize)]
pub struct BibsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<BibRecord>,
}

/// One bibliographic record, reduced to the fields used for classification.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BibRecord {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub var_fields: Vec<VarField>,
}

/// A MARC variable field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarField {
    #[serde(default)]
    pub marc_tag: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subfields: Vec<Subfield>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Subfield {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

impl BibRecord {
    /// Content of the first `marc_tag $subfield` pair, if present.
    pub fn subfield(&self, marc_tag: &str, subfield: &str) -> Option<&str> {
        self.var_fields
            .iter()
            .filter(|f| f.marc_tag.as_deref() == Some(marc_tag))
            .flat_map(|f| f.subfields.iter())
            .find(|s| s.tag == subfield)
            .map(|s| s.content.as_str())
    }
}
