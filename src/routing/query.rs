//! Multi-valued query parameters and original-URL reconstruction.
//!
//! # Design Decisions
//! - Query strings are kept raw: no percent-decoding on the way in, so a
//!   reconstructed URL is byte-for-byte what the client sent
//! - Keys keep the order of their first appearance; values keep arrival order
//! - A key with an empty value is data (legacy search terms hide in bare keys)

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Characters left alone by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a value for use as a single URL component.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Ordered multimap of query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (without the leading `?`).
    pub fn parse(raw: &str) -> Self {
        let mut params = Self::new();
        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((key, value)) => params.append(key, value),
                None => params.append(pair, ""),
            }
        }
        params
    }

    /// Add a value, grouping it with earlier values of the same key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// All values of a key, in arrival order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// The first value of a key.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove a key and return its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.append(key, value);
        }
        params
    }
}

impl Serialize for QueryParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}

/// Rebuild a query string from parsed parameters.
///
/// Returns `""` for an empty query, otherwise `?` followed by `key=value`
/// pairs (bare `key` for empty values) joined with `&`.
pub fn reconstruct_query(query: &QueryParams) -> String {
    let pairs: Vec<String> = query
        .iter()
        .flat_map(|(key, values)| {
            values.iter().map(move |value| {
                if value.is_empty() {
                    key.to_string()
                } else {
                    format!("{}={}", key, value)
                }
            })
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

/// Reconstruct the full original request URL, encoded for embedding as a
/// single query-parameter value.
pub fn reconstruct_original_url(path: &str, query: &QueryParams, host: &str, proto: &str) -> String {
    encode_component(&format!(
        "{}://{}{}{}",
        proto,
        host,
        path,
        reconstruct_query(query)
    ))
}
