//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4)
//! - Extract routing-relevant information (path, raw query, host, protocol)
//! - Reject requests that cannot be routed (no host)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The query string is handed to routing undecoded
//! - A missing `X-Forwarded-Proto` means https (the service sits behind TLS)

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::routing::{MatchContext, QueryParams};

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const DEFAULT_PROTO: &str = "https";

/// Generates a fresh UUID v4 for every request without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("request has no Host header")]
    MissingHost,
}

/// The parts of an inbound request that routing looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub path: String,
    pub raw_query: String,
    pub host: Option<String>,
    pub proto: String,
}

impl RequestInfo {
    pub fn from_parts(uri: &Uri, headers: &HeaderMap) -> Self {
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .filter(|h| !h.trim().is_empty());

        let proto = headers
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROTO)
            .to_string();

        Self {
            path: uri.path().to_string(),
            raw_query: uri.query().unwrap_or_default().to_string(),
            host,
            proto,
        }
    }

    /// Parsed, still-encoded query parameters.
    pub fn query(&self) -> QueryParams {
        QueryParams::parse(&self.raw_query)
    }

    /// Build the routing context with `query` (possibly edited by the caller).
    pub fn into_context(self, query: QueryParams) -> Result<MatchContext, RequestError> {
        let host = self.host.ok_or(RequestError::MissingHost)?;
        Ok(MatchContext::new(self.path, query, host, self.proto))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_extracts_host_proto_and_raw_query() {
        let uri: Uri = "/search/a?searcharg=winspeare%2C+j&searchtype=a".parse().unwrap();
        let info = RequestInfo::from_parts(
            &uri,
            &headers(&[("host", "catalog.nypl.org"), ("x-forwarded-proto", "http")]),
        );

        assert_eq!(info.path, "/search/a");
        assert_eq!(info.raw_query, "searcharg=winspeare%2C+j&searchtype=a");
        assert_eq!(info.host.as_deref(), Some("catalog.nypl.org"));
        assert_eq!(info.proto, "http");
        assert_eq!(info.query().first("searcharg"), Some("winspeare%2C+j"));
    }

    #[test]
    fn test_proto_defaults_to_https() {
        let uri: Uri = "/".parse().unwrap();
        let info = RequestInfo::from_parts(&uri, &headers(&[("host", "catalog.nypl.org")]));
        assert_eq!(info.proto, "https");

        let info = RequestInfo::from_parts(
            &uri,
            &headers(&[("host", "catalog.nypl.org"), ("x-forwarded-proto", "https, http")]),
        );
        assert_eq!(info.proto, "https");
    }

    #[test]
    fn test_missing_host() {
        let uri: Uri = "/record=b12345678".parse().unwrap();
        let info = RequestInfo::from_parts(&uri, &HeaderMap::new());
        assert_eq!(info.host, None);
        let query = info.query();
        assert_eq!(info.into_context(query), Err(RequestError::MissingHost));
    }

    #[test]
    fn test_absolute_form_uri_supplies_host() {
        let uri: Uri = "https://browse.nypl.org/iii/encore".parse().unwrap();
        let info = RequestInfo::from_parts(&uri, &HeaderMap::new());
        assert_eq!(info.host.as_deref(), Some("browse.nypl.org"));
    }

    #[test]
    fn test_request_ids_are_unique_uuids() {
        let request = Request::new(());
        let mut maker = RequestUuid;
        let first = maker.make_request_id(&request).unwrap();
        let second = maker.make_request_id(&request).unwrap();

        let first = first.header_value().to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&first).is_ok());
        assert_ne!(first, second.header_value().to_str().unwrap());
    }
}
