//! Validation of caller-supplied redirect targets.
//!
//! # Responsibilities
//! - Extract a redirect target from a query parameter
//! - Accept only https URLs on known catalog hosts, or http on a local
//!   development host
//! - Fall back to the circulating catalog's home page otherwise
//!
//! # Design Decisions
//! - Fail closed: anything not on the allow-list becomes the default
//! - Allow-list entries require a trailing `/` after the host, so
//!   `https://www.nypl.org.us` cannot pass as `https://www.nypl.org`
//! - Aliases rewrite retired domains before the check

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

use crate::config::{DomainAlias, RedirectConfig};
use crate::routing::{QueryParams, Targets};

/// Query parameter conventionally carrying the redirect target.
pub const REDIRECT_URI_PARAM: &str = "redirect_uri";

/// Allow-list check for redirect targets.
#[derive(Debug, Clone)]
pub struct RedirectValidator {
    allowed_prefixes: Vec<String>,
    local_dev: Vec<Regex>,
    aliases: Vec<DomainAlias>,
    default_target: String,
}

impl RedirectValidator {
    pub fn new(targets: &Targets, config: &RedirectConfig) -> Result<Self, regex::Error> {
        let mut hosts = targets.known_hosts();
        hosts.extend(config.extra_allowed_hosts.iter().cloned());
        hosts.dedup();

        let allowed_prefixes = hosts
            .iter()
            .filter(|host| !host.is_empty())
            .map(|host| format!("https://{}/", host))
            .collect();

        let local_dev = config
            .local_dev_hosts
            .iter()
            .map(|host| Regex::new(&format!(r"^http://{}:\d+/", regex::escape(host))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            allowed_prefixes,
            local_dev,
            aliases: config.domain_aliases.clone(),
            default_target: format!("https://{}/", targets.vega),
        })
    }

    /// Where invalid or missing targets are sent.
    pub fn default_target(&self) -> &str {
        &self.default_target
    }

    /// Whether `candidate` is an acceptable redirect target as given.
    pub fn is_valid(&self, candidate: &str) -> bool {
        if Url::parse(candidate).is_err() {
            return false;
        }
        self.allowed_prefixes
            .iter()
            .any(|prefix| candidate.starts_with(prefix.as_str()))
            || self.local_dev.iter().any(|re| re.is_match(candidate))
    }

    /// Validated redirect target from `param`, or the default target.
    pub fn get_redirect_uri(&self, query: &QueryParams, param: &str) -> String {
        match query.first(param).filter(|v| !v.is_empty()) {
            Some(raw) => self.validate_or_default(raw),
            None => self.default_target.clone(),
        }
    }

    /// Normalize a raw value and check it against the allow-list.
    pub fn validate_or_default(&self, raw: &str) -> String {
        let candidate = self.normalize(raw);
        if self.is_valid(&candidate) {
            candidate
        } else {
            tracing::debug!(candidate = %candidate, "Rejected redirect target");
            self.default_target.clone()
        }
    }

    fn normalize(&self, raw: &str) -> String {
        let mut value = if raw.contains("://") {
            raw.to_string()
        } else {
            percent_decode_str(raw).decode_utf8_lossy().into_owned()
        };
        for alias in &self.aliases {
            value = value
                .replace(&format!("www.{}", alias.from), &alias.to)
                .replace(&alias.from, &alias.to);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;

    fn validator() -> RedirectValidator {
        RedirectValidator::new(
            &Targets::from_config(&CatalogConfig::default()),
            &RedirectConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_unknown_hosts_are_invalid() {
        let v = validator();
        assert!(!v.is_valid("https://duckduckgo.com"));
        assert!(!v.is_valid("https://duckduckgo.com?q=https://catalog.nypl.org"));
        assert!(!v.is_valid("https://www.nypl.org.us"));
        assert!(!v.is_valid("https://borrow.nypl.org"));
        assert!(!v.is_valid("http://www.nypl.org/"));
        assert!(!v.is_valid("not a url"));
    }

    #[test]
    fn test_known_hosts_are_valid() {
        let v = validator();
        assert!(v.is_valid("https://www.nypl.org/"));
        assert!(v.is_valid("https://legacycatalog.nypl.org/"));
        assert!(v.is_valid("https://www.nypl.org/research/research-catalog"));
        assert!(v.is_valid("https://qa-research-catalog.nypl.org/research/research-catalog"));
        assert!(v.is_valid("https://borrow.nypl.org/"));
        assert!(v.is_valid("http://local.nypl.org:8080/"));
        assert!(v.is_valid("http://local.nypl.org:3001/"));
        assert!(!v.is_valid("http://local.nypl.org/"));
    }

    #[test]
    fn test_get_redirect_uri() {
        let v = validator();
        for uri in ["https://www.nypl.org/path", "https://legacycatalog.nypl.org/foo/bar"] {
            let query: QueryParams = [(REDIRECT_URI_PARAM, uri)].into_iter().collect();
            assert_eq!(v.get_redirect_uri(&query, REDIRECT_URI_PARAM), uri);
        }

        let custom: QueryParams = [("custom_param", "https://www.nypl.org/")].into_iter().collect();
        assert_eq!(v.get_redirect_uri(&custom, "custom_param"), "https://www.nypl.org/");

        assert_eq!(v.get_redirect_uri(&QueryParams::new(), REDIRECT_URI_PARAM), "https://borrow.nypl.org/");
    }

    #[test]
    fn test_encoded_value_is_decoded() {
        let query = QueryParams::parse("redirect_uri=https%3A%2F%2Fwww.nypl.org%2F");
        assert_eq!(v_uri(&query), "https://www.nypl.org/");
    }

    #[test]
    fn test_disallowed_value_gets_default() {
        let query = QueryParams::parse("redirect_uri=https://duckduckgo.com");
        assert_eq!(v_uri(&query), "https://borrow.nypl.org/");
    }

    #[test]
    fn test_domain_alias() {
        let v = validator();
        assert_eq!(
            v.validate_or_default("https://discovery.nypl.org/research/collections"),
            "https://www.nypl.org/research/collections"
        );
        assert_eq!(
            v.validate_or_default("https://www.discovery.nypl.org/"),
            "https://www.nypl.org/"
        );
    }

    fn v_uri(query: &QueryParams) -> String {
        validator().get_redirect_uri(query, REDIRECT_URI_PARAM)
    }
}
