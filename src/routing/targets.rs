//! Destination systems and request origin.

use serde::Serialize;

use crate::config::CatalogConfig;

/// Where a request came from, judged by its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    LegacyCatalog,
    Encore,
    Other,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::LegacyCatalog => "legacy_catalog",
            Origin::Encore => "encore",
            Origin::Other => "other",
        }
    }
}

/// Configured base URLs, host-relative (no scheme).
#[derive(Debug, Clone)]
pub struct Targets {
    pub research_catalog: String,
    pub legacy_catalog: String,
    pub encore: String,
    pub vega: String,
    pub vega_auth: String,
    pub cas: String,
    pub redirect_service: String,
    encore_hosts: Vec<String>,
    legacy_hosts: Vec<String>,
}

impl Targets {
    pub fn from_config(config: &CatalogConfig) -> Self {
        let trim = |s: &str| s.trim_end_matches('/').to_string();

        let mut encore_hosts = vec![host_of(&config.encore_url).to_lowercase()];
        encore_hosts.extend(config.encore_host_aliases.iter().map(|h| h.to_lowercase()));

        let mut legacy_hosts = vec![host_of(&config.legacy_catalog_url).to_lowercase()];
        legacy_hosts.extend(config.legacy_hosts.iter().map(|h| h.to_lowercase()));

        Self {
            research_catalog: trim(&config.research_catalog_url),
            legacy_catalog: trim(&config.legacy_catalog_url),
            encore: trim(&config.encore_url),
            vega: trim(&config.vega_url),
            vega_auth: trim(&config.vega_auth_url),
            cas: trim(&config.cas_server_domain),
            redirect_service: trim(&config.redirect_service_domain),
            encore_hosts,
            legacy_hosts,
        }
    }

    /// Classify a request host. Ports are ignored.
    pub fn origin(&self, host: &str) -> Origin {
        let host = strip_port(host).to_lowercase();
        if self.encore_hosts.contains(&host) {
            Origin::Encore
        } else if self.legacy_hosts.contains(&host) {
            Origin::LegacyCatalog
        } else {
            Origin::Other
        }
    }

    /// Not-found landing page on the research catalog.
    pub fn not_found(&self) -> String {
        format!("{}/404/redirect", self.research_catalog)
    }

    /// Landing page for Encore-origin requests nothing else handles.
    pub fn encore_fallback(&self) -> String {
        format!("{}/", self.vega)
    }

    /// Whether a destination stays on the legacy catalog.
    pub fn is_legacy_destination(&self, destination: &str) -> bool {
        let bare = destination
            .strip_prefix("https://")
            .or_else(|| destination.strip_prefix("http://"))
            .unwrap_or(destination);
        bare.starts_with(&self.legacy_catalog)
    }

    /// Hosts of every configured system, for redirect-target validation.
    pub fn known_hosts(&self) -> Vec<String> {
        [
            &self.research_catalog,
            &self.legacy_catalog,
            &self.encore,
            &self.vega,
            &self.vega_auth,
            &self.cas,
        ]
        .into_iter()
        .map(|url| host_of(url).to_string())
        .collect()
    }

    /// Turn a host-relative destination into an absolute URL.
    pub fn absolute(destination: &str, scheme: &str) -> String {
        if destination.starts_with("https://") || destination.starts_with("http://") {
            destination.to_string()
        } else {
            format!("{}://{}", scheme, destination)
        }
    }
}

/// Host part of a host-relative URL (`www.nypl.org/research` → `www.nypl.org`).
pub fn host_of(url: &str) -> &str {
    url.split(['/', '?']).next().unwrap_or_default()
}

fn strip_port(host: &str) -> &str {
    host.rsplit_once(':')
        .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
        .map(|(name, _)| name)
        .unwrap_or(host)
}
