//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the redirect
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the redirect service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Base URLs of every system the service redirects between.
    pub catalogs: CatalogConfig,

    /// External record lookup (bibliographic platform API).
    pub lookup: LookupConfig,

    /// Redirect policy knobs.
    pub redirects: RedirectConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Target systems.
///
/// Values are host-relative (`host[/path]`, no scheme), the way the
/// deployment environment provides them.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Research catalog base (primary target).
    pub research_catalog_url: String,

    /// Legacy classic catalog. Passthrough pages stay here.
    pub legacy_catalog_url: String,

    /// Encore discovery front-end.
    pub encore_url: String,

    /// Vega discovery interface (circulating catalog).
    pub vega_url: String,

    /// Vega's authentication domain.
    pub vega_auth_url: String,

    /// SSO server hosting the legacy logout endpoint.
    pub cas_server_domain: String,

    /// Public domain of this service.
    pub redirect_service_domain: String,

    /// Additional hosts that identify Encore-origin requests (e.g. test
    /// deployments of Encore).
    pub encore_host_aliases: Vec<String>,

    /// Hosts that identify requests from the legacy classic catalog.
    pub legacy_hosts: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            research_catalog_url: "www.nypl.org/research/research-catalog".to_string(),
            legacy_catalog_url: "legacycatalog.nypl.org".to_string(),
            encore_url: "browse.nypl.org".to_string(),
            vega_url: "borrow.nypl.org".to_string(),
            vega_auth_url: "auth.borrow.nypl.org".to_string(),
            cas_server_domain: "ilsstaff.nypl.org".to_string(),
            redirect_service_domain: "redir-browse.nypl.org".to_string(),
            encore_host_aliases: vec!["nypl-encore-test.nypl.org".to_string()],
            legacy_hosts: vec![
                "catalog.nypl.org".to_string(),
                "qa-catalog.nypl.org".to_string(),
            ],
        }
    }
}

/// Bibliographic platform API used to classify records.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Enable the external lookup. When disabled every lookup is "unknown".
    pub enabled: bool,

    /// Platform API base URL (e.g. "https://platform.nypl.org/api/v0.1").
    pub platform_base_url: String,

    /// OAuth token endpoint.
    pub token_url: String,

    /// OAuth client id.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Deadline for one complete lookup (token + record fetch).
    pub timeout_ms: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            platform_base_url: String::new(),
            token_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout_ms: 3000,
        }
    }
}

/// Replace one legacy domain with its modern equivalent in caller-supplied
/// redirect targets.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DomainAlias {
    /// Legacy domain; a leading `www.` variant is matched too.
    pub from: String,

    /// Replacement domain.
    pub to: String,
}

/// Redirect policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Status for stable historical mappings.
    pub permanent_status: u16,

    /// Status for dynamically computed routes and fallbacks.
    pub dynamic_status: u16,

    /// Query parameter that switches a request into debug mode.
    pub debug_param: String,

    /// Shape of a well-formed legacy record identifier (regex fragment).
    pub record_id_pattern: String,

    /// Scheme given to host-relative destinations.
    pub default_scheme: String,

    /// Hosts accepted over plain http on any port for local development.
    pub local_dev_hosts: Vec<String>,

    /// Extra hosts accepted as redirect targets besides the configured catalogs.
    pub extra_allowed_hosts: Vec<String>,

    /// Textual substitutions applied to redirect targets before validation.
    pub domain_aliases: Vec<DomainAlias>,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            permanent_status: 301,
            dynamic_status: 302,
            debug_param: "redirect_debug".to_string(),
            record_id_pattern: r"b\d{8}".to_string(),
            default_scheme: "https".to_string(),
            local_dev_hosts: vec!["local.nypl.org".to_string(), "localhost".to_string()],
            extra_allowed_hosts: vec![
                "www.nypl.org".to_string(),
                "qa-research-catalog.nypl.org".to_string(),
            ],
            domain_aliases: vec![DomainAlias {
                from: "discovery.nypl.org".to_string(),
                to: "www.nypl.org".to_string(),
            }],
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time to produce a response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 10 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
