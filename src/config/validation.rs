//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every target system is configured
//! - Validate value ranges (redirect statuses, timeouts)
//! - Make sure configured patterns compile
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use regex::Regex;
use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
/// Statuses a browser follows using the Location header.
const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be host-relative (no scheme), got '{value}'")]
    HasScheme { field: &'static str, value: String },

    #[error("{field} must be one of 301, 302, 303, 307, 308, got {value}")]
    NotRedirect { field: &'static str, value: u16 },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("record_id_pattern does not compile: {0}")]
    RecordPattern(String),

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let catalogs = &config.catalogs;

    for (field, value) in [
        ("catalogs.research_catalog_url", &catalogs.research_catalog_url),
        ("catalogs.legacy_catalog_url", &catalogs.legacy_catalog_url),
        ("catalogs.encore_url", &catalogs.encore_url),
        ("catalogs.vega_url", &catalogs.vega_url),
        ("catalogs.vega_auth_url", &catalogs.vega_auth_url),
        ("catalogs.cas_server_domain", &catalogs.cas_server_domain),
        ("catalogs.redirect_service_domain", &catalogs.redirect_service_domain),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::Empty { field });
        } else if value.contains("://") {
            errors.push(ValidationError::HasScheme {
                field,
                value: value.clone(),
            });
        }
    }

    let redirects = &config.redirects;
    for (field, value) in [
        ("redirects.permanent_status", redirects.permanent_status),
        ("redirects.dynamic_status", redirects.dynamic_status),
    ] {
        if !REDIRECT_STATUSES.contains(&value) {
            errors.push(ValidationError::NotRedirect { field, value });
        }
    }

    if redirects.debug_param.is_empty() {
        errors.push(ValidationError::Empty {
            field: "redirects.debug_param",
        });
    }
    if redirects.default_scheme.is_empty() {
        errors.push(ValidationError::Empty {
            field: "redirects.default_scheme",
        });
    }
    if let Err(e) = Regex::new(&redirects.record_id_pattern) {
        errors.push(ValidationError::RecordPattern(e.to_string()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "timeouts.request_secs",
        });
    }

    let lookup = &config.lookup;
    if lookup.enabled {
        for (field, value) in [
            ("lookup.platform_base_url", &lookup.platform_base_url),
            ("lookup.token_url", &lookup.token_url),
        ] {
            if url::Url::parse(value).is_err() {
                errors.push(ValidationError::InvalidUrl {
                    field,
                    value: value.clone(),
                });
            }
        }
        if lookup.timeout_ms == 0 {
            errors.push(ValidationError::Zero {
                field: "lookup.timeout_ms",
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
