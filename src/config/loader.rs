//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Override configured values with the deployment's environment variables.
///
/// Empty variables are ignored.
pub fn apply_env_overrides<F>(mut config: ServiceConfig, lookup: F) -> ServiceConfig
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let catalogs = &mut config.catalogs;
    for (key, slot) in [
        ("BASE_SCC_URL", &mut catalogs.research_catalog_url),
        ("LEGACY_CATALOG_URL", &mut catalogs.legacy_catalog_url),
        ("ENCORE_URL", &mut catalogs.encore_url),
        ("VEGA_URL", &mut catalogs.vega_url),
        ("VEGA_AUTH_DOMAIN", &mut catalogs.vega_auth_url),
        ("CAS_SERVER_DOMAIN", &mut catalogs.cas_server_domain),
        ("REDIRECT_SERVICE_DOMAIN", &mut catalogs.redirect_service_domain),
    ] {
        if let Some(value) = get(key) {
            *slot = value;
        }
    }

    let lookup_config = &mut config.lookup;
    for (key, slot) in [
        ("PLATFORM_BASE_URL", &mut lookup_config.platform_base_url),
        ("TOKEN_URL", &mut lookup_config.token_url),
        ("CLIENT_ID", &mut lookup_config.client_id),
        ("CLIENT_SECRET", &mut lookup_config.client_secret),
    ] {
        if let Some(value) = get(key) {
            *slot = value;
        }
    }
    if get("PLATFORM_BASE_URL").is_some() && get("TOKEN_URL").is_some() {
        lookup_config.enabled = true;
    }

    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level;
    }

    config
}
