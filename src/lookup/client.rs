//! Platform API client with OAuth client-credentials authentication.
//!
//! # Responsibilities
//! - Acquire a bearer token from the OAuth token endpoint and reuse it
//!   until it expires or the API rejects it
//! - Query bibliographic records by control number
//! - Build the client once and cache it for the process lifetime

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use tokio::sync::{Mutex, OnceCell};
use url::Url;

use crate::config::LookupConfig;
use crate::lookup::types::{BibRecord, BibsResponse, LookupError, LookupResult, TokenResponse};

/// Tokens this close to expiry are refreshed before use.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn from_response(value: String, expires_in: Option<u64>) -> Self {
        Self {
            value,
            expires_at: expires_in.map(|secs| Instant::now() + Duration::from_secs(secs)),
        }
    }

    fn is_fresh(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() + TOKEN_REFRESH_MARGIN < at,
            None => true,
        }
    }
}

/// Platform API client.
///
/// Clones share the HTTP connection pool and the cached access token.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl PlatformClient {
    /// Create a new client from configuration.
    pub fn new(config: &LookupConfig) -> LookupResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.platform_base_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token: Arc::new(Mutex::new(None)),
        })
    }

    /// Cached bearer token, fetching a new one if none is held or it is
    /// about to expire. The lock is held across the fetch so concurrent
    /// callers share one token request.
    pub async fn access_token(&self) -> LookupResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let fresh = self.fetch_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    /// Drop `rejected` from the cache unless another caller already replaced it.
    async fn invalidate(&self, rejected: &str) {
        let mut cached = self.token.lock().await;
        if cached.as_ref().is_some_and(|t| t.value == rejected) {
            tracing::debug!("Platform rejected cached token");
            *cached = None;
        }
    }

    async fn fetch_token(&self) -> LookupResult<CachedToken> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
                ("scope", "openid"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LookupError::Status {
                endpoint: "token",
                status: response.status().as_u16(),
            });
        }

        let token: TokenResponse = response.json().await?;
        let value = token.access_token.ok_or(LookupError::MissingToken)?;
        Ok(CachedToken::from_response(value, token.expires_in))
    }

    /// Records whose control number (OCLC number) equals `control_number`.
    pub async fn bibs_by_control_number(&self, control_number: &str) -> LookupResult<Vec<BibRecord>> {
        let mut url = Url::parse(&format!("{}/bibs", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("nyplSource", "sierra-nypl")
            .append_pair("controlNumber", control_number);

        let token = self.access_token().await?;
        let mut response = self.http.get(url.clone()).bearer_auth(&token).send().await?;

        // one retry with a new token when the cached one was revoked early
        if response.status() == StatusCode::UNAUTHORIZED {
            self.invalidate(&token).await;
            let token = self.access_token().await?;
            response = self.http.get(url).bearer_auth(token).send().await?;
        }

        match response.status().as_u16() {
            // the bib service answers 404 for "no such record"
            404 => Ok(Vec::new()),
            status if !response.status().is_success() => Err(LookupError::Status {
                endpoint: "bibs",
                status,
            }),
            _ => {
                let body: BibsResponse = response.json().await?;
                Ok(body.data)
            }
        }
    }
}

/// Process-lifetime handle to the platform client, built on first use.
///
/// Concurrent first calls may race; the cell keeps exactly one client and
/// every caller gets a shared reference to it.
#[derive(Debug)]
pub struct LazyPlatformClient {
    config: LookupConfig,
    cell: OnceCell<PlatformClient>,
}

impl LazyPlatformClient {
    pub fn new(config: LookupConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// Get the client, building it if this is the first call.
    pub async fn get(&self) -> LookupResult<&PlatformClient> {
        self.cell
            .get_or_try_init(|| async {
                tracing::info!(base_url = %self.config.platform_base_url, "Initializing platform client");
                PlatformClient::new(&self.config)
            })
            .await
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}
