//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Resolve every unclaimed path through the routing engine
//! - Bind server to listener and shut down gracefully

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{RedirectConfig, ServiceConfig};
use crate::health;
use crate::http::logout;
use crate::http::request::{RequestInfo, RequestUuid, X_REQUEST_ID};
use crate::http::response::{redirect, DebugReport};
use crate::lookup::{PlatformClassifier, RecordClassifier, RecordSource, StaticClassifier};
use crate::observability::metrics;
use crate::routing::{RouteClass, Router as RedirectRouter, Targets};
use crate::security::RedirectValidator;

/// Errors that prevent the server from being built.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Status codes and switches applied to every resolution.
#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    pub permanent: StatusCode,
    pub dynamic: StatusCode,
    pub debug_param: String,
    pub default_scheme: String,
}

impl RedirectPolicy {
    pub fn from_config(config: &RedirectConfig) -> Self {
        Self {
            permanent: StatusCode::from_u16(config.permanent_status)
                .unwrap_or(StatusCode::MOVED_PERMANENTLY),
            dynamic: StatusCode::from_u16(config.dynamic_status).unwrap_or(StatusCode::FOUND),
            debug_param: config.debug_param.clone(),
            default_scheme: config.default_scheme.clone(),
        }
    }

    pub fn status_for(&self, class: RouteClass) -> StatusCode {
        match class {
            RouteClass::Permanent => self.permanent,
            RouteClass::Dynamic => self.dynamic,
        }
    }
}

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub router: Arc<RedirectRouter>,
    pub validator: Arc<RedirectValidator>,
    pub policy: Arc<RedirectPolicy>,
}

impl AppState {
    /// Research catalog home, used when nothing better can be sent.
    pub fn home(&self) -> String {
        Targets::absolute(
            &self.router.targets().research_catalog,
            &self.policy.default_scheme,
        )
    }

    /// Redirect to `location`, or to the research catalog home if `location`
    /// cannot be sent as a header.
    pub fn redirect_or_home(&self, status: StatusCode, location: &str) -> Response {
        match redirect(status, location) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(location = %location, error = %e, "Destination is not a valid header value");
                self.home_redirect()
            }
        }
    }

    fn home_redirect(&self) -> Response {
        let home = self.home();
        match redirect(self.policy.dynamic, &home) {
            Ok(response) => response,
            Err(_) => (self.policy.dynamic, "").into_response(),
        }
    }
}

/// Classifier selected by configuration.
pub fn classifier_from_config(config: &ServiceConfig) -> Arc<dyn RecordClassifier> {
    if config.lookup.enabled {
        Arc::new(PlatformClassifier::new(config.lookup.clone()))
    } else {
        tracing::info!("Record lookup disabled; OCLC searches resolve as unknown");
        Arc::new(StaticClassifier::new(RecordSource::Unknown))
    }
}

/// HTTP server for the redirect service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a server with the classifier the configuration asks for.
    pub fn new(config: ServiceConfig) -> Result<Self, ServerError> {
        let classifier = classifier_from_config(&config);
        Self::with_classifier(config, classifier)
    }

    /// Create a server with an explicit record classifier.
    pub fn with_classifier(
        config: ServiceConfig,
        classifier: Arc<dyn RecordClassifier>,
    ) -> Result<Self, ServerError> {
        let redirect_router = RedirectRouter::new(&config, classifier)?;
        let validator = RedirectValidator::new(redirect_router.targets(), &config.redirects)?;

        let state = AppState {
            router: Arc::new(redirect_router),
            validator: Arc::new(validator),
            policy: Arc::new(RedirectPolicy::from_config(&config.redirects)),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/check", get(health::check))
            .route("/js-conditional-redirect", get(logout::js_conditional_redirect))
            .route("/iii/encore/logoutFilterRedirect", get(logout::logout_filter_redirect))
            .route("/vega-logout-handler", get(logout::vega_logout_handler))
            .fallback(redirect_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(&X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, RequestUuid))
    }

    /// The router as a service, for driving requests without a socket.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` completes.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            lookup_enabled = self.config.lookup.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Resolve any path not claimed by a service endpoint.
async fn redirect_handler(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    let info = RequestInfo::from_parts(&uri, &headers);
    let mut query = info.query();
    let debug = query.remove(&state.policy.debug_param).is_some();

    let ctx = match info.into_context(query) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::warn!(path = %uri.path(), error = %e, "Malformed request");
            metrics::record_redirect("malformed_request", "other", state.policy.dynamic.as_u16());
            return state.home_redirect();
        }
    };

    let resolution = state.router.route(&ctx).await;
    let status = state.policy.status_for(resolution.class);
    let location = Targets::absolute(&resolution.destination, &state.policy.default_scheme);

    tracing::info!(
        rule = resolution.rule,
        origin = resolution.origin.as_str(),
        status = status.as_u16(),
        location = %location,
        "Redirecting"
    );
    metrics::record_redirect(resolution.rule, resolution.origin.as_str(), status.as_u16());

    if debug {
        return Json(DebugReport {
            path: ctx.path,
            query: ctx.query,
            host: ctx.host,
            proto: ctx.proto,
            origin: resolution.origin,
            rule: resolution.rule,
            class: resolution.class,
            status: status.as_u16(),
            location,
        })
        .into_response();
    }

    state.redirect_or_home(status, &location)
}
