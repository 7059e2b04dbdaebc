//! Logout flow across the legacy SSO and Vega.
//!
//! A legacy logout link lands on `/iii/encore/logoutFilterRedirect`. The
//! browser is sent to the conditional-redirect page, which logs scripted
//! browsers out of Vega first (Vega then returns them to
//! `/vega-logout-handler`) and sends the rest straight to the SSO logout.
//! Both paths finish at the SSO logout, which forwards to the target.

use axum::{
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
};

use crate::http::response::conditional_redirect_page;
use crate::http::server::AppState;
use crate::routing::query::encode_component;
use crate::routing::{QueryParams, Targets};
use crate::security::REDIRECT_URI_PARAM;

pub const NOSCRIPT_REDIRECT_URI_PARAM: &str = "noscript_redirect_uri";

/// SSO logout that forwards to `target` when done.
pub fn cas_logout_url(targets: &Targets, target: &str) -> String {
    format!(
        "https://{}/iii/cas/logout?service={}",
        targets.cas,
        encode_component(target)
    )
}

/// Conditional-redirect page URL for a full logout ending at `target`.
pub fn logout_flow_url(targets: &Targets, target: &str) -> String {
    let handler = format!(
        "https://{}/vega-logout-handler?{}={}",
        targets.redirect_service,
        REDIRECT_URI_PARAM,
        encode_component(target)
    );
    let script_target = format!(
        "https://{}/logout?{}={}",
        targets.vega,
        REDIRECT_URI_PARAM,
        encode_component(&handler)
    );
    format!(
        "https://{}/js-conditional-redirect?{}={}&{}={}",
        targets.redirect_service,
        REDIRECT_URI_PARAM,
        encode_component(&script_target),
        NOSCRIPT_REDIRECT_URI_PARAM,
        encode_component(&cas_logout_url(targets, target))
    )
}

fn parse(raw: Option<String>) -> QueryParams {
    QueryParams::parse(raw.as_deref().unwrap_or_default())
}

/// `/iii/encore/logoutFilterRedirect`
pub async fn logout_filter_redirect(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let target = state.validator.get_redirect_uri(&parse(raw), REDIRECT_URI_PARAM);
    let location = logout_flow_url(state.router.targets(), &target);
    tracing::info!(target = %target, "Starting logout flow");
    state.redirect_or_home(state.policy.dynamic, &location)
}

/// `/vega-logout-handler`
pub async fn vega_logout_handler(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let target = state.validator.get_redirect_uri(&parse(raw), REDIRECT_URI_PARAM);
    let location = cas_logout_url(state.router.targets(), &target);
    state.redirect_or_home(state.policy.dynamic, &location)
}

/// `/js-conditional-redirect`
pub async fn js_conditional_redirect(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let query = parse(raw);
    let script_target = state.validator.get_redirect_uri(&query, REDIRECT_URI_PARAM);
    let noscript_target = state
        .validator
        .get_redirect_uri(&query, NOSCRIPT_REDIRECT_URI_PARAM);
    conditional_redirect_page(&script_target, &noscript_target).into_response()
}
