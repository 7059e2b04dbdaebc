//! Response construction.
//!
//! # Responsibilities
//! - Build redirect responses with an absolute `Location`
//! - Render the conditional-redirect page
//! - Render the debug report
//!
//! # Design Decisions
//! - A destination that is not a valid header value is an error for the
//!   caller to handle, never a panic
//! - Values placed into the page are escaped for their context (script
//!   string or HTML attribute)

use axum::{
    http::{header, header::InvalidHeaderValue, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;

use crate::routing::{Origin, QueryParams, RouteClass};

/// Redirect to `location` with `status`.
pub fn redirect(status: StatusCode, location: &str) -> Result<Response, InvalidHeaderValue> {
    let value = HeaderValue::from_str(location)?;
    Ok((status, [(header::LOCATION, value)]).into_response())
}

/// Page that sends scripted browsers to `script_target` and everything else
/// to `noscript_target`.
pub fn conditional_redirect_page(script_target: &str, noscript_target: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>Redirecting</title>
    <script type="text/javascript">
      window.location.replace({script});
    </script>
    <noscript>
      <meta http-equiv="refresh" content="1;url={noscript}" />
    </noscript>
  </head>
  <body></body>
</html>
"#,
        script = script_string(script_target),
        noscript = escape_html(noscript_target),
    ))
}

/// A JSON string literal that is also safe inside a `<script>` element.
fn script_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('<', "\\u003c")
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Everything the router saw and decided, returned instead of redirecting
/// when debug mode is requested.
#[derive(Debug, Clone, Serialize)]
pub struct DebugReport {
    pub path: String,
    pub query: QueryParams,
    pub host: String,
    pub proto: String,
    pub origin: Origin,
    pub rule: &'static str,
    pub class: RouteClass,
    pub status: u16,
    pub location: String,
}
