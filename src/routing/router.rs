//! Routing policy: fallbacks and original-URL propagation around dispatch.

use std::sync::Arc;

use serde::Serialize;

use crate::config::ServiceConfig;
use crate::lookup::RecordClassifier;
use crate::routing::dispatcher::dispatch;
use crate::routing::matcher::MatchContext;
use crate::routing::query::reconstruct_original_url;
use crate::routing::rules::{build_rules, Rule, RouteClass, RuleEnv};
use crate::routing::targets::{Origin, Targets};

/// Rule name reported when nothing matched an Encore-origin request.
pub const ENCORE_FALLBACK: &str = "encore_fallback";
/// Rule name reported when nothing matched any other request.
pub const NOT_FOUND: &str = "not_found";

/// Final routing decision for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Host-relative or absolute destination URL.
    pub destination: String,
    pub rule: &'static str,
    pub class: RouteClass,
    pub origin: Origin,
}

/// Compiled rule table plus the targets it routes to.
///
/// Built once at startup and shared read-only across requests.
#[derive(Debug)]
pub struct Router {
    rules: Vec<Rule>,
    env: RuleEnv,
}

impl Router {
    pub fn new(config: &ServiceConfig, classifier: Arc<dyn RecordClassifier>) -> Result<Self, regex::Error> {
        let rules = build_rules(&config.redirects.record_id_pattern)?;
        let env = RuleEnv {
            targets: Targets::from_config(&config.catalogs),
            classifier,
        };
        Ok(Self { rules, env })
    }

    pub fn targets(&self) -> &Targets {
        &self.env.targets
    }

    /// Resolve a request to its destination. Never fails.
    pub async fn route(&self, ctx: &MatchContext) -> Resolution {
        let targets = &self.env.targets;
        let origin = targets.origin(&ctx.host);

        let (rule, class, destination) = match dispatch(&self.rules, ctx, &self.env).await {
            Some(dispatched) => (dispatched.rule, dispatched.class, dispatched.destination),
            None if origin == Origin::Encore => {
                (ENCORE_FALLBACK, RouteClass::Dynamic, targets.encore_fallback())
            }
            None => (NOT_FOUND, RouteClass::Dynamic, targets.not_found()),
        };

        let destination = if origin == Origin::Encore || targets.is_legacy_destination(&destination) {
            destination
        } else {
            let original = reconstruct_original_url(&ctx.path, &ctx.query, &ctx.host, &ctx.proto);
            let separator = if destination.contains('?') { '&' } else { '?' };
            format!("{}{}originalUrl={}", destination, separator, original)
        };

        tracing::debug!(
            rule = rule,
            origin = origin.as_str(),
            destination = %destination,
            "Request resolved"
        );

        Resolution {
            destination,
            rule,
            class,
            origin,
        }
    }
}
