//! Ordered rule evaluation.

use crate::routing::matcher::MatchContext;
use crate::routing::rules::{Rule, RouteClass, RuleEnv};

/// Outcome of the first matching rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub rule: &'static str,
    pub class: RouteClass,
    pub destination: String,
}

/// Run the first rule whose matcher accepts the request.
///
/// Later rules are never consulted once one matches, even if its handler
/// produces a not-found destination.
pub async fn dispatch(rules: &[Rule], ctx: &MatchContext, env: &RuleEnv) -> Option<Dispatched> {
    let (rule, route_match) = rules
        .iter()
        .find_map(|rule| rule.matcher.find(ctx).map(|m| (rule, m)))?;

    tracing::debug!(rule = rule.name, path = %ctx.path, "Rule matched");

    let destination = rule.handler.invoke(&route_match, ctx, env).await;

    Some(Dispatched {
        rule: rule.name,
        class: rule.class,
        destination,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::CatalogConfig;
    use crate::lookup::{RecordSource, StaticClassifier};
    use crate::routing::query::QueryParams;
    use crate::routing::rules::build_rules;
    use crate::routing::targets::Targets;

    fn env(source: RecordSource) -> RuleEnv {
        RuleEnv {
            targets: Targets::from_config(&CatalogConfig::default()),
            classifier: Arc::new(StaticClassifier::new(source)),
        }
    }

    fn ctx(path: &str, query: &str) -> MatchContext {
        MatchContext::new(path, QueryParams::parse(query), "catalog.nypl.org", "https")
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let rules = build_rules(r"b\d{8}").unwrap();
        let dispatched = dispatch(&rules, &ctx("/search/i0012-9976", ""), &env(RecordSource::Unknown))
            .await
            .unwrap();

        assert_eq!(dispatched.rule, "issn");
        assert_eq!(dispatched.class, RouteClass::Permanent);
        assert_eq!(
            dispatched.destination,
            "www.nypl.org/research/research-catalog/search?issn=0012-9976&redirectOnMatch=true"
        );
    }

    #[tokio::test]
    async fn test_no_match() {
        let rules = build_rules(r"b\d{8}").unwrap();
        assert!(dispatch(&rules, &ctx("/nothing/here", ""), &env(RecordSource::Unknown))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_async_rule_awaits_classifier() {
        let rules = build_rules(r"b\d{8}").unwrap();

        let primary = dispatch(&rules, &ctx("/search/o1081334684", ""), &env(RecordSource::Primary))
            .await
            .unwrap();
        assert_eq!(primary.rule, "oclc");
        assert_eq!(primary.class, RouteClass::Dynamic);
        assert_eq!(
            primary.destination,
            "www.nypl.org/research/research-catalog/search?oclc=1081334684&redirectOnMatch=true"
        );

        let secondary = RecordSource::Secondary {
            record_id: "21317167".to_string(),
        };
        let dispatched = dispatch(&rules, &ctx("/search/o=75307280", ""), &env(secondary))
            .await
            .unwrap();
        assert_eq!(dispatched.destination, "borrow.nypl.org/search/card?recordId=21317167");

        let unknown = dispatch(&rules, &ctx("/search/o75307280", ""), &env(RecordSource::Unknown))
            .await
            .unwrap();
        assert_eq!(unknown.destination, "www.nypl.org/research/research-catalog/404/redirect");
    }
}
