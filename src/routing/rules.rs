//! The rule table.
//!
//! Rules are evaluated in declaration order and the first match wins. Each
//! rule pairs a [`Matcher`] with a handler that computes a destination from
//! the match, the request, and the configured targets.
//!
//! Encore rules come first because Encore paths also contain `/search`.
//! Within the classic catalog rules, the standard-number searches precede
//! the generic search rules, and a search term in the path wins over one in
//! the query string.

use std::sync::{Arc, LazyLock};

use futures_util::future::{self, BoxFuture, FutureExt};
use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::lookup::{RecordClassifier, RecordSource};
use crate::routing::matcher::{MatchContext, Matcher, RouteMatch};
use crate::routing::query::{encode_component, reconstruct_query};
use crate::routing::search::{get_index_mapping, query_from_params, recode_search_query};
use crate::routing::targets::{Origin, Targets};

/// Whether a mapping is a stable historical one or computed per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    Permanent,
    Dynamic,
}

/// What handlers can see besides the match.
#[derive(Debug, Clone)]
pub struct RuleEnv {
    pub targets: Targets,
    pub classifier: Arc<dyn RecordClassifier>,
}

pub type SyncHandler = fn(&RouteMatch, &MatchContext, &RuleEnv) -> String;
pub type AsyncHandler =
    for<'a> fn(&'a RouteMatch, &'a MatchContext, &'a RuleEnv) -> BoxFuture<'a, String>;

/// A rule handler: ready immediately or after an external lookup.
#[derive(Clone, Copy)]
pub enum Handler {
    Ready(SyncHandler),
    Pending(AsyncHandler),
}

impl Handler {
    /// Run the handler. Ready handlers resolve without suspending.
    pub fn invoke<'a>(
        &self,
        route_match: &'a RouteMatch,
        ctx: &'a MatchContext,
        env: &'a RuleEnv,
    ) -> BoxFuture<'a, String> {
        match self {
            Handler::Ready(handler) => future::ready(handler(route_match, ctx, env)).boxed(),
            Handler::Pending(handler) => handler(route_match, ctx, env),
        }
    }
}

/// One entry of the rule table.
#[derive(Debug)]
pub struct Rule {
    pub name: &'static str,
    pub class: RouteClass,
    pub matcher: Matcher,
    pub handler: Handler,
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Ready(_) => f.write_str("Ready(..)"),
            Handler::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

fn pattern(name: &'static str, class: RouteClass, regex: &str, handler: Handler) -> Result<Rule, regex::Error> {
    Ok(Rule {
        name,
        class,
        matcher: Matcher::Pattern(Regex::new(regex)?),
        handler,
    })
}

fn predicate(
    name: &'static str,
    class: RouteClass,
    predicate: crate::routing::matcher::Predicate,
    handler: Handler,
) -> Rule {
    Rule {
        name,
        class,
        matcher: Matcher::Predicate(predicate),
        handler,
    }
}

/// Build the ordered rule table.
///
/// `record_id_pattern` is the regex fragment for a well-formed legacy record
/// identifier; it is the only configurable pattern.
pub fn build_rules(record_id_pattern: &str) -> Result<Vec<Rule>, regex::Error> {
    use Handler::{Pending, Ready};
    use RouteClass::{Dynamic, Permanent};

    Ok(vec![
        pattern("home", Dynamic, r"(?:^/$)|(?:^/iii/encore$)|bookcart$|home$", Ready(home))?,
        predicate("compound_author_title", Permanent, compound_author_title_match, Ready(compound_author_title)),
        pattern("encore_record", Permanent, r"C__Rb(\d{8})(?:__|~\$1|$)", Ready(encore_record))?,
        pattern(
            "encore_language",
            Permanent,
            r"C__Sf:\((a|v)%20(?:\||%7[Cc])%20(u|y)\)(?:.*?)l:\(?([a-z]{3})\)?",
            Ready(encore_language),
        )?,
        predicate("encore_author_title", Permanent, encore_author_title_match, Ready(encore_author_title)),
        pattern("encore_keyword", Permanent, r"/search/C__S(.*?)(?:__|\?|$)", Ready(encore_keyword))?,
        pattern("encore_account", Permanent, r"/myaccount", Ready(encore_account))?,
        pattern("oclc", Dynamic, r"(?i:/search)/o=?(\d+)", Pending(oclc))?,
        pattern("issn", Permanent, r"(?i:/search)/i(\d{4}-\d{4})", Ready(issn))?,
        pattern("isbn", Permanent, r"(?i:/search)/i(\w+)", Ready(isbn))?,
        pattern("search_with_term", Permanent, r"(?i:/search)(~S\w*)?/([a-zA-Z])([^/]+)", Ready(search_with_term))?,
        pattern("search_without_term", Permanent, r"(?i:/search)(~S\w*)?(/([a-zA-Z]))?", Ready(search_without_term))?,
        pattern("patron_info", Permanent, r"^/patroninfo", Ready(patron_info))?,
        pattern(
            "record",
            Dynamic,
            &format!(r"/record=({})(?:\W|$)", record_id_pattern),
            Ready(record),
        )?,
        pattern("legacy_passthrough", Dynamic, r"pinreset|selfreg", Ready(legacy_passthrough))?,
    ])
}

fn vega_search(query: &str) -> String {
    format!("{}&searchType=everything&pageSize=10", query)
}

// Handlers

fn home(_m: &RouteMatch, ctx: &MatchContext, env: &RuleEnv) -> String {
    match env.targets.origin(&ctx.host) {
        Origin::Encore => env.targets.encore_fallback(),
        _ => env.targets.research_catalog.clone(),
    }
}

static COMPOUND_SEARCH_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/search/X").expect("static regex"));
static COMPOUND_SEARCH_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)search").expect("static regex"));
static COMPOUND_TITLE_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)t:\((.*)\)(?:%20|\s*)and(?:%20|\s*)a:\((.*)\)").expect("static regex")
});

/// `/search/X?SEARCH=t:(Title)and a:(Author)` style links from Vega.
fn compound_author_title_match(ctx: &MatchContext) -> Option<RouteMatch> {
    if !COMPOUND_SEARCH_PATH.is_match(&ctx.path) {
        return None;
    }
    let (_, values) = ctx
        .query
        .iter()
        .find(|(key, _)| COMPOUND_SEARCH_KEY.is_match(key))?;
    let value = values.first().filter(|v| !v.is_empty())?;
    COMPOUND_TITLE_AUTHOR
        .captures(value)
        .map(|captures| RouteMatch::from_captures(value, &captures))
}

fn compound_author_title(m: &RouteMatch, _ctx: &MatchContext, env: &RuleEnv) -> String {
    format!(
        "{}/search?contributor={}&title={}",
        env.targets.research_catalog,
        m.group_or_empty(2),
        m.group_or_empty(1)
    )
}

fn encore_record(m: &RouteMatch, _ctx: &MatchContext, env: &RuleEnv) -> String {
    format!("{}/search/card?recordId={}", env.targets.vega, m.group_or_empty(1))
}

fn encore_language(m: &RouteMatch, _ctx: &MatchContext, env: &RuleEnv) -> String {
    format!(
        "{}/search?query=*&searchType=everything&pageSize=10&languageIds={}&pageNum=0&materialTypeIds={},{}&sorting=publicationDate&sortOrder=desc",
        env.targets.vega,
        m.group_or_empty(3),
        m.group_or_empty(1),
        m.group_or_empty(2)
    )
}

static PARENTHESIZED_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(+([^-)]+)[^)]*").expect("static regex"));

/// Encore searches written as parenthesized clauses, e.g.
/// `C__St:(title words) a:(author)`. Negated sub-clauses (`-word`) are dropped.
fn encore_author_title_match(ctx: &MatchContext) -> Option<RouteMatch> {
    if !ctx.path.contains("C__S") {
        return None;
    }
    let decoded = percent_decode_str(&ctx.path).decode_utf8_lossy();
    let terms: Vec<&str> = PARENTHESIZED_TERM
        .captures_iter(&decoded)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    if terms.is_empty() {
        return None;
    }
    let query = encode_component(&terms.join(" "));
    Some(RouteMatch::new(ctx.path.clone(), vec![Some(query)]))
}

fn encore_author_title(m: &RouteMatch, _ctx: &MatchContext, env: &RuleEnv) -> String {
    vega_search(&format!("{}/search?query={}", env.targets.vega, m.group_or_empty(0)))
}

fn encore_keyword(m: &RouteMatch, _ctx: &MatchContext, env: &RuleEnv) -> String {
    vega_search(&format!("{}/search?query={}", env.targets.vega, m.group_or_empty(1)))
}

fn encore_account(_m: &RouteMatch, _ctx: &MatchContext, env: &RuleEnv) -> String {
    format!("{}/?openAccount=checkouts", env.targets.vega)
}

/// OCLC numbers can belong to either catalog; ask the platform.
fn oclc<'a>(m: &'a RouteMatch, _ctx: &'a MatchContext, env: &'a RuleEnv) -> BoxFuture<'a, String> {
    async move {
        let oclc = m.group_or_empty(1);
        match env.classifier.classify(oclc).await {
            RecordSource::Primary => format!(
                "{}/search?oclc={}&redirectOnMatch=true",
                env.targets.research_catalog, oclc
            ),
            RecordSource::Secondary { record_id } => {
                format!("{}/search/card?recordId={}", env.targets.vega, record_id)
            }
            RecordSource::Unknown => env.targets.not_found(),
        }
    }
    .boxed()
}

fn issn(m: &RouteMatch, _ctx: &MatchContext, env: &RuleEnv) -> String {
    format!(
        "{}/search?issn={}&redirectOnMatch=true",
        env.targets.research_catalog,
        m.group_or_empty(1)
    )
}

fn isbn(m: &RouteMatch, _ctx: &MatchContext, env: &RuleEnv) -> String {
    format!(
        "{}/search?isbn={}&redirectOnMatch=true",
        env.targets.research_catalog,
        m.group_or_empty(1)
    )
}

fn search_with_term(m: &RouteMatch, _ctx: &MatchContext, env: &RuleEnv) -> String {
    format!(
        "{}/search?q={}{}",
        env.targets.research_catalog,
        recode_search_query(m.group_or_empty(3)),
        get_index_mapping(m.group_or_empty(2))
    )
}

fn search_without_term(m: &RouteMatch, ctx: &MatchContext, env: &RuleEnv) -> String {
    match query_from_params(&ctx.query) {
        Some(query) => format!(
            "{}/search?q={}{}",
            env.targets.research_catalog,
            query,
            get_index_mapping(m.group_or_empty(3))
        ),
        None => env.targets.research_catalog.clone(),
    }
}

fn patron_info(_m: &RouteMatch, _ctx: &MatchContext, env: &RuleEnv) -> String {
    format!("{}/account", env.targets.research_catalog)
}

/// Bib pages. `collection=circ` sends the record to the circulating catalog,
/// which knows it by the numeric part of the identifier.
fn record(m: &RouteMatch, ctx: &MatchContext, env: &RuleEnv) -> String {
    let bnum = m.group_or_empty(1);
    if ctx.query.get_all("collection").iter().any(|c| c == "circ") {
        let numeric = bnum.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        format!("{}/search/card?recordId={}", env.targets.vega, numeric)
    } else {
        format!("{}/bib/{}", env.targets.research_catalog, bnum)
    }
}

/// Pages that were never migrated stay on the legacy catalog.
fn legacy_passthrough(m: &RouteMatch, ctx: &MatchContext, env: &RuleEnv) -> String {
    format!(
        "{}{}{}",
        env.targets.legacy_catalog,
        m.input(),
        reconstruct_query(&ctx.query)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::lookup::StaticClassifier;
    use crate::routing::query::QueryParams;

    fn env() -> RuleEnv {
        RuleEnv {
            targets: Targets::from_config(&CatalogConfig::default()),
            classifier: Arc::new(StaticClassifier::new(RecordSource::Primary)),
        }
    }

    fn first_match<'r>(rules: &'r [Rule], ctx: &MatchContext) -> Option<(&'r Rule, RouteMatch)> {
        rules
            .iter()
            .find_map(|rule| rule.matcher.find(ctx).map(|m| (rule, m)))
    }

    fn rule_name(path: &str, query: &str) -> Option<&'static str> {
        let rules = build_rules(r"b\d{8}").unwrap();
        let ctx = MatchContext::new(path, QueryParams::parse(query), "catalog.nypl.org", "https");
        first_match(&rules, &ctx).map(|(rule, _)| rule.name)
    }

    #[test]
    fn test_rule_table_compiles_in_order() {
        let rules = build_rules(r"b\d{8}").unwrap();
        let names: Vec<&str> = rules.iter().map(|r| r.name).collect();
        assert_eq!(names.first(), Some(&"home"));
        assert_eq!(names.last(), Some(&"legacy_passthrough"));
        assert_eq!(names.len(), 15);
    }

    #[test]
    fn test_invalid_record_pattern_is_an_error() {
        assert!(build_rules("b(").is_err());
    }

    #[test]
    fn test_selected_rules() {
        assert_eq!(rule_name("/", ""), Some("home"));
        assert_eq!(rule_name("/iii/encore", ""), Some("home"));
        assert_eq!(rule_name("/bookcart", ""), Some("home"));
        assert_eq!(rule_name("/record=b12345678", ""), Some("record"));
        assert_eq!(rule_name("/search/aExample", ""), Some("search_with_term"));
        assert_eq!(rule_name("/search~S11/aExample", ""), Some("search_with_term"));
        assert_eq!(rule_name("/search/a", "Example"), Some("search_without_term"));
        assert_eq!(rule_name("/search", "/aExample"), Some("search_without_term"));
        assert_eq!(rule_name("/search~S12/a", "Example"), Some("search_without_term"));
        assert_eq!(rule_name("/search/o1081334684", ""), Some("oclc"));
        assert_eq!(rule_name("/search/o=75307280", ""), Some("oclc"));
        assert_eq!(rule_name("/search/i0012-9976", ""), Some("issn"));
        assert_eq!(rule_name("/search/i178694135X", ""), Some("isbn"));
        assert_eq!(rule_name("/patroninfo/1234567", ""), Some("patron_info"));
        assert_eq!(rule_name("/screens/selfregpick.html", ""), Some("legacy_passthrough"));
        assert_eq!(rule_name("/myaccount", ""), Some("encore_account"));
    }

    #[test]
    fn test_malformed_record_ids_do_not_match() {
        assert_eq!(rule_name("/record=fishsticks", ""), None);
        assert_eq!(rule_name("/record=bsomeid/", ""), None);
        assert_eq!(rule_name("/record=b1234567", ""), None);
        assert_eq!(rule_name("/record=b123456789", ""), None);
        assert_eq!(rule_name("/record=b12172157~S1", ""), Some("record"));
    }

    #[test]
    fn test_search_segment_ignores_case() {
        assert_eq!(rule_name("/SEARCH/aExample", ""), Some("search_with_term"));
        assert_eq!(rule_name("/SeArCh~S1/tTitle", ""), Some("search_with_term"));
    }

    #[test]
    fn test_compound_and_spacing_variants() {
        for value in [
            "t:(Title)and%20a:(Author)",
            "t:(Title) and a:(Author)",
            "t:(Title)anda:(Author)",
            "t:(Title)%20and%20a:(Author)",
            "t:(Title)%20anda:(Author)",
        ] {
            let query = format!("SEARCH={}", value);
            assert_eq!(
                rule_name("/search/X", &query),
                Some("compound_author_title"),
                "value: {}",
                value
            );
        }
        assert_eq!(
            rule_name("/search/X", "SEARCH=t:(Title)or%20a:(Author)"),
            Some("search_without_term")
        );
    }

    #[test]
    fn test_encore_author_title_terms() {
        let ctx = MatchContext::new(
            "/search/C__S%28Didion%2C%20Joan.%29%20t%3A%28democracy%20-1980s%20-%28golden%20age%29%29__Orightresult__U",
            QueryParams::new(),
            "browse.nypl.org",
            "https",
        );
        let m = encore_author_title_match(&ctx).unwrap();
        assert_eq!(m.group(0), Some("Didion%2C%20Joan.%20democracy%20"));

        let keyword = MatchContext::new("/search/C__SAncient%20Greece", QueryParams::new(), "browse.nypl.org", "https");
        assert!(encore_author_title_match(&keyword).is_none());
    }

    #[tokio::test]
    async fn test_ready_handler_invokes_synchronously() {
        let env = env();
        let ctx = MatchContext::new("/patroninfo", QueryParams::new(), "catalog.nypl.org", "https");
        let m = RouteMatch::new("/patroninfo", vec![Some("/patroninfo".to_string())]);

        let destination = Handler::Ready(patron_info).invoke(&m, &ctx, &env).await;
        assert_eq!(destination, "www.nypl.org/research/research-catalog/account");
    }
}
