//! Rule matching logic.
//!
//! # Responsibilities
//! - Test a regular expression against the request path
//! - Run predicate matchers against the whole request context
//! - Capture match groups for the rule handler
//!
//! # Design Decisions
//! - Paths are matched raw (still percent-encoded)
//! - Path matching is case-sensitive unless a pattern opts out with `(?i)`
//! - Predicates exist for conditions that span several request fields

use std::fmt;

use regex::Regex;

use crate::routing::query::QueryParams;

/// Everything a rule may look at. Immutable per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchContext {
    pub path: String,
    pub query: QueryParams,
    pub host: String,
    pub proto: String,
}

impl MatchContext {
    pub fn new(
        path: impl Into<String>,
        query: QueryParams,
        host: impl Into<String>,
        proto: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            query,
            host: host.into(),
            proto: proto.into(),
        }
    }
}

/// Result of a successful match: the matched input and its capture groups.
///
/// Group 0 is the whole match, like a regex capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    input: String,
    groups: Vec<Option<String>>,
}

impl RouteMatch {
    /// Build a match from explicit groups (group 0 first).
    pub fn new(input: impl Into<String>, groups: Vec<Option<String>>) -> Self {
        Self {
            input: input.into(),
            groups,
        }
    }

    /// Build a match from regex captures against `input`.
    pub fn from_captures(input: &str, captures: &regex::Captures<'_>) -> Self {
        Self {
            input: input.to_string(),
            groups: captures
                .iter()
                .map(|m| m.map(|m| m.as_str().to_string()))
                .collect(),
        }
    }

    /// The string the matcher ran against.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// A capture group, `None` if it did not participate.
    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }

    /// A capture group, `""` if it did not participate.
    pub fn group_or_empty(&self, index: usize) -> &str {
        self.group(index).unwrap_or_default()
    }
}

/// Predicate over the full request context.
pub type Predicate = fn(&MatchContext) -> Option<RouteMatch>;

/// How a rule decides whether it applies.
pub enum Matcher {
    /// Regular expression tested against the path.
    Pattern(Regex),
    /// Custom function of path, query, host and protocol.
    Predicate(Predicate),
}

impl Matcher {
    /// Run the matcher against a request.
    pub fn find(&self, ctx: &MatchContext) -> Option<RouteMatch> {
        match self {
            Matcher::Pattern(regex) => regex
                .captures(&ctx.path)
                .map(|captures| RouteMatch::from_captures(&ctx.path, &captures)),
            Matcher::Predicate(predicate) => predicate(ctx),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(path: &str, query: &str) -> MatchContext {
        MatchContext::new(path, QueryParams::parse(query), "catalog.nypl.org", "https")
    }

    #[test]
    fn test_pattern_matcher() {
        let matcher = Matcher::Pattern(Regex::new(r"/search(~S\w*)?/([a-zA-Z])([^/]+)").unwrap());

        let m = matcher.find(&ctx("/search~S1/aExample/more", "")).unwrap();
        assert_eq!(m.group(0), Some("/search~S1/aExample"));
        assert_eq!(m.group(1), Some("~S1"));
        assert_eq!(m.group(2), Some("a"));
        assert_eq!(m.group(3), Some("Example"));
        assert_eq!(m.input(), "/search~S1/aExample/more");

        let m = matcher.find(&ctx("/search/tTitle", "")).unwrap();
        assert_eq!(m.group(1), None);
        assert_eq!(m.group_or_empty(1), "");

        assert!(matcher.find(&ctx("/patroninfo", "")).is_none());
    }

    #[test]
    fn test_pattern_is_case_sensitive() {
        let matcher = Matcher::Pattern(Regex::new(r"^/patroninfo").unwrap());
        assert!(matcher.find(&ctx("/patroninfo/123", "")).is_some());
        assert!(matcher.find(&ctx("/PatronInfo/123", "")).is_none());
    }

    #[test]
    fn test_predicate_matcher_sees_query() {
        fn has_collection(ctx: &MatchContext) -> Option<RouteMatch> {
            ctx.query
                .first("collection")
                .map(|c| RouteMatch::new(ctx.path.clone(), vec![Some(c.to_string())]))
        }
        let matcher = Matcher::Predicate(has_collection);

        let m = matcher.find(&ctx("/anything", "collection=circ")).unwrap();
        assert_eq!(m.group(0), Some("circ"));
        assert!(matcher.find(&ctx("/anything", "other=1")).is_none());
    }
}
