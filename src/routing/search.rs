//! Legacy search-query normalization.
//!
//! The classic catalog marks the type of a search with a single letter in
//! front of the term (`/search/aAuthor`, `searchtype=t`). Those letters map to
//! search scopes of the research catalog; keyword and unknown search types
//! become a general search.

use std::sync::LazyLock;

use regex::Regex;

use crate::routing::query::QueryParams;

static SPACE_OR_PLUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+|\s+").expect("static regex"));

/// Scope fragment for a legacy search-index letter, `""` if unmapped.
pub fn get_index_mapping(code: &str) -> &'static str {
    match code {
        "a" => "&search_scope=contributor",
        "t" => "&search_scope=title",
        "s" => "&search_scope=journal_title",
        // isbn/issn and other standard numbers
        "i" | "c" => "&search_scope=standard_number",
        _ => "",
    }
}

/// Replace the catalog's `+` (and any whitespace run) with `%20`.
pub fn recode_search_query(term: &str) -> String {
    SPACE_OR_PLUS.replace_all(term, "%20").into_owned()
}

/// Search term and index code hidden in a valueless query key.
///
/// Handles `search?/tbrainwash/...` (the index letter follows the slash) and
/// `search/t?brainwash` (the key is the bare term).
fn term_from_bare_key(query: &QueryParams) -> (Option<char>, Option<String>) {
    for (key, values) in query.iter() {
        if values.first().is_some_and(|v| !v.is_empty()) {
            continue;
        }
        let mut segments = key.split('/');
        let head = segments.next().unwrap_or_default();
        match segments.next().filter(|s| !s.is_empty()) {
            Some(segment) => {
                let mut chars = segment.chars();
                let code = chars.next();
                return (code, Some(chars.as_str().to_string()));
            }
            None if !head.is_empty() => return (None, Some(head.to_string())),
            None => {}
        }
    }
    (None, None)
}

/// Extract a legacy search from query parameters.
///
/// The term comes from `searcharg`, then `SEARCH`, then a valueless key. The
/// search type comes from `searchtype`, then the valueless key. Returns
/// `None` if there is no term at all.
pub fn query_from_params(query: &QueryParams) -> Option<String> {
    let param = |name: &str| query.first(name).filter(|v| !v.is_empty());
    let (key_code, key_term) = term_from_bare_key(query);

    let term = param("searcharg")
        .or_else(|| param("SEARCH"))
        .map(str::to_string)
        .or(key_term)
        .filter(|t| !t.is_empty())?;

    let scope = match param("searchtype") {
        Some(search_type) => get_index_mapping(search_type),
        None => key_code
            .map(|c| get_index_mapping(c.encode_utf8(&mut [0; 4])))
            .unwrap_or(""),
    };

    Some(recode_search_query(&format!("{}{}", term, scope)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_mapping() {
        assert_eq!(get_index_mapping("a"), "&search_scope=contributor");
        assert_eq!(get_index_mapping("t"), "&search_scope=title");
        assert_eq!(get_index_mapping("s"), "&search_scope=journal_title");
        assert_eq!(get_index_mapping("i"), "&search_scope=standard_number");
        assert_eq!(get_index_mapping("c"), "&search_scope=standard_number");
        assert_eq!(get_index_mapping("X"), "");
        assert_eq!(get_index_mapping("d"), "");
        assert_eq!(get_index_mapping(""), "");
    }

    #[test]
    fn test_recode_search_query() {
        assert_eq!(recode_search_query("The+Mothers+"), "The%20Mothers%20");
        assert_eq!(recode_search_query("winspeare, j"), "winspeare,%20j");
        assert_eq!(recode_search_query("a++b"), "a%20%20b");
        assert_eq!(recode_search_query("a \t b"), "a%20b");
        assert_eq!(recode_search_query("Rubina%2C+Dina"), "Rubina%2C%20Dina");
    }

    #[test]
    fn test_searcharg_and_searchtype() {
        let query: QueryParams = [
            ("searchtype", "a"),
            ("searcharg", "winspeare, j"),
            ("searchlimits", ""),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            query_from_params(&query).as_deref(),
            Some("winspeare,%20j&search_scope=contributor")
        );
    }

    #[test]
    fn test_search_param() {
        let query: QueryParams = [("SEARCH", "The+Mothers+"), ("sortdropdown", "-")]
            .into_iter()
            .collect();
        assert_eq!(query_from_params(&query).as_deref(), Some("The%20Mothers%20"));
    }

    #[test]
    fn test_bare_key_with_index() {
        let query = QueryParams::parse("/tbrainwash/tbrainwash/1,3,10,B/exact&FF=tbrainwash&1,4,");
        assert_eq!(
            query_from_params(&query).as_deref(),
            Some("brainwash&search_scope=title")
        );
    }

    #[test]
    fn test_bare_key_term_only() {
        let query = QueryParams::parse("jac+winspeare%2C");
        assert_eq!(query_from_params(&query).as_deref(), Some("jac%20winspeare%2C"));
    }

    #[test]
    fn test_no_term() {
        assert_eq!(query_from_params(&QueryParams::new()), None);
        let query: QueryParams = [("searchtype", "t"), ("SORT", "D")].into_iter().collect();
        assert_eq!(query_from_params(&query), None);
    }
}
