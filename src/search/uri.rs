use super::query::{Freshness, NormalizedQuery};

/// Provider token for a freshness filter; `None` leaves the parameter off.
pub fn freshness_token(freshness: Freshness) -> Option<&'static str> {
    Some(match freshness {
        Freshness::Any => return None,
        Freshness::Day => "Day",
        Freshness::Week => "Week",
        Freshness::Month => "Month",
    })
}

/// `(site:D1 OR site:D2 ...)`, or `None` with no domains.
pub fn site_clause(domains: &[String]) -> Option<String> {
    if domains.is_empty() {
        return None;
    }
    let sites = domains
        .iter()
        .map(|d| format!("site:{d}"))
        .collect::<Vec<_>>()
        .join(" OR ");
    Some(format!("({sites})"))
}

/// Search text as the provider sees it, before encoding.
pub fn query_text(query: &NormalizedQuery) -> String {
    match site_clause(&query.domains) {
        Some(clause) => format!("{} {}", query.search_text, clause),
        None => query.search_text.clone(),
    }
}

#[derive(Debug, Clone)]
pub struct RequestUriComposer {
    base_url: String,
}

impl RequestUriComposer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    /// Renders `base?mkt&count[&freshness]&safeSearch&offset&q`. Only `q` is percent-encoded.
    pub fn compose(&self, query: &NormalizedQuery) -> String {
        let mut params: Vec<(&str, String)> = Vec::with_capacity(6);
        params.push(("mkt", query.market.clone()));
        params.push(("count", query.page_size.to_string()));
        if let Some(token) = freshness_token(query.freshness) {
            params.push(("freshness", token.to_string()));
        }
        params.push(("safeSearch", query.safety_level.clone()));
        params.push(("offset", query.offset.to_string()));
        params.push(("q", urlencoding::encode(&query_text(query)).into_owned()));

        let params = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.base_url, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::query::QueryBuilder;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use url::Url;

    const BASE: &str = "https://api.bing.microsoft.com/v7.0/search";

    fn query(text: &str, freshness: Option<&str>, domains: &[&str]) -> NormalizedQuery {
        QueryBuilder::new("en-US", 20, "Strict", "12345")
            .build(
                Some(text),
                Some("en-US"),
                freshness,
                domains.iter().map(|d| d.to_string()).collect(),
            )
            .expect("query")
    }

    #[test]
    fn test_single_domain_clause() {
        let uri = RequestUriComposer::new(BASE).compose(&query("COVID", Some("2"), &[".com"]));
        assert_eq!(
            uri,
            format!("{BASE}?mkt=en-US&count=20&freshness=Day&safeSearch=Strict&offset=0&q=COVID%20%28site%3A.com%29")
        );
    }

    #[test]
    fn test_multiple_domains_form_disjunction() {
        let q = query("space", None, &[".edu", ".gov"]);
        assert_eq!(query_text(&q), "space (site:.edu OR site:.gov)");
    }

    #[test]
    fn test_no_domains_leaves_text_alone() {
        let q = query("space", None, &[]);
        assert_eq!(query_text(&q), "space");
        assert_eq!(site_clause(&[]), None);
    }

    #[test]
    fn test_any_freshness_omits_parameter() {
        let composer = RequestUriComposer::new(BASE);
        let uri = composer.compose(&query("COVID", Some("any"), &[]));
        assert!(!uri.contains("freshness="));
        let uri = composer.compose(&query("COVID", None, &[]));
        assert!(!uri.contains("freshness="));
    }

    #[test]
    fn test_unrecognized_freshness_renders_month() {
        let uri = RequestUriComposer::new(BASE).compose(&query("COVID", Some("yesterday-ish"), &[]));
        assert!(uri.contains("&freshness=Month&"));
    }

    #[test]
    fn test_parameter_order_is_fixed() {
        let uri = RequestUriComposer::new(BASE).compose(&query("COVID", Some("week"), &[]));
        let keys: Vec<String> = Url::parse(&uri)
            .unwrap()
            .query_pairs()
            .map(|(k, _)| k.into_owned())
            .collect();
        assert_eq!(keys, ["mkt", "count", "freshness", "safeSearch", "offset", "q"]);
    }

    #[test]
    fn test_markup_is_percent_encoded() {
        let uri = RequestUriComposer::new(BASE).compose(&query("COVID <script>&x=1</script>", None, &[]));
        assert!(uri.ends_with("q=COVID%20%3Cscript%3E%26x%3D1%3C%2Fscript%3E"));
    }

    proptest! {
        /// Composing then parsing the URI gives back the search text and the domain set.
        #[test]
        fn search_text_and_domains_survive_composition(
            text in "[A-Za-z0-9][A-Za-z0-9 &+?=#]{0,30}[A-Za-z0-9]",
            picks in proptest::sample::subsequence(vec![".com", ".org", ".mil", ".gov", ".edu", ".net"], 0..=6),
        ) {
            let q = query(&text, None, &picks);
            let uri = RequestUriComposer::new(BASE).compose(&q);
            let parsed = Url::parse(&uri).unwrap();
            let (_, raw_q) = parsed.query_pairs().find(|(k, _)| k == "q").unwrap();

            let (text_part, domains): (&str, HashSet<String>) = match raw_q.find(" (site:") {
                Some(idx) => {
                    let clause = raw_q[idx + 2..raw_q.len() - 1].to_string();
                    let set = clause.split(" OR ").map(|s| s.trim_start_matches("site:").to_string()).collect();
                    (&raw_q[..idx], set)
                }
                None => (&raw_q[..], HashSet::new()),
            };

            prop_assert_eq!(text_part, q.search_text.as_str());
            let expected: HashSet<String> = picks.iter().map(|s| s.to_string()).collect();
            prop_assert_eq!(domains, expected);
        }
    }
}
