use super::filter::is_no_filter_market;
use crate::config::Config;
use serde::Serialize;

/// Coarse recency filter selected in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    #[default]
    Any,
    Day,
    Week,
    Month,
}

impl Freshness {
    /// Matches the UI keys (`1`..`4`) and the plain names, ignoring case.
    pub fn recognize(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "1" | "any" | "all" => Some(Self::Any),
            "2" | "day" => Some(Self::Day),
            "3" | "week" => Some(Self::Week),
            "4" | "month" => Some(Self::Month),
            _ => None,
        }
    }

    /// Absent or empty means `Any`. Anything unrecognized falls back to `Month`.
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim).filter(|c| !c.is_empty()) {
            None => Self::Any,
            Some(c) => Self::recognize(c).unwrap_or(Self::Month),
        }
    }
}

/// Fully shaped search request, ready for URI composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedQuery {
    pub search_text: String,
    pub market: String,
    pub domains: Vec<String>,
    pub freshness: Freshness,
    pub page_size: u32,
    pub offset: u32,
    pub safety_level: String,
    #[serde(skip)]
    pub application_key: String,
}

/// Provider defaults injected into every query.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    default_market: String,
    page_size: u32,
    safety_level: String,
    application_key: String,
}

impl QueryBuilder {
    pub fn new(
        default_market: impl Into<String>,
        page_size: u32,
        safety_level: impl Into<String>,
        application_key: impl Into<String>,
    ) -> Self {
        Self {
            default_market: default_market.into(),
            page_size,
            safety_level: safety_level.into(),
            application_key: application_key.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.default_market.clone(),
            config.result_count,
            config.safe_search.clone(),
            config.api_key.clone(),
        )
    }

    /// Shapes already-validated inputs. `None` means the caller skipped validation.
    pub fn build(
        &self,
        search_text: Option<&str>,
        market: Option<&str>,
        freshness: Option<&str>,
        domains: Vec<String>,
    ) -> Option<NormalizedQuery> {
        let search_text = search_text.map(str::trim).filter(|t| !t.is_empty());
        let (Some(search_text), Some(market)) = (search_text, market) else {
            tracing::error!("Search query could not be shaped: search text or market missing after validation");
            return None;
        };

        let market = if is_no_filter_market(market) {
            self.default_market.clone()
        } else {
            market.to_string()
        };

        Some(NormalizedQuery {
            search_text: search_text.to_string(),
            market,
            domains,
            freshness: Freshness::from_code(freshness),
            page_size: self.page_size,
            offset: 0,
            safety_level: self.safety_level.clone(),
            application_key: self.application_key.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> QueryBuilder {
        QueryBuilder::new("en-US", 20, "Strict", "12345")
    }

    #[test]
    fn test_freshness_codes() {
        assert_eq!(Freshness::from_code(None), Freshness::Any);
        assert_eq!(Freshness::from_code(Some("")), Freshness::Any);
        assert_eq!(Freshness::from_code(Some("1")), Freshness::Any);
        assert_eq!(Freshness::from_code(Some("Day")), Freshness::Day);
        assert_eq!(Freshness::from_code(Some("3")), Freshness::Week);
        assert_eq!(Freshness::from_code(Some("month")), Freshness::Month);
    }

    #[test]
    fn test_unrecognized_freshness_falls_back_to_month() {
        assert_eq!(Freshness::recognize("fortnight"), None);
        assert_eq!(Freshness::from_code(Some("fortnight")), Freshness::Month);
        assert_eq!(Freshness::from_code(Some("5")), Freshness::Month);
    }

    #[test]
    fn test_build_trims_and_injects_defaults() {
        let query = builder()
            .build(Some("  COVID  "), Some("fr-FR"), Some("2"), vec![".com".into()])
            .expect("query");
        assert_eq!(query.search_text, "COVID");
        assert_eq!(query.market, "fr-FR");
        assert_eq!(query.domains, vec![".com".to_string()]);
        assert_eq!(query.freshness, Freshness::Day);
        assert_eq!(query.page_size, 20);
        assert_eq!(query.offset, 0);
        assert_eq!(query.safety_level, "Strict");
        assert_eq!(query.application_key, "12345");
    }

    #[test]
    fn test_build_keeps_markup_verbatim() {
        let query = builder()
            .build(Some("COVID <script></script>"), Some("en-US"), None, vec![])
            .expect("query");
        assert_eq!(query.search_text, "COVID <script></script>");
    }

    #[test]
    fn test_no_filter_market_resolves_to_default() {
        let query = builder().build(Some("COVID"), Some("nf"), None, vec![]).expect("query");
        assert_eq!(query.market, "en-US");

        let query = QueryBuilder::new("de-DE", 20, "Strict", "k")
            .build(Some("COVID"), Some("NF"), None, vec![])
            .expect("query");
        assert_eq!(query.market, "de-DE");
    }

    #[test]
    fn test_unshapeable_input_yields_none() {
        assert!(builder().build(None, Some("en-US"), None, vec![]).is_none());
        assert!(builder().build(Some("   "), Some("en-US"), None, vec![]).is_none());
        assert!(builder().build(Some("COVID"), None, None, vec![]).is_none());
    }

    #[test]
    fn test_application_key_is_not_serialized() {
        let query = builder().build(Some("COVID"), Some("en-US"), None, vec![]).expect("query");
        let json = serde_json::to_value(&query).unwrap();
        assert!(json.get("applicationKey").is_none());
        assert_eq!(json["searchText"], "COVID");
        assert_eq!(json["freshness"], "any");
    }
}
