use thiserror::Error;

/// Market value the UI sends when no location filter is selected.
pub const NO_FILTER_MARKET: &str = "nf";

const DEFAULT_MARKETS: [&str; 7] = ["en-US", "ja-JP", "fr-FR", "de-DE", "it-IT", "ru-RU", "ko-KR"];
const DEFAULT_DOMAINS: [&str; 6] = [".com", ".org", ".mil", ".gov", ".edu", ".net"];
const DOMAIN_DELIMITER: char = ';';

/// Why a filter value was turned away. Callers decide how to log and surface it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterRejection {
    #[error("Search text cannot be null or empty.")]
    EmptySearchText,

    #[error("Selected country code value is null or empty.")]
    MissingMarket,

    #[error("Selected country code value '{0}' is invalid.")]
    UnknownMarket(String),

    #[error("Selected domain value is null or empty.")]
    MissingDomain,

    #[error("Selected domain value '{0}' is invalid.")]
    UnknownDomain(String),
}

/// Allow-lists consulted when validating user-selected filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
    markets: Vec<String>,
    domains: Vec<String>,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            markets: DEFAULT_MARKETS.iter().map(|s| s.to_string()).collect(),
            domains: DEFAULT_DOMAINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FilterPolicy {
    pub fn new(markets: Vec<String>, domains: Vec<String>) -> Self {
        Self { markets, domains }
    }

    pub fn with_markets(self, markets: Vec<String>) -> Self {
        Self { markets, ..self }
    }

    pub fn with_domains(self, domains: Vec<String>) -> Self {
        Self { domains, ..self }
    }

    pub fn markets(&self) -> &[String] {
        &self.markets
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// A market passes when it contains one of the allowed locale codes, ignoring case.
    /// Returns the allow-list entry it resolved to, never the caller's text.
    ///
    /// The no-filter sentinel is not special here; callers skip this check for it.
    pub fn check_market(&self, code: Option<&str>) -> Result<&str, FilterRejection> {
        let Some(code) = code else {
            return Err(FilterRejection::MissingMarket);
        };
        let needle = code.trim().to_lowercase();
        resolve(&self.markets, &needle, |allowed| needle.contains(allowed))
            .ok_or_else(|| FilterRejection::UnknownMarket(code.to_string()))
    }

    /// A domain passes when one of the allowed suffixes contains it, ignoring case.
    /// Returns the suffix it resolved to. Blank and ambiguous values are rejected.
    pub fn check_domain(&self, domain: Option<&str>) -> Result<&str, FilterRejection> {
        let Some(domain) = domain else {
            return Err(FilterRejection::MissingDomain);
        };
        let needle = domain.trim().to_lowercase();
        if needle.is_empty() {
            return Err(FilterRejection::UnknownDomain(domain.to_string()));
        }
        resolve(&self.domains, &needle, |allowed| allowed.contains(needle.as_str()))
            .ok_or_else(|| FilterRejection::UnknownDomain(domain.to_string()))
    }

    /// Splits a `;`-delimited selection and checks every entry. One bad entry rejects
    /// the whole batch. Absent or empty input means no domain restriction.
    pub fn check_domains(&self, raw: Option<&str>) -> Result<Vec<String>, FilterRejection> {
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            return Ok(Vec::new());
        };
        raw.split(DOMAIN_DELIMITER)
            .map(|domain| self.check_domain(Some(domain)).map(str::to_string))
            .collect()
    }

    pub fn is_valid_market(&self, code: Option<&str>) -> bool {
        self.check_market(code).is_ok()
    }

    pub fn is_valid_domain(&self, domain: Option<&str>) -> bool {
        self.check_domain(domain).is_ok()
    }
}

pub fn check_search_text(text: Option<&str>) -> Result<&str, FilterRejection> {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(FilterRejection::EmptySearchText),
    }
}

/// True when the caller asked for no market filter.
pub fn is_no_filter_market(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(NO_FILTER_MARKET)
}

/// An exact (case-insensitive) entry wins. Otherwise exactly one entry must satisfy
/// `accepts`, which sees the lowercased entry.
fn resolve<'p>(allowed: &'p [String], needle: &str, accepts: impl Fn(&str) -> bool) -> Option<&'p str> {
    if let Some(exact) = allowed.iter().find(|a| a.eq_ignore_ascii_case(needle)) {
        return Some(exact.as_str());
    }
    let mut hits = allowed.iter().filter(|a| accepts(a.to_lowercase().as_str()));
    match (hits.next(), hits.next()) {
        (Some(only), None) => Some(only.as_str()),
        _ => None,
    }
}
