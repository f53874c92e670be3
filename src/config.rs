use crate::error::{Result, SearchCoachError};
use crate::search::FilterPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_API_URL: &str = "https://api.bing.microsoft.com/v7.0/search";
const DEFAULT_SAFE_SEARCH: &str = "Strict";
const DEFAULT_MARKET: &str = "en-US";
const CONFIG_DIR_NAME: &str = "search-coach";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_key: String,
    pub safe_search: String,
    pub default_market: String,
    pub result_count: u32,
    pub filters: FilterPolicy,
    pub retry_max_attempts: u32,
    pub retry_multiplier: f64,
    pub retry_max_wait: u64,
    pub log_level: String,
}

/// Overrides read from `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_market: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_markets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_domains: Option<Vec<String>>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path();
        let persisted = match read_persisted_config(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("Ignoring persisted config: {}", e);
                PersistedConfig::default()
            }
        };
        Self::from_env(persisted)
    }

    /// Builds the configuration from environment variables, layering `persisted` on top
    /// of the built-in defaults.
    pub fn from_env(persisted: PersistedConfig) -> Result<Self> {
        let api_url = env_opt("BING_SEARCH_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        validate_url(&api_url)?;

        let api_key = env_required("BING_SEARCH_API_KEY")?.trim().to_string();
        if api_key.is_empty() {
            return Err(SearchCoachError::ConfigInvalid("BING_SEARCH_API_KEY cannot be empty".into()));
        }

        let safe_search = canonical_safe_search(
            &env_opt("BING_SAFE_SEARCH").unwrap_or_else(|| DEFAULT_SAFE_SEARCH.into()),
        )?;

        let default_market = persisted
            .default_market
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| env_opt("BING_DEFAULT_MARKET"))
            .unwrap_or_else(|| DEFAULT_MARKET.into())
            .trim()
            .to_string();

        let mut filters = FilterPolicy::default();
        if let Some(markets) = persisted.allowed_markets {
            filters = filters.with_markets(non_empty_entries("allowed_markets", markets)?);
        }
        if let Some(domains) = persisted.allowed_domains {
            filters = filters.with_domains(non_empty_entries("allowed_domains", domains)?);
        }

        Ok(Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            api_key,
            safe_search,
            default_market,
            result_count: env_u32_range("BING_RESULT_COUNT", 20, 1, 50)?,
            filters,
            retry_max_attempts: env_u32_range("BING_RETRY_MAX_ATTEMPTS", 3, 0, 10)?,
            retry_multiplier: env_f64_range("BING_RETRY_MULTIPLIER", 1.0, 0.1, 10.0)?,
            retry_max_wait: env_u64_range("BING_RETRY_MAX_WAIT", 10, 1, 300)?,
            log_level: env_opt("SEARCH_COACH_LOG_LEVEL").unwrap_or_else(|| "INFO".into()).to_uppercase(),
        })
    }

    pub fn mask_api_key(&self) -> String {
        mask_key(&self.api_key)
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
    }

    pub fn config_file_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE_NAME)
    }
}

/// A missing file is not an error; an unreadable or unparsable one is.
pub fn read_persisted_config(path: &Path) -> Result<PersistedConfig> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PersistedConfig::default()),
        Err(e) => return Err(SearchCoachError::Io(e)),
    };
    serde_json::from_str(&raw).map_err(|e| SearchCoachError::ConfigFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn env_required(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| {
        SearchCoachError::ConfigMissing(format!(
            "{name} not configured.\nSet it in the server's env block, for example:\n\
            '{{\"type\":\"stdio\",\"command\":\"search-coach-mcp\",\"env\":{{\"BING_SEARCH_API_KEY\":\"your-key\"}}}}'"
        ))
    })
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn env_u32_range(name: &str, default: u32, min: u32, max: u32) -> Result<u32> {
    let Some(raw) = env_opt(name) else { return Ok(default) };
    let val: u32 = raw.trim().parse().map_err(|_| {
        SearchCoachError::ConfigInvalid(format!("{name} must be an integer between {min} and {max}"))
    })?;
    if !(min..=max).contains(&val) {
        return Err(SearchCoachError::ConfigInvalid(format!("{name} must be an integer between {min} and {max}")));
    }
    Ok(val)
}

fn env_u64_range(name: &str, default: u64, min: u64, max: u64) -> Result<u64> {
    let Some(raw) = env_opt(name) else { return Ok(default) };
    let val: u64 = raw.trim().parse().map_err(|_| {
        SearchCoachError::ConfigInvalid(format!("{name} must be an integer between {min} and {max}"))
    })?;
    if !(min..=max).contains(&val) {
        return Err(SearchCoachError::ConfigInvalid(format!("{name} must be an integer between {min} and {max}")));
    }
    Ok(val)
}

fn env_f64_range(name: &str, default: f64, min: f64, max: f64) -> Result<f64> {
    let Some(raw) = env_opt(name) else { return Ok(default) };
    let val: f64 = raw.trim().parse().map_err(|_| {
        SearchCoachError::ConfigInvalid(format!("{name} must be a number between {min} and {max}"))
    })?;
    if !val.is_finite() || val < min || val > max {
        return Err(SearchCoachError::ConfigInvalid(format!("{name} must be a number between {min} and {max}")));
    }
    Ok(val)
}

fn validate_url(url: &str) -> Result<()> {
    let url = url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(SearchCoachError::ConfigInvalid("BING_SEARCH_API_URL must be a valid http or https URL".into()));
    }
    Ok(())
}

fn canonical_safe_search(raw: &str) -> Result<String> {
    match raw.trim().to_lowercase().as_str() {
        "off" => Ok("Off".into()),
        "moderate" => Ok("Moderate".into()),
        "strict" => Ok("Strict".into()),
        _ => Err(SearchCoachError::ConfigInvalid("BING_SAFE_SEARCH must be one of Off, Moderate, Strict".into())),
    }
}

fn non_empty_entries(field: &str, entries: Vec<String>) -> Result<Vec<String>> {
    let entries: Vec<String> = entries
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if entries.is_empty() {
        return Err(SearchCoachError::ConfigInvalid(format!("{field} must list at least one value")));
    }
    Ok(entries)
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.trim().chars().collect();
    if chars.len() <= 8 {
        return "********".into();
    }
    let first: String = chars[..4].iter().collect();
    let last: String = chars[chars.len() - 4..].iter().collect();
    format!("{first}********{last}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    const ALL_VARS: [&str; 9] = [
        "BING_SEARCH_API_URL",
        "BING_SAFE_SEARCH",
        "BING_DEFAULT_MARKET",
        "BING_RESULT_COUNT",
        "BING_RETRY_MAX_ATTEMPTS",
        "BING_RETRY_MULTIPLIER",
        "BING_RETRY_MAX_WAIT",
        "SEARCH_COACH_LOG_LEVEL",
        "BING_SEARCH_API_KEY",
    ];

    /// Runs `f` with every config variable cleared except the ones in `set`.
    fn with_env<F: FnOnce()>(set: &[(&str, &str)], f: F) {
        let vars: Vec<(&str, Option<&str>)> = ALL_VARS
            .iter()
            .map(|name| (*name, set.iter().find(|(k, _)| k == name).map(|(_, v)| *v)))
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    #[serial]
    fn defaults_apply_when_only_key_is_set() {
        with_env(&[("BING_SEARCH_API_KEY", "  abc123  ")], || {
            let config = Config::from_env(PersistedConfig::default()).expect("load config");
            assert_eq!(config.api_key, "abc123");
            assert_eq!(config.api_url, DEFAULT_API_URL);
            assert_eq!(config.safe_search, "Strict");
            assert_eq!(config.default_market, "en-US");
            assert_eq!(config.result_count, 20);
            assert_eq!(config.retry_max_attempts, 3);
            assert_eq!(config.log_level, "INFO");
            assert_eq!(config.filters, FilterPolicy::default());
        });
    }

    #[test]
    #[serial]
    fn missing_key_is_reported() {
        with_env(&[], || {
            let err = Config::from_env(PersistedConfig::default()).unwrap_err();
            assert!(matches!(err, SearchCoachError::ConfigMissing(_)));
        });
    }

    #[test]
    #[serial]
    fn blank_key_is_invalid() {
        with_env(&[("BING_SEARCH_API_KEY", "   ")], || {
            // env_required does not filter blanks, so the trim check catches it.
            let err = Config::from_env(PersistedConfig::default()).unwrap_err();
            assert!(matches!(err, SearchCoachError::ConfigInvalid(_)));
        });
    }

    #[test]
    #[serial]
    fn overrides_are_validated() {
        with_env(
            &[
                ("BING_SEARCH_API_KEY", "k"),
                ("BING_SEARCH_API_URL", "https://example.test/search/"),
                ("BING_SAFE_SEARCH", "moderate"),
                ("BING_RESULT_COUNT", "35"),
                ("SEARCH_COACH_LOG_LEVEL", "debug"),
            ],
            || {
                let config = Config::from_env(PersistedConfig::default()).expect("load config");
                assert_eq!(config.api_url, "https://example.test/search");
                assert_eq!(config.safe_search, "Moderate");
                assert_eq!(config.result_count, 35);
                assert_eq!(config.log_level, "DEBUG");
            },
        );

        with_env(&[("BING_SEARCH_API_KEY", "k"), ("BING_RESULT_COUNT", "500")], || {
            assert!(Config::from_env(PersistedConfig::default()).is_err());
        });
        with_env(&[("BING_SEARCH_API_KEY", "k"), ("BING_SAFE_SEARCH", "lenient")], || {
            assert!(Config::from_env(PersistedConfig::default()).is_err());
        });
        with_env(&[("BING_SEARCH_API_KEY", "k"), ("BING_SEARCH_API_URL", "ftp://nope")], || {
            assert!(Config::from_env(PersistedConfig::default()).is_err());
        });
    }

    #[test]
    #[serial]
    fn persisted_allow_lists_replace_defaults() {
        with_env(&[("BING_SEARCH_API_KEY", "k"), ("BING_DEFAULT_MARKET", "fr-FR")], || {
            let persisted = PersistedConfig {
                default_market: Some("de-DE".into()),
                allowed_markets: Some(vec!["de-DE".into(), " ".into()]),
                allowed_domains: Some(vec![".edu".into()]),
            };
            let config = Config::from_env(persisted).expect("load config");
            assert_eq!(config.default_market, "de-DE");
            assert!(config.filters.is_valid_market(Some("de-DE")));
            assert!(!config.filters.is_valid_market(Some("en-US")));
            assert!(config.filters.is_valid_domain(Some(".edu")));
            assert!(!config.filters.is_valid_domain(Some(".com")));
        });
    }

    #[test]
    #[serial]
    fn empty_persisted_allow_list_is_rejected() {
        with_env(&[("BING_SEARCH_API_KEY", "k")], || {
            let persisted = PersistedConfig {
                allowed_domains: Some(vec!["".into()]),
                ..Default::default()
            };
            assert!(Config::from_env(persisted).is_err());
        });
    }

    #[test]
    fn persisted_file_round_trips_through_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);

        assert!(read_persisted_config(&path).unwrap().allowed_markets.is_none());

        fs::write(&path, r#"{ "allowed_markets": ["en-GB"], "unknown": 1 }"#).unwrap();
        let cfg = read_persisted_config(&path).unwrap();
        assert_eq!(cfg.allowed_markets, Some(vec!["en-GB".to_string()]));

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            read_persisted_config(&path),
            Err(SearchCoachError::ConfigFile { .. })
        ));
    }

    #[test]
    fn mask_key_hides_the_middle() {
        assert_eq!(mask_key("short"), "********");
        assert_eq!(mask_key("abcd1234efgh"), "abcd********efgh");
    }
}
