use crate::config::Config;
use crate::error::{Result, SearchCoachError};
use crate::search::{adapt, Freshness, NormalizedQuery, RequestUriComposer, WebPage};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const CONNECT_TIMEOUT: u64 = 10;
const REQUEST_TIMEOUT: u64 = 30;
const SUBSCRIPTION_KEY_HEADER: &str = "ocp-apim-subscription-key";
const PROBE_QUERY: &str = "search coach";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BingClient {
    client: reqwest::Client,
    composer: RequestUriComposer,
    default_market: String,
    safe_search: String,
    retry_max_attempts: u32,
    retry_multiplier: f64,
    retry_max_wait: u64,
}

impl BingClient {
    pub fn new(config: &Config) -> Result<Self> {
        let key = HeaderValue::from_str(config.api_key.trim())
            .map_err(|_| SearchCoachError::ConfigInvalid("BING_SEARCH_API_KEY contains invalid header characters".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(SUBSCRIPTION_KEY_HEADER), key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("search-coach-mcp/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT))
            .build()?;

        Ok(Self {
            client,
            composer: RequestUriComposer::new(config.api_url.clone()),
            default_market: config.default_market.clone(),
            safe_search: config.safe_search.clone(),
            retry_max_attempts: config.retry_max_attempts,
            retry_multiplier: config.retry_multiplier,
            retry_max_wait: config.retry_max_wait,
        })
    }

    pub async fn search(&self, query: &NormalizedQuery) -> Result<Vec<WebPage>> {
        let uri = self.composer.compose(query);
        debug!(market = %query.market, freshness = ?query.freshness, domains = query.domains.len(), "Requesting search results");

        let body = self.get_with_retry(&uri).await?;
        adapt(&body)
    }

    pub async fn test_connection(&self) -> ConnectionTestResult {
        let probe = NormalizedQuery {
            search_text: PROBE_QUERY.into(),
            market: self.default_market.clone(),
            domains: Vec::new(),
            freshness: Freshness::Any,
            page_size: 1,
            offset: 0,
            safety_level: self.safe_search.clone(),
            application_key: String::new(),
        };
        let uri = self.composer.compose(&probe);
        let start = Instant::now();

        match self.client.get(&uri).send().await {
            Ok(resp) => {
                let elapsed = start.elapsed().as_millis() as u64;
                let status = resp.status();

                if status.is_success() {
                    match resp.text().await.map_err(SearchCoachError::from).and_then(|body| adapt(&body)) {
                        Ok(pages) => ConnectionTestResult {
                            status: "success".into(),
                            response_time_ms: Some(elapsed),
                            result_count: Some(pages.len()),
                            error_code: None,
                            message: Some(format!("OK (HTTP {})", status.as_u16())),
                        },
                        Err(e) => ConnectionTestResult {
                            status: "error".into(),
                            response_time_ms: Some(elapsed),
                            result_count: None,
                            error_code: Some("PARSE_ERROR".into()),
                            message: Some(e.to_string()),
                        },
                    }
                } else {
                    let code = status.as_u16();
                    ConnectionTestResult {
                        status: "error".into(),
                        response_time_ms: Some(elapsed),
                        result_count: None,
                        error_code: Some(classify_status(code)),
                        message: Some(format!("HTTP {}", code)),
                    }
                }
            }
            Err(e) => ConnectionTestResult {
                status: "error".into(),
                response_time_ms: None,
                result_count: None,
                error_code: Some(if e.is_timeout() { "TIMEOUT" } else if e.is_connect() { "CONNECTION_FAILURE" } else { "NETWORK_ERROR" }.into()),
                message: Some(e.to_string()),
            },
        }
    }

    async fn get_with_retry(&self, uri: &str) -> Result<String> {
        let mut last_err = String::new();
        for attempt in 0..=self.retry_max_attempts {
            match self.try_get(uri).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    if !is_retryable(&e) {
                        return Err(e);
                    }
                    if attempt >= self.retry_max_attempts {
                        return Err(SearchCoachError::MaxRetries { attempts: self.retry_max_attempts + 1, last_error: e.to_string() });
                    }
                    last_err = e.to_string();
                    let delay = backoff(attempt, self.retry_multiplier, self.retry_max_wait);
                    warn!("Search API error, retrying in {:?} (attempt {}/{}): {}", delay, attempt + 1, self.retry_max_attempts + 1, last_err);
                    tokio::time::sleep(delay).await;
                }
            }
        }
        Err(SearchCoachError::MaxRetries { attempts: self.retry_max_attempts + 1, last_error: last_err })
    }

    async fn try_get(&self, uri: &str) -> Result<String> {
        let resp = self.client.get(uri).send().await.map_err(map_err)?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchCoachError::Api { status, message: body });
        }

        resp.text().await.map_err(map_err)
    }
}

fn backoff(attempt: u32, multiplier: f64, max_wait: u64) -> Duration {
    let base = 1.0_f64 * multiplier.powi(attempt as i32);
    let capped = base.min(max_wait as f64);
    let jitter = rand::thread_rng().gen_range(0.9..=1.1);
    Duration::from_secs_f64((capped * jitter).max(0.1))
}

fn map_err(e: reqwest::Error) -> SearchCoachError {
    if e.is_timeout() { SearchCoachError::Timeout(REQUEST_TIMEOUT) } else { SearchCoachError::Http(e) }
}

fn is_retryable(e: &SearchCoachError) -> bool {
    match e {
        SearchCoachError::Timeout(_) => true,
        SearchCoachError::Http(e) => e.is_timeout() || e.is_connect(),
        SearchCoachError::Api { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
        _ => false,
    }
}

fn classify_status(code: u16) -> String {
    match code {
        401 | 403 => "AUTH_ERROR",
        404 => "NOT_FOUND",
        429 => "RATE_LIMIT",
        500..=599 => "SERVER_ERROR",
        _ => "HTTP_ERROR",
    }.into()
}
