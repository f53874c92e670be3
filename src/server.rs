use crate::bing::BingClient;
use crate::config::Config;
use crate::leaderboard::{aggregate, distinct_user_ids, DisplayNames};
use crate::search::{check_search_text, is_no_filter_market, FilterRejection, Freshness, QueryBuilder, NO_FILTER_MARKET};
use crate::tools::{GetConfigInfoParams, LeaderboardParams, WebSearchParams};

use chrono::Utc;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct SearchCoachServer {
    pub config: Config,
    pub client: BingClient,
    pub builder: QueryBuilder,
}

impl SearchCoachServer {
    pub fn new(config: Config) -> crate::error::Result<Self> {
        let client = BingClient::new(&config)?;
        let builder = QueryBuilder::from_config(&config);
        Ok(Self { config, client, builder })
    }

    /// Runs the allow-list checks and returns the accepted market and domain list, both
    /// taken from the allow-lists rather than the request.
    fn validate_filters(&self, params: &WebSearchParams) -> Result<(String, Vec<String>), FilterRejection> {
        let policy = &self.config.filters;
        check_search_text(Some(params.search_text.as_str()))?;
        let market = if is_no_filter_market(&params.selected_country) {
            NO_FILTER_MARKET
        } else {
            policy.check_market(Some(params.selected_country.as_str()))?
        };
        let domains = policy.check_domains(params.domain_values.as_deref())?;
        Ok((market.to_string(), domains))
    }
}

#[tool_router]
impl SearchCoachServer {
    #[tool(description = r#"
    Searches the web with the student's filters applied and returns the matching web pages
    as a JSON string.

    The `search_text` is the free-form query. It is sent as typed (trimmed).

    The `selected_country` restricts results to a market such as "en-US", "fr-FR" or "ja-JP".
    Use "nf" for no location filter; the configured default market is used instead.

    The `freshness` limits results by age: "1"/"any", "2"/"day", "3"/"week", "4"/"month".

    The `domain_values` restricts results to domain suffixes separated by ';', e.g. ".edu;.gov".
    Every suffix must be one of the allowed values or the whole request is rejected.
    "#)]
    pub async fn web_search(&self, Parameters(params): Parameters<WebSearchParams>) -> Result<String, McpError> {
        params.validate().map_err(|msg| McpError::invalid_params(msg, None))?;

        let (market, domains) = self.validate_filters(&params).map_err(|rejection| {
            warn!("Search filters rejected: {}", rejection);
            McpError::invalid_params(rejection.to_string(), None)
        })?;

        if let Some(code) = params.freshness.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            if Freshness::recognize(code).is_none() {
                debug!("Unrecognized freshness code {:?}, using month", code);
            }
        }

        let query = self
            .builder
            .build(
                Some(params.search_text.as_str()),
                Some(market.as_str()),
                params.freshness.as_deref(),
                domains,
            )
            .ok_or_else(|| McpError::internal_error("Search query could not be constructed", None))?;

        let pages = self.client.search(&query).await.map_err(|e| {
            warn!(
                "Search failed for text={:?} country={:?} freshness={:?} domains={:?}: {}",
                params.search_text, params.selected_country, params.freshness, params.domain_values, e
            );
            McpError::internal_error(e.to_string(), None)
        })?;

        if pages.is_empty() {
            info!("Search results not found for current search criteria");
        }

        let payload = serde_json::json!({
            "query": query,
            "fetched_at": Utc::now().to_rfc3339(),
            "count": pages.len(),
            "results": pages,
        });

        serde_json::to_string_pretty(&payload).map_err(|e| McpError::internal_error(e.to_string(), None))
    }

    #[tool(description = r#"
    Builds the quiz leaderboard for a team from pre-fetched response records.

    Parameters
    ----------
    team_id : str
        Team the leaderboard belongs to.
    group_id : str
        Group within the team.
    records : list
        Response records: `{ "userId", "isCorrectAnswer", "isQuestionAttempted" }`.
    display_names : object
        Map from user id to display name. Must cover every user id in `records`.

    Returns
    -------
    str
        A JSON array with one `{ "userName", "rightAnswers", "questionsAttempted" }`
        object per user, in the order users first appear in `records`.
        An empty array when there are no records yet.
    "#)]
    pub async fn leaderboard(&self, Parameters(params): Parameters<LeaderboardParams>) -> Result<String, McpError> {
        params.validate().map_err(|msg| McpError::invalid_params(msg, None))?;

        let LeaderboardParams { team_id, group_id, records, display_names } = params;
        let unresolved: Vec<&str> = distinct_user_ids(&records)
            .into_iter()
            .filter(|id| !display_names.contains_key(*id))
            .collect();
        if !unresolved.is_empty() {
            warn!("Display names missing for {} users: {:?}", unresolved.len(), unresolved);
        }
        let names = DisplayNames::from(display_names);

        let rows = aggregate(&records, &names).map_err(|e| {
            warn!("Leaderboard failed for team {} group {}: {}", team_id, group_id, e);
            McpError::internal_error(e.to_string(), None)
        })?;
        debug!("Leaderboard for team {} group {}: {} rows from {} records", team_id, group_id, rows.len(), records.len());

        serde_json::to_string_pretty(&rows).map_err(|e| McpError::internal_error(e.to_string(), None))
    }

    #[tool(description = r#"
    Returns the current search coach configuration and optionally probes the search API.

    Returns
    -------
    str
        A JSON-encoded string containing:
        - `api_url`: The configured search API endpoint
        - `api_key`: The API key (masked, showing only first and last 4 characters)
        - `safe_search`: Safe search level sent with every query
        - `default_market`: Market used when no location filter is selected
        - `result_count`: Results requested per search
        - `allowed_markets` / `allowed_domains`: Filter allow-lists
        - `log_level`: Current logging level
        - `config_file`: Location of the optional persisted overrides
        - `connection_test`: Result of the probe query, when requested
    "#)]
    pub async fn get_config_info(&self, Parameters(params): Parameters<GetConfigInfoParams>) -> Result<String, McpError> {
        let connection_test = if params.probe {
            Some(self.client.test_connection().await)
        } else {
            None
        };

        let payload = serde_json::json!({
            "api_url": &self.config.api_url,
            "api_key": self.config.mask_api_key(),
            "safe_search": &self.config.safe_search,
            "default_market": &self.config.default_market,
            "result_count": self.config.result_count,
            "allowed_markets": self.config.filters.markets(),
            "allowed_domains": self.config.filters.domains(),
            "log_level": &self.config.log_level,
            "config_file": Config::config_file_path().to_string_lossy(),
            "connection_test": connection_test,
        });

        serde_json::to_string_pretty(&payload).map_err(|e| McpError::internal_error(e.to_string(), None))
    }
}

#[tool_handler(router = Self::tool_router())]
impl ServerHandler for SearchCoachServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "search-coach".into(),
                title: None,
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
