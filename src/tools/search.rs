use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebSearchParams {
    /// Text the student typed into the search box (max 2000 characters)
    pub search_text: String,

    /// Locale code such as "en-US", or "nf" for no location filter
    #[serde(default = "default_country")]
    pub selected_country: String,

    /// Recency filter: "1"/"any", "2"/"day", "3"/"week", "4"/"month"
    #[serde(default)]
    pub freshness: Option<String>,

    /// Domain suffixes separated by ';' (e.g. ".edu;.gov")
    #[serde(default)]
    pub domain_values: Option<String>,
}

fn default_country() -> String { "nf".into() }

impl WebSearchParams {
    /// Shape checks only; allow-list checks happen against the configured filter policy.
    pub fn validate(&self) -> Result<(), String> {
        if self.search_text.trim().len() > 2000 {
            return Err("Search text exceeds 2000 characters".into());
        }
        if self.selected_country.trim().is_empty() {
            return Err("Selected country code value is null or empty or invalid.".into());
        }
        Ok(())
    }
}
