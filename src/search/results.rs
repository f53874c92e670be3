use crate::error::{Result, SearchCoachError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of `webPages.value`. Known fields are typed; the rest ride along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_last_crawled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_family_friendly: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Extracts `webPages.value` from a provider envelope.
///
/// A missing (or null) section is an empty result. A present section that does not
/// deserialize fails the whole call; nothing is returned partially.
pub fn adapt(raw: &str) -> Result<Vec<WebPage>> {
    let envelope: Value = serde_json::from_str(raw)?;

    let section = envelope
        .get("webPages")
        .and_then(|pages| pages.get("value"))
        .filter(|value| !value.is_null());

    let Some(section) = section else {
        tracing::info!("Search webpages results are not available");
        return Ok(Vec::new());
    };

    Vec::<WebPage>::deserialize(section).map_err(SearchCoachError::MalformedResults)
}
