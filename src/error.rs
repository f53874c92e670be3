use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchCoachError {
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    #[error("Configuration invalid: {0}")]
    ConfigInvalid(String),

    #[error("Config file error at {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Search API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Max retries exceeded ({attempts} attempts): {last_error}")]
    MaxRetries { attempts: u32, last_error: String },

    /// `webPages.value` was present but did not deserialize as a list of web pages.
    #[error("Malformed search results: {0}")]
    MalformedResults(#[source] serde_json::Error),

    /// A response record referenced a user the display-name lookup did not resolve.
    #[error("No display name resolved for user {0}")]
    MissingDisplayName(String),
}

pub type Result<T> = std::result::Result<T, SearchCoachError>;
