use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetConfigInfoParams {
    /// Send a one-result probe query to the search API (default true)
    #[serde(default = "default_probe")]
    pub probe: bool,
}

fn default_probe() -> bool { true }

impl Default for GetConfigInfoParams {
    fn default() -> Self {
        Self { probe: default_probe() }
    }
}
