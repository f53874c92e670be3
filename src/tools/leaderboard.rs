use crate::leaderboard::UserResponseRecord;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LeaderboardParams {
    /// Team the leaderboard belongs to
    pub team_id: String,

    /// Group (channel) within the team
    pub group_id: String,

    /// Response records fetched for the team
    #[serde(default)]
    pub records: Vec<UserResponseRecord>,

    /// Display names keyed by user id, covering every user in `records`
    #[serde(default)]
    pub display_names: HashMap<String, String>,
}

impl LeaderboardParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.team_id.trim().is_empty() {
            return Err("Team id can not be null or empty.".into());
        }
        if self.group_id.trim().is_empty() {
            return Err("Group id can not be null or empty.".into());
        }
        Ok(())
    }
}
