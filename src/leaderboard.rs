use crate::error::{Result, SearchCoachError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One answered or attempted question, as read from the response store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponseRecord {
    pub user_id: String,
    #[serde(default)]
    pub is_correct_answer: bool,
    #[serde(default)]
    pub is_question_attempted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub user_name: String,
    pub right_answers: u32,
    pub questions_attempted: u32,
}

/// Resolved display names keyed by user id. Lookups of unknown ids are errors.
#[derive(Debug, Clone, Default)]
pub struct DisplayNames(HashMap<String, String>);

impl DisplayNames {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self(names)
    }

    pub fn resolve(&self, user_id: &str) -> Result<&str> {
        self.0
            .get(user_id)
            .map(String::as_str)
            .ok_or_else(|| SearchCoachError::MissingDisplayName(user_id.to_string()))
    }
}

impl From<HashMap<String, String>> for DisplayNames {
    fn from(names: HashMap<String, String>) -> Self {
        Self::new(names)
    }
}

/// Distinct user ids in first-seen order; the set the name lookup has to cover.
pub fn distinct_user_ids(records: &[UserResponseRecord]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for record in records {
        if seen.insert(record.user_id.as_str()) {
            ids.push(record.user_id.as_str());
        }
    }
    ids
}

/// Folds response records into one row per user, in first-seen order.
///
/// `right_answers` and `questions_attempted` are counted independently over the same
/// group, so a correct answer on an unattempted record still counts as right.
pub fn aggregate(records: &[UserResponseRecord], names: &DisplayNames) -> Result<Vec<LeaderboardRow>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut tallies: Vec<(&str, u32, u32)> = Vec::new();

    for record in records {
        let slot = *index.entry(record.user_id.as_str()).or_insert_with(|| {
            tallies.push((record.user_id.as_str(), 0, 0));
            tallies.len() - 1
        });
        let tally = &mut tallies[slot];
        if record.is_correct_answer {
            tally.1 += 1;
        }
        if record.is_question_attempted {
            tally.2 += 1;
        }
    }

    tallies
        .into_iter()
        .map(|(user_id, right_answers, questions_attempted)| -> Result<LeaderboardRow> {
            Ok(LeaderboardRow {
                user_name: names.resolve(user_id)?.to_string(),
                right_answers,
                questions_attempted,
            })
        })
        .collect()
}
