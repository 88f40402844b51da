use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A model's judgement of one repository against one list.
///
/// Scores are independent per list, not a probability distribution.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ListScore {
    pub list_slug: String,
    /// In `[0, 1]`.
    pub score: f64,
    pub rationale: Option<String>,
}

impl ListScore {
    #[must_use]
    pub fn new(list_slug: impl Into<String>, score: f64) -> Self {
        Self {
            list_slug: list_slug.into(),
            score,
            rationale: None,
        }
    }
}

/// A persisted score, only ever written inside a scoring run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ScoreRecord {
    pub run_id: String,
    pub repo_id: i64,
    pub list_slug: String,
    pub score: f64,
    pub rationale: Option<String>,
    pub created_at: DateTime<Utc>,
}
