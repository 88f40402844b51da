use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One append-only ledger row. Absence of a row for `(subject, row_id, flag)`
/// is the canonical "not done" state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RunEntry {
    pub id: i64,
    /// Table the operation applied to (`repo`, `list`, ...).
    pub subject: String,
    pub row_id: Option<i64>,
    pub flag: String,
    pub run_at: DateTime<Utc>,
    pub meta: Option<serde_json::Value>,
}

/// Parent row for the score records of one non-dry scoring batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ScoringRun {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub model: Option<String>,
    pub policy: Option<serde_json::Value>,
}
