use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A (list, repository) membership pair. Existence means "is a member".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MembershipEdge {
    pub list_id: i64,
    pub repo_id: i64,
}
