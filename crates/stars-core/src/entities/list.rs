use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A curated list of starred repositories.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StarList {
    pub id: i64,
    pub remote_id: Option<String>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_private: bool,
}

impl StarList {
    #[must_use]
    pub fn definition(&self) -> ListDefinition {
        ListDefinition {
            slug: self.slug.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// The part of a list the scorer sees: its acceptance criteria.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ListDefinition {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
}
