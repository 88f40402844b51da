//! In-memory GraphQL transport for tests.
//!
//! `FakeGithub` answers the documents in `queries` from fixture data and
//! paginates with real cursors, so walkers exercise the same offset
//! arithmetic they use against the live API.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::GithubError;
use crate::transport::GraphQlTransport;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A repository node shaped like the API returns it.
#[must_use]
pub fn repo_node(id: Option<&str>, name_with_owner: &str) -> Value {
    json!({
        "id": id,
        "nameWithOwner": name_with_owner,
        "url": format!("https://github.com/{name_with_owner}"),
        "description": format!("{name_with_owner} description"),
        "stargazerCount": 1,
        "forkCount": 0,
        "isArchived": false,
        "isDisabled": false,
        "isFork": false,
        "isMirror": false,
        "hasIssuesEnabled": true,
        "repositoryTopics": { "nodes": [] }
    })
}

#[derive(Debug, Clone)]
pub struct FakeList {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub items: Vec<Value>,
}

impl FakeList {
    #[must_use]
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: Some(format!("{name} criteria")),
            is_private: false,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn items(mut self, items: Vec<Value>) -> Self {
        self.items = items;
        self
    }

    /// Edge cursor of the list at `index`.
    #[must_use]
    pub fn cursor(index: usize) -> String {
        format!("list-cursor-{index}")
    }
}

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    ListsPage { after: Option<String> },
    ItemsPage { list_after: Option<String>, items_after: Option<String> },
    StarredPage { after: Option<String> },
    UpdateLists { item_id: String, list_ids: Vec<String> },
    RepositoryId { owner: String, name: String },
}

#[derive(Debug, Default)]
pub struct FakeGithub {
    lists: Vec<FakeList>,
    stars: Vec<Value>,
    repository_ids: HashMap<String, String>,
    calls: Mutex<Vec<FakeCall>>,
    failures: Mutex<VecDeque<String>>,
    broken_end_cursor: Mutex<bool>,
    echo_override: Mutex<Option<Vec<String>>>,
}

fn str_var(variables: &Value, name: &str) -> Option<String> {
    variables.get(name).and_then(Value::as_str).map(str::to_string)
}

fn page_size(variables: &Value) -> usize {
    variables
        .get("first")
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(100)
}

/// Index after the one encoded in `cursor` (`prefix-N`), or 0.
fn start_after(cursor: Option<&str>, prefix: &str) -> Result<usize, GithubError> {
    match cursor {
        None => Ok(0),
        Some(c) => c
            .strip_prefix(prefix)
            .and_then(|n| n.parse::<usize>().ok())
            .map(|n| n + 1)
            .ok_or_else(|| GithubError::GraphQl(format!("invalid cursor {c}"))),
    }
}

impl FakeGithub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_list(mut self, list: FakeList) -> Self {
        self.lists.push(list);
        self
    }

    #[must_use]
    pub fn with_star(mut self, node: Value) -> Self {
        self.stars.push(node);
        self
    }

    /// Make `owner/name` resolvable by the repository id query.
    #[must_use]
    pub fn with_repository(mut self, name_with_owner: &str, id: &str) -> Self {
        self.repository_ids
            .insert(name_with_owner.to_string(), id.to_string());
        self
    }

    /// Fail the next request with a 502.
    pub fn fail_next(&self, message: &str) {
        lock(&self.failures).push_back(message.to_string());
    }

    /// Report `hasNextPage` without an `endCursor` on list pages.
    pub fn break_end_cursor(&self) {
        *lock(&self.broken_end_cursor) = true;
    }

    /// Echo this list set from the mutation instead of the one sent.
    pub fn echo_lists(&self, ids: Vec<String>) {
        *lock(&self.echo_override) = Some(ids);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<FakeCall> {
        lock(&self.calls).clone()
    }

    /// `(listAfter, itemsAfter)` of every items request, in order.
    #[must_use]
    pub fn item_calls(&self) -> Vec<(Option<String>, Option<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::ItemsPage {
                    list_after,
                    items_after,
                } => Some((list_after, items_after)),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn list_page_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, FakeCall::ListsPage { .. }))
            .count()
    }

    #[must_use]
    pub fn star_page_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, FakeCall::StarredPage { .. }))
            .count()
    }

    /// `(itemId, listIds)` of every membership mutation, in order.
    #[must_use]
    pub fn mutations(&self) -> Vec<(String, Vec<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::UpdateLists { item_id, list_ids } => Some((item_id, list_ids)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: FakeCall) {
        lock(&self.calls).push(call);
    }

    fn lists_page(&self, variables: &Value) -> Result<Value, GithubError> {
        let after = str_var(variables, "after");
        self.record(FakeCall::ListsPage {
            after: after.clone(),
        });
        let start = start_after(after.as_deref(), "list-cursor-")?;
        let end = (start + page_size(variables)).min(self.lists.len());
        let start = start.min(end);

        let edges: Vec<Value> = (start..end)
            .map(|i| {
                let list = &self.lists[i];
                json!({
                    "cursor": FakeList::cursor(i),
                    "node": {
                        "id": list.id,
                        "name": list.name,
                        "description": list.description,
                        "isPrivate": list.is_private,
                    }
                })
            })
            .collect();
        let has_next = end < self.lists.len();
        let end_cursor = if *lock(&self.broken_end_cursor) || end == start {
            None
        } else {
            Some(FakeList::cursor(end - 1))
        };

        Ok(json!({
            "viewer": { "lists": {
                "pageInfo": { "endCursor": end_cursor, "hasNextPage": has_next },
                "edges": edges,
            } }
        }))
    }

    fn items_page(&self, variables: &Value) -> Result<Value, GithubError> {
        let list_after = str_var(variables, "listAfter");
        let items_after = str_var(variables, "itemsAfter");
        self.record(FakeCall::ItemsPage {
            list_after: list_after.clone(),
            items_after: items_after.clone(),
        });

        let index = start_after(list_after.as_deref(), "list-cursor-")?;
        let Some(list) = self.lists.get(index) else {
            return Ok(json!({ "viewer": { "lists": { "nodes": [] } } }));
        };

        let start = start_after(items_after.as_deref(), "item-cursor-")?;
        let end = (start + page_size(variables)).min(list.items.len());
        let start = start.min(end);
        let has_next = end < list.items.len();
        let end_cursor = (end > start).then(|| format!("item-cursor-{}", end - 1));

        Ok(json!({
            "viewer": { "lists": { "nodes": [{
                "id": list.id,
                "items": {
                    "pageInfo": { "endCursor": end_cursor, "hasNextPage": has_next },
                    "nodes": list.items[start..end].to_vec(),
                }
            }] } }
        }))
    }

    fn starred_page(&self, variables: &Value) -> Result<Value, GithubError> {
        let after = str_var(variables, "after");
        self.record(FakeCall::StarredPage {
            after: after.clone(),
        });
        let start = start_after(after.as_deref(), "star-cursor-")?;
        let end = (start + page_size(variables)).min(self.stars.len());
        let start = start.min(end);
        let has_next = end < self.stars.len();
        let end_cursor = (end > start).then(|| format!("star-cursor-{}", end - 1));
        let edges: Vec<Value> = self.stars[start..end]
            .iter()
            .map(|node| json!({ "node": node }))
            .collect();

        Ok(json!({
            "viewer": { "starredRepositories": {
                "pageInfo": { "endCursor": end_cursor, "hasNextPage": has_next },
                "edges": edges,
            } }
        }))
    }

    fn update_lists(&self, variables: &Value) -> Value {
        let item_id = str_var(variables, "itemId").unwrap_or_default();
        let list_ids: Vec<String> = variables
            .get("listIds")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        self.record(FakeCall::UpdateLists {
            item_id,
            list_ids: list_ids.clone(),
        });

        let echoed = lock(&self.echo_override).clone().unwrap_or(list_ids);
        let lists: Vec<Value> = echoed.iter().map(|id| json!({ "id": id })).collect();
        json!({ "updateUserListsForItem": { "lists": lists } })
    }

    fn repository_id(&self, variables: &Value) -> Result<Value, GithubError> {
        let owner = str_var(variables, "owner").unwrap_or_default();
        let name = str_var(variables, "name").unwrap_or_default();
        self.record(FakeCall::RepositoryId {
            owner: owner.clone(),
            name: name.clone(),
        });
        let key = format!("{owner}/{name}");
        self.repository_ids.get(&key).map_or_else(
            || {
                Err(GithubError::NotFound(format!(
                    "Could not resolve to a Repository with the name '{key}'."
                )))
            },
            |id| Ok(json!({ "repository": { "id": id } })),
        )
    }
}

#[async_trait]
impl GraphQlTransport for FakeGithub {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, GithubError> {
        if let Some(message) = lock(&self.failures).pop_front() {
            return Err(GithubError::Api {
                status: 502,
                message,
            });
        }

        if query.contains("updateUserListsForItem") {
            Ok(self.update_lists(&variables))
        } else if query.contains("starredRepositories") {
            self.starred_page(&variables)
        } else if query.contains("items(") {
            self.items_page(&variables)
        } else if query.contains("repository(owner") {
            self.repository_id(&variables)
        } else if query.contains("lists(") {
            self.lists_page(&variables)
        } else {
            Err(GithubError::GraphQl(format!("unexpected document: {query}")))
        }
    }
}
