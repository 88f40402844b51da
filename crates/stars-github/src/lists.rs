//! Walks the viewer's lists and the items inside each one.
//!
//! Two cursors are tracked explicitly. The outer cursor pages through list
//! edges. The preceding edge cursor is the edge cursor of the last list
//! yielded; it is the `listAfter` used to address the *next* list when
//! fetching its items (`lists(first: 1, after: listAfter)`). Using a list's
//! own edge cursor there would address the list after it.

use std::collections::VecDeque;

use serde::Deserialize;
use serde_json::json;
use stars_core::entities::RepoFacts;

use crate::error::GithubError;
use crate::facts::{PageInfo, WireRepository, decode};
use crate::queries::{LIST_ITEMS_PAGE, LISTS_PAGE};
use crate::transport::GraphQlTransport;

/// A list with every item it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteList {
    pub remote_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
    /// Repository items only; other item kinds are dropped.
    pub items: Vec<RepoFacts>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListNode {
    id: String,
    name: String,
    description: Option<String>,
    #[serde(default)]
    is_private: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ListEdge {
    cursor: String,
    node: ListNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListConnection {
    page_info: PageInfo,
    #[serde(default)]
    edges: Vec<ListEdge>,
}

#[derive(Debug, Deserialize)]
struct ListsViewer {
    lists: ListConnection,
}

#[derive(Debug, Deserialize)]
struct ListsData {
    viewer: ListsViewer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemConnection {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<Option<WireRepository>>,
}

#[derive(Debug, Deserialize)]
struct ItemsListNode {
    id: String,
    items: ItemConnection,
}

#[derive(Debug, Deserialize)]
struct ItemsLists {
    #[serde(default)]
    nodes: Vec<ItemsListNode>,
}

#[derive(Debug, Deserialize)]
struct ItemsViewer {
    lists: ItemsLists,
}

#[derive(Debug, Deserialize)]
struct ItemsData {
    viewer: ItemsViewer,
}

/// Fetch every item of the list addressed by `list_after`.
///
/// `list_after` is the edge cursor *preceding* the target list (`None` for
/// the first list). `expected_list_id` guards against a shifted offset.
///
/// # Errors
///
/// Transport errors are returned as-is. An offset that lands on a different
/// list, or on no list, is a [`GithubError::Parse`].
pub async fn fetch_list_items<T: GraphQlTransport + ?Sized>(
    transport: &T,
    list_after: Option<&str>,
    expected_list_id: &str,
    page_size: u32,
) -> Result<Vec<RepoFacts>, GithubError> {
    let mut items = Vec::new();
    let mut items_after: Option<String> = None;

    loop {
        let data = transport
            .execute(
                LIST_ITEMS_PAGE,
                json!({
                    "listAfter": list_after,
                    "first": page_size,
                    "itemsAfter": items_after,
                }),
            )
            .await?;
        let page: ItemsData = decode(data, "list items page")?;
        let list = page.viewer.lists.nodes.into_iter().next().ok_or_else(|| {
            GithubError::Parse(format!("no list after cursor {list_after:?}"))
        })?;
        if list.id != expected_list_id {
            return Err(GithubError::Parse(format!(
                "cursor {list_after:?} addressed list {} instead of {expected_list_id}",
                list.id
            )));
        }

        let before = items.len();
        items.extend(
            list.items
                .nodes
                .into_iter()
                .flatten()
                .filter_map(WireRepository::into_facts),
        );
        tracing::debug!(
            list = expected_list_id,
            page_items = items.len() - before,
            "list items page"
        );

        match list.items.page_info.next_cursor("list items page")? {
            Some(cursor) => items_after = Some(cursor),
            None => return Ok(items),
        }
    }
}

/// Pull-based walk over every list and its items.
///
/// Restart by constructing a new walker. A failed call leaves the walker
/// where it was, so the same list is attempted again on the next call and no
/// list is ever yielded twice or partially.
pub struct ListWalker<'a, T: GraphQlTransport + ?Sized> {
    transport: &'a T,
    lists_page_size: u32,
    items_page_size: u32,
    /// Edges fetched but not yet yielded.
    pending: VecDeque<ListEdge>,
    /// `endCursor` of the last list-edge page.
    outer_cursor: Option<String>,
    outer_has_next: bool,
    /// Edge cursor of the last list yielded; `None` before the first.
    preceding_edge_cursor: Option<String>,
}

impl<'a, T: GraphQlTransport + ?Sized> ListWalker<'a, T> {
    pub fn new(transport: &'a T, lists_page_size: u32, items_page_size: u32) -> Self {
        Self {
            transport,
            lists_page_size,
            items_page_size,
            pending: VecDeque::new(),
            outer_cursor: None,
            outer_has_next: true,
            preceding_edge_cursor: None,
        }
    }

    /// Fetch the next page of list edges into `pending`.
    async fn fill(&mut self) -> Result<(), GithubError> {
        let data = self
            .transport
            .execute(
                LISTS_PAGE,
                json!({ "first": self.lists_page_size, "after": self.outer_cursor }),
            )
            .await?;
        let page: ListsData = decode(data, "lists page")?;
        let connection = page.viewer.lists;
        let next = connection.page_info.next_cursor("lists page")?;

        tracing::debug!(edges = connection.edges.len(), has_next = next.is_some(), "lists page");
        if connection.edges.is_empty() {
            self.outer_has_next = false;
            return Ok(());
        }
        self.outer_has_next = next.is_some();
        if next.is_some() {
            self.outer_cursor = next;
        }
        self.pending.extend(connection.edges);
        Ok(())
    }

    /// The next list with all of its items, or `None` when exhausted.
    ///
    /// # Errors
    ///
    /// Transport and parse errors are surfaced without retry.
    pub async fn next(&mut self) -> Result<Option<RemoteList>, GithubError> {
        if self.pending.is_empty() {
            if !self.outer_has_next {
                return Ok(None);
            }
            self.fill().await?;
        }
        let Some(edge) = self.pending.front() else {
            return Ok(None);
        };

        let items = fetch_list_items(
            self.transport,
            self.preceding_edge_cursor.as_deref(),
            &edge.node.id,
            self.items_page_size,
        )
        .await?;

        let Some(edge) = self.pending.pop_front() else {
            return Ok(None);
        };
        tracing::info!(list = %edge.node.name, items = items.len(), "list fetched");
        self.preceding_edge_cursor = Some(edge.cursor);

        Ok(Some(RemoteList {
            remote_id: edge.node.id,
            name: edge.node.name,
            description: edge.node.description.filter(|d| !d.is_empty()),
            is_private: edge.node.is_private,
            items,
        }))
    }

    /// Drain the walker.
    ///
    /// # Errors
    ///
    /// Stops at the first error.
    pub async fn collect_all(mut self) -> Result<Vec<RemoteList>, GithubError> {
        let mut lists = Vec::new();
        while let Some(list) = self.next().await? {
            lists.push(list);
        }
        Ok(lists)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mock::{FakeGithub, FakeList, repo_node};

    fn three_lists() -> FakeGithub {
        FakeGithub::new()
            .with_list(FakeList::new("UL_a", "Alpha").items(vec![
                repo_node(Some("R1"), "o/r1"),
                repo_node(Some("R2"), "o/r2"),
            ]))
            .with_list(FakeList::new("UL_b", "Beta").items(vec![repo_node(Some("R3"), "o/r3")]))
            .with_list(FakeList::new("UL_c", "Gamma").items(vec![
                repo_node(Some("R4"), "o/r4"),
                serde_json::json!({}),
                repo_node(Some("R5"), "o/r5"),
            ]))
    }

    fn names(lists: &[RemoteList]) -> Vec<(&str, Vec<&str>)> {
        lists
            .iter()
            .map(|l| {
                (
                    l.name.as_str(),
                    l.items.iter().map(|i| i.name_with_owner.as_str()).collect(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn each_list_gets_its_own_items() {
        let fake = three_lists();
        let lists = ListWalker::new(&fake, 2, 1).collect_all().await.unwrap();

        assert_eq!(
            names(&lists),
            vec![
                ("Alpha", vec!["o/r1", "o/r2"]),
                ("Beta", vec!["o/r3"]),
                ("Gamma", vec!["o/r4", "o/r5"]),
            ]
        );
    }

    #[tokio::test]
    async fn items_are_addressed_by_preceding_cursor() {
        let fake = three_lists();
        ListWalker::new(&fake, 10, 100).collect_all().await.unwrap();

        let offsets: Vec<Option<String>> = fake.item_calls().into_iter().map(|c| c.0).collect();
        assert_eq!(
            offsets,
            vec![None, Some(FakeList::cursor(0)), Some(FakeList::cursor(1))]
        );
    }

    #[tokio::test]
    async fn outer_pages_in_order_and_terminates() {
        let fake = three_lists();
        let mut walker = ListWalker::new(&fake, 1, 100);
        let mut seen = Vec::new();
        while let Some(list) = walker.next().await.unwrap() {
            seen.push(list.remote_id);
        }
        assert_eq!(seen, vec!["UL_a", "UL_b", "UL_c"]);
        assert!(walker.next().await.unwrap().is_none());
        assert_eq!(fake.list_page_calls(), 3);
    }

    #[tokio::test]
    async fn failure_does_not_advance() {
        let fake = three_lists();
        let mut walker = ListWalker::new(&fake, 10, 100);
        assert_eq!(walker.next().await.unwrap().unwrap().remote_id, "UL_a");

        fake.fail_next("boom");
        assert!(walker.next().await.is_err());

        assert_eq!(walker.next().await.unwrap().unwrap().remote_id, "UL_b");
        assert_eq!(walker.next().await.unwrap().unwrap().remote_id, "UL_c");
        assert!(walker.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_account_yields_nothing() {
        let fake = FakeGithub::new();
        assert!(ListWalker::new(&fake, 10, 10).collect_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_end_cursor_is_parse_error() {
        let fake = three_lists();
        fake.break_end_cursor();
        let err = ListWalker::new(&fake, 1, 10).next().await.unwrap_err();
        assert!(matches!(err, GithubError::Parse(_)));
    }
}
