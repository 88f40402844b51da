//! Walks the viewer's starred repositories one page at a time.

use serde::Deserialize;
use serde_json::json;
use stars_core::CancelSignal;
use stars_core::entities::RepoFacts;

use crate::error::GithubError;
use crate::facts::{PageInfo, WireRepository, decode};
use crate::queries::STARRED_PAGE;
use crate::transport::GraphQlTransport;

#[derive(Debug, Deserialize)]
struct StarEdge {
    node: Option<WireRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StarConnection {
    page_info: PageInfo,
    #[serde(default)]
    edges: Vec<StarEdge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StarViewer {
    starred_repositories: StarConnection,
}

#[derive(Debug, Deserialize)]
struct StarData {
    viewer: StarViewer,
}

pub struct StarWalker<'a, T: GraphQlTransport + ?Sized> {
    transport: &'a T,
    page_size: u32,
    cursor: Option<String>,
    done: bool,
    cancel: Option<CancelSignal>,
}

impl<'a, T: GraphQlTransport + ?Sized> StarWalker<'a, T> {
    pub const fn new(transport: &'a T, page_size: u32) -> Self {
        Self {
            transport,
            page_size,
            cursor: None,
            done: false,
            cancel: None,
        }
    }

    /// Observe `signal` before every page fetch.
    #[must_use]
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// The next page of starred repositories, or `None` when exhausted.
    ///
    /// Entities the API returned without a global id are kept with
    /// `remote_id: None`.
    ///
    /// # Errors
    ///
    /// [`GithubError::Cancelled`] if the signal fired since the last page;
    /// transport and parse errors otherwise. The cursor does not move on
    /// error.
    pub async fn next_page(&mut self) -> Result<Option<Vec<RepoFacts>>, GithubError> {
        if self.done {
            return Ok(None);
        }
        if self.cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
            tracing::info!("starred walk cancelled");
            return Err(GithubError::Cancelled);
        }

        let data = self
            .transport
            .execute(
                STARRED_PAGE,
                json!({ "first": self.page_size, "after": self.cursor }),
            )
            .await?;
        let page: StarData = decode(data, "starred page")?;
        let connection = page.viewer.starred_repositories;
        let next = connection.page_info.next_cursor("starred page")?;

        if connection.edges.is_empty() {
            self.done = true;
            return Ok(None);
        }

        let facts: Vec<RepoFacts> = connection
            .edges
            .into_iter()
            .filter_map(|edge| edge.node)
            .filter_map(WireRepository::into_facts)
            .collect();
        tracing::debug!(repos = facts.len(), has_next = next.is_some(), "starred page");

        match next {
            Some(cursor) => self.cursor = Some(cursor),
            None => self.done = true,
        }
        Ok(Some(facts))
    }

    /// Drain every page into one vector.
    ///
    /// # Errors
    ///
    /// Stops at the first error, including cancellation.
    pub async fn collect_all(mut self) -> Result<Vec<RepoFacts>, GithubError> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mock::{FakeGithub, repo_node};

    fn five_stars() -> FakeGithub {
        (1..=5).fold(FakeGithub::new(), |fake, i| {
            fake.with_star(repo_node(Some(&format!("R{i}")), &format!("o/r{i}")))
        })
    }

    #[tokio::test]
    async fn pages_in_order_until_exhausted() {
        let fake = five_stars();
        let mut walker = StarWalker::new(&fake, 2);

        let mut pages = Vec::new();
        while let Some(page) = walker.next_page().await.unwrap() {
            pages.push(
                page.into_iter()
                    .map(|f| f.name_with_owner)
                    .collect::<Vec<_>>(),
            );
        }
        assert_eq!(
            pages,
            vec![
                vec!["o/r1", "o/r2"],
                vec!["o/r3", "o/r4"],
                vec!["o/r5"]
            ]
        );
        assert_eq!(fake.star_page_calls(), 3);
        assert!(walker.next_page().await.unwrap().is_none());
        assert_eq!(fake.star_page_calls(), 3);
    }

    #[tokio::test]
    async fn id_less_entities_are_kept_without_id() {
        let fake = FakeGithub::new()
            .with_star(repo_node(Some("R1"), "o/r1"))
            .with_star(repo_node(None, "o/anon"));
        let all = StarWalker::new(&fake, 10).collect_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].remote_id, None);
    }

    #[tokio::test]
    async fn cancellation_is_observed_between_pages() {
        let fake = five_stars();
        let signal = CancelSignal::new();
        let mut walker = StarWalker::new(&fake, 2).with_cancel(signal.clone());

        assert_eq!(walker.next_page().await.unwrap().unwrap().len(), 2);
        signal.cancel();
        let err = walker.next_page().await.unwrap_err();
        assert!(matches!(err, GithubError::Cancelled));
        assert_eq!(fake.star_page_calls(), 1);
    }

    #[tokio::test]
    async fn transport_error_keeps_cursor() {
        let fake = five_stars();
        let mut walker = StarWalker::new(&fake, 2);
        walker.next_page().await.unwrap();

        fake.fail_next("upstream");
        assert!(matches!(
            walker.next_page().await,
            Err(GithubError::Api { status: 502, .. })
        ));

        let page = walker.next_page().await.unwrap().unwrap();
        assert_eq!(page[0].name_with_owner, "o/r3");
    }
}
