//! GraphQL documents.
//!
//! Every document that returns repositories selects the same field set so
//! they all decode into `facts::WireRepository`.

/// Fields selected for every repository node.
macro_rules! repo_fields {
    () => {
        "id
        nameWithOwner
        url
        description
        homepageUrl
        stargazerCount
        forkCount
        watchers { totalCount }
        issues(states: OPEN) { totalCount }
        pullRequests(states: OPEN) { totalCount }
        defaultBranchRef { name target { ... on Commit { committedDate } } }
        primaryLanguage { name }
        licenseInfo { spdxId name }
        isArchived
        isDisabled
        isFork
        isMirror
        hasIssuesEnabled
        pushedAt
        updatedAt
        createdAt
        diskUsage
        repositoryTopics(first: 20) { nodes { topic { name } } }"
    };
}

/// One page of the viewer's list edges.
pub const LISTS_PAGE: &str = "query ListsPage($first: Int!, $after: String) {
  viewer {
    lists(first: $first, after: $after) {
      pageInfo { endCursor hasNextPage }
      edges { cursor node { id name description isPrivate } }
    }
  }
}";

/// One page of items for the single list that follows `$listAfter`.
pub const LIST_ITEMS_PAGE: &str = concat!(
    "query ListItemsPage($listAfter: String, $first: Int!, $itemsAfter: String) {
  viewer {
    lists(first: 1, after: $listAfter) {
      nodes {
        id
        items(first: $first, after: $itemsAfter) {
          pageInfo { endCursor hasNextPage }
          nodes { ... on Repository { ",
    repo_fields!(),
    " } }
        }
      }
    }
  }
}"
);

/// One page of starred repositories, most recently starred first.
pub const STARRED_PAGE: &str = concat!(
    "query StarredPage($first: Int!, $after: String) {
  viewer {
    starredRepositories(first: $first, after: $after, orderBy: { field: STARRED_AT, direction: DESC }) {
      pageInfo { endCursor hasNextPage }
      edges { node { ",
    repo_fields!(),
    " } }
    }
  }
}"
);

/// Replace the full list set of one item.
pub const UPDATE_LISTS_FOR_ITEM: &str = "mutation UpdateListsForItem($itemId: ID!, $listIds: [ID!]!) {
  updateUserListsForItem(input: { itemId: $itemId, listIds: $listIds }) {
    lists { id }
  }
}";

/// Resolve a repository's global id from owner and name.
pub const REPOSITORY_ID: &str = "query RepositoryId($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) { id }
}";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_documents_share_fields() {
        for doc in [LIST_ITEMS_PAGE, STARRED_PAGE] {
            assert!(doc.contains("nameWithOwner"));
            assert!(doc.contains("repositoryTopics(first: 20)"));
            assert!(doc.contains("pageInfo { endCursor hasNextPage }"));
        }
    }

    #[test]
    fn item_query_offsets_by_list_cursor() {
        assert!(LIST_ITEMS_PAGE.contains("lists(first: 1, after: $listAfter)"));
        assert!(LIST_ITEMS_PAGE.contains("items(first: $first, after: $itemsAfter)"));
    }
}
