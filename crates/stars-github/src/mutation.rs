//! Membership mutation and repository id lookup.

use serde::Deserialize;
use serde_json::json;

use crate::error::GithubError;
use crate::facts::decode;
use crate::queries::{REPOSITORY_ID, UPDATE_LISTS_FOR_ITEM};
use crate::transport::GraphQlTransport;

#[derive(Debug, Deserialize)]
struct IdNode {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UpdatePayload {
    #[serde(default)]
    lists: Vec<IdNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateData {
    update_user_lists_for_item: Option<UpdatePayload>,
}

#[derive(Debug, Deserialize)]
struct RepositoryData {
    repository: Option<IdNode>,
}

/// Set the lists containing `item_id` to exactly `list_ids`.
///
/// Returns the list ids the API echoed back.
///
/// # Errors
///
/// Transport, GraphQL and parse errors.
pub async fn update_lists_for_item<T: GraphQlTransport + ?Sized>(
    transport: &T,
    item_id: &str,
    list_ids: &[String],
) -> Result<Vec<String>, GithubError> {
    let data = transport
        .execute(
            UPDATE_LISTS_FOR_ITEM,
            json!({ "itemId": item_id, "listIds": list_ids }),
        )
        .await?;
    let payload: UpdateData = decode(data, "updateUserListsForItem")?;
    let echoed = payload
        .update_user_lists_for_item
        .ok_or_else(|| GithubError::Parse("updateUserListsForItem returned null".into()))?
        .lists
        .into_iter()
        .map(|node| node.id)
        .collect();
    Ok(echoed)
}

/// Look up a repository's global id. `None` if the repository does not exist.
///
/// # Errors
///
/// Transport, GraphQL (other than not-found) and parse errors.
pub async fn resolve_repository_id<T: GraphQlTransport + ?Sized>(
    transport: &T,
    owner: &str,
    name: &str,
) -> Result<Option<String>, GithubError> {
    let data = match transport
        .execute(REPOSITORY_ID, json!({ "owner": owner, "name": name }))
        .await
    {
        Ok(data) => data,
        Err(GithubError::NotFound(message)) => {
            tracing::debug!(owner, name, %message, "repository not found");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    let payload: RepositoryData = decode(data, "repository id")?;
    Ok(payload.repository.map(|node| node.id))
}
