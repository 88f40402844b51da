//! Pushes an approved plan to the remote account and mirrors it locally.

use std::collections::BTreeSet;

use serde::Serialize;
use stars_core::entities::Repository;
use stars_db::{Catalogue, ReconcileReport};
use stars_github::GraphQlTransport;
use stars_github::mutation::{resolve_repository_id, update_lists_for_item};

use crate::error::ApplyError;
use crate::planner::MembershipPlan;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub remote_id: String,
    /// Remote list ids sent with the mutation.
    pub list_ids: Vec<String>,
    /// The mutation echoed a different list set than was sent.
    pub echo_mismatch: bool,
    pub local: ReconcileReport,
}

pub struct Applier<'a, T: GraphQlTransport + ?Sized> {
    transport: &'a T,
    catalogue: &'a Catalogue,
}

impl<'a, T: GraphQlTransport + ?Sized> Applier<'a, T> {
    pub const fn new(transport: &'a T, catalogue: &'a Catalogue) -> Self {
        Self {
            transport,
            catalogue,
        }
    }

    /// Resolve the repository's remote id, looking it up and persisting it
    /// when the catalogue does not have one yet.
    async fn remote_id(&self, repo: &Repository) -> Result<String, ApplyError> {
        if let Some(id) = &repo.facts.remote_id {
            return Ok(id.clone());
        }
        let name = &repo.facts.name_with_owner;
        let (owner, short) = repo
            .facts
            .owner_and_name()
            .ok_or_else(|| ApplyError::UnknownRepository(name.clone()))?;
        let id = resolve_repository_id(self.transport, owner, short)
            .await?
            .ok_or_else(|| ApplyError::UnknownRepository(name.clone()))?;

        self.catalogue.set_repository_remote_id(repo.id, &id).await?;
        tracing::debug!(repo = %name, remote_id = %id, "remote id resolved");
        Ok(id)
    }

    /// Remote list ids for every planned slug, in slug order.
    async fn list_ids(&self, plan: &MembershipPlan) -> Result<Vec<String>, ApplyError> {
        let slugs: Vec<String> = plan.final_planned.iter().cloned().collect();
        let resolved = self.catalogue.remote_ids_for_slugs(&slugs).await?;

        let mut ids = Vec::with_capacity(slugs.len());
        let mut missing = Vec::new();
        for (slug, remote_id) in resolved {
            match remote_id {
                Some(id) => ids.push(id),
                None => missing.push(slug),
            }
        }
        if !missing.is_empty() {
            return Err(ApplyError::UnresolvedList(missing));
        }
        Ok(ids)
    }

    /// Apply `plan` to `repo`.
    ///
    /// # Errors
    ///
    /// Blocked plans are refused before any call. Each later step (id
    /// resolution, list mapping, remote mutation, local reconcile) fails
    /// independently; a failed local reconcile is rolled back.
    pub async fn apply(
        &self,
        repo: &Repository,
        plan: &MembershipPlan,
    ) -> Result<ApplyReport, ApplyError> {
        if plan.blocked {
            return Err(ApplyError::Blocked(
                plan.block_reason.clone().unwrap_or_default(),
            ));
        }

        let remote_id = self.remote_id(repo).await?;
        let list_ids = self.list_ids(plan).await?;

        let echoed = update_lists_for_item(self.transport, &remote_id, &list_ids).await?;
        let sent: BTreeSet<&str> = list_ids.iter().map(String::as_str).collect();
        let got: BTreeSet<&str> = echoed.iter().map(String::as_str).collect();
        let echo_mismatch = sent != got;
        if echo_mismatch {
            tracing::warn!(
                repo = %repo.facts.name_with_owner,
                ?sent,
                ?got,
                "membership mutation echoed a different list set"
            );
        }

        let local = self
            .catalogue
            .reconcile_membership(repo.id, &plan.final_planned)
            .await?;
        tracing::info!(
            repo = %repo.facts.name_with_owner,
            lists = list_ids.len(),
            inserted = local.inserted,
            deleted = local.deleted,
            "membership applied"
        );

        Ok(ApplyReport {
            remote_id,
            list_ids,
            echo_mismatch,
            local,
        })
    }
}
