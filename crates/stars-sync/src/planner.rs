//! Membership planning: turns per-list scores and current membership into
//! add, remove and review decisions. Pure; nothing here touches I/O.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use stars_core::entities::ListScore;
use stars_core::{FallbackRule, PlannerPolicy};

/// Reason attached to plans that would leave a repository in no list.
pub const LISTLESS_REASON: &str = "would become listless";

/// The decision for one repository. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MembershipPlan {
    pub add: BTreeSet<String>,
    pub remove: BTreeSet<String>,
    /// Close to the add bar; surfaced for a human, never applied.
    pub review: BTreeSet<String>,
    pub final_planned: BTreeSet<String>,
    pub changed: bool,
    pub blocked: bool,
    pub block_reason: Option<String>,
    pub fallback_used: bool,
    pub fallback_slug: Option<String>,
}

/// Plan membership for one repository.
///
/// Members without a score are kept. When the result would be empty the
/// fallback rule may promote the best review candidate; otherwise the plan
/// is blocked.
#[must_use]
pub fn plan_membership(
    current: &BTreeSet<String>,
    scores: &[ListScore],
    policy: &PlannerPolicy,
) -> MembershipPlan {
    let mut by_slug: BTreeMap<&str, f64> = BTreeMap::new();
    for score in scores {
        by_slug.entry(score.list_slug.as_str()).or_insert(score.score);
    }

    let add_bar = policy.default_add_threshold;
    let remove_bar = policy.remove_threshold();
    let review_floor = policy.review_floor();

    let mut plan = MembershipPlan::default();
    for (&slug, &score) in &by_slug {
        if current.contains(slug) {
            if score < remove_bar {
                plan.remove.insert(slug.to_string());
            }
        } else if score >= add_bar {
            plan.add.insert(slug.to_string());
        } else if score >= review_floor {
            plan.review.insert(slug.to_string());
        }
    }

    plan.final_planned = current
        .union(&plan.add)
        .filter(|slug| !plan.remove.contains(*slug))
        .cloned()
        .collect();

    if plan.final_planned.is_empty() {
        let candidate = match policy.fallback {
            FallbackRule::HighestReview => best_review(&plan.review, &by_slug),
            FallbackRule::Disabled => None,
        };
        if let Some(slug) = candidate {
            plan.review.remove(&slug);
            plan.add.insert(slug.clone());
            plan.final_planned.insert(slug.clone());
            plan.fallback_used = true;
            plan.fallback_slug = Some(slug);
        } else {
            plan.blocked = true;
            plan.block_reason = Some(LISTLESS_REASON.to_string());
        }
    }

    plan.changed = plan.final_planned != *current;
    plan
}

/// Highest-scoring review candidate; ties go to the smallest slug.
fn best_review(review: &BTreeSet<String>, scores: &BTreeMap<&str, f64>) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    // Ascending slug order, so a strict `>` keeps the smallest slug on ties.
    for slug in review {
        let Some(&score) = scores.get(slug.as_str()) else {
            continue;
        };
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((slug.as_str(), score));
        }
    }
    best.map(|(slug, _)| slug.to_string())
}
