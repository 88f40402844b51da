//! # stars-sync
//!
//! The membership engine: ingestion of remote lists and stars, the unlisted
//! diff, the membership planner, the applier, and the scoring batch that
//! ties them together.

pub mod applier;
pub mod batch;
pub mod error;
pub mod escape_hatch;
pub mod ingest;
pub mod planner;
pub mod reconcile;

pub use applier::{Applier, ApplyReport};
pub use batch::{
    BatchItem, BatchOptions, BatchReport, BatchSummary, ItemOutcome, SCORED_FLAG, ScoringBatch,
    SkipReason, UNPARSED_FLAG,
};
pub use error::{ApplyError, SyncError};
pub use escape_hatch::BlockedLog;
pub use ingest::{ListSyncReport, StarSyncReport, sync_lists, sync_stars};
pub use planner::{LISTLESS_REASON, MembershipPlan, plan_membership};
pub use reconcile::{UnlistedReport, diff_unlisted, unlisted_stars};
