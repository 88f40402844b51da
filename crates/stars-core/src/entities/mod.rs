//! Entity structs for all Starline domain objects.
//!
//! Each entity maps to a table in the libSQL catalogue (`list`, `repo`,
//! `list_repo`, `repo_list_score`, `scoring_run`, `runs`).

mod list;
mod membership;
mod repository;
mod run;
mod score;

pub use list::{ListDefinition, StarList};
pub use membership::MembershipEdge;
pub use repository::{RepoFacts, RepoFlags, RepoMetrics, RepoSignals, Repository};
pub use run::{RunEntry, ScoringRun};
pub use score::{ListScore, ScoreRecord};
