//! Error types for planning, applying and batch scoring.

use stars_db::DatabaseError;
use stars_github::GithubError;
use stars_llm::LlmError;
use thiserror::Error;

/// A failed step of applying one membership plan.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The plan would leave the repository in no list.
    #[error("plan is blocked: {0}")]
    Blocked(String),

    /// The repository has no remote id and none could be resolved.
    #[error("unknown repository: {0}")]
    UnknownRepository(String),

    /// Some planned lists have no remote id.
    #[error("unresolved lists: {}", .0.join(", "))]
    UnresolvedList(Vec<String>),

    #[error(transparent)]
    Remote(#[from] GithubError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Github(GithubError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// Writing the blocked-repository CSV failed.
    #[error("escape hatch: {0}")]
    EscapeHatch(String),

    /// The requested operation cannot run with the current configuration.
    #[error("configuration: {0}")]
    Config(String),

    /// A repository named on the command line is not in the catalogue.
    #[error("not in catalogue: {0}")]
    NotFound(String),

    /// A cancellation signal was observed; no partial result is returned.
    #[error("cancelled")]
    Cancelled,
}

impl From<GithubError> for SyncError {
    fn from(error: GithubError) -> Self {
        match error {
            GithubError::Cancelled => Self::Cancelled,
            other => Self::Github(other),
        }
    }
}

impl From<csv::Error> for SyncError {
    fn from(error: csv::Error) -> Self {
        Self::EscapeHatch(error.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(error: std::io::Error) -> Self {
        Self::EscapeHatch(error.to_string())
    }
}
