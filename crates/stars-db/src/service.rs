//! The catalogue handle.
//!
//! `Catalogue` wraps `StarsDb`. Every query lives in an `impl Catalogue`
//! block under `repos/`, one file per table family.

use crate::StarsDb;
use crate::error::DatabaseError;

/// Explicit handle to the local catalogue. There is no global connection;
/// callers pass `&Catalogue` to whatever needs it.
pub struct Catalogue {
    db: StarsDb,
}

impl Catalogue {
    /// Open (and migrate) a local catalogue.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn open_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = StarsDb::open_local(db_path).await?;
        tracing::debug!(path = db_path, "catalogue opened");
        Ok(Self { db })
    }

    #[must_use]
    pub const fn from_db(db: StarsDb) -> Self {
        Self { db }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &StarsDb {
        &self.db
    }
}
