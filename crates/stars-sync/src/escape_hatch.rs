//! CSV log of repositories whose plan was blocked, for manual triage.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use serde::Serialize;
use stars_core::entities::{ListScore, Repository};

use crate::error::SyncError;

const HEADER: [&str; 5] = ["name_with_owner", "url", "current_slugs", "scores_json", "note"];

#[derive(Debug, Serialize)]
struct BlockedRow<'a> {
    name_with_owner: &'a str,
    url: &'a str,
    current_slugs: String,
    scores_json: String,
    note: &'a str,
}

/// Append-only CSV; the header is written only when the file is new or empty.
#[derive(Debug, Clone)]
pub struct BlockedLog {
    path: PathBuf,
}

impl BlockedLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row for `repo`.
    ///
    /// # Errors
    ///
    /// [`SyncError::EscapeHatch`] on I/O or CSV failures.
    pub fn record(
        &self,
        repo: &Repository,
        current: &BTreeSet<String>,
        scores: &[ListScore],
        note: &str,
    ) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
        }

        let score_map: BTreeMap<&str, f64> = scores
            .iter()
            .map(|s| (s.list_slug.as_str(), s.score))
            .collect();
        let scores_json =
            serde_json::to_string(&score_map).map_err(|e| SyncError::EscapeHatch(e.to_string()))?;

        writer.serialize(BlockedRow {
            name_with_owner: &repo.facts.name_with_owner,
            url: &repo.facts.url,
            current_slugs: current.iter().map(String::as_str).collect::<Vec<_>>().join(";"),
            scores_json,
            note,
        })?;
        writer.flush()?;

        tracing::debug!(repo = %repo.facts.name_with_owner, path = %self.path.display(), "blocked repository recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use stars_core::entities::{RepoFacts, RepoSignals};

    use super::*;

    fn repo(name: &str) -> Repository {
        Repository {
            id: 1,
            facts: RepoFacts {
                name_with_owner: name.into(),
                url: format!("https://github.com/{name}"),
                ..Default::default()
            },
            signals: RepoSignals::default(),
            summary: None,
        }
    }

    #[test]
    fn header_once_then_rows() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = BlockedLog::new(dir.path().join("nested/blocked.csv"));
        let current: BTreeSet<String> = ["beta".to_string(), "alpha".to_string()].into();

        log.record(
            &repo("o/one"),
            &current,
            &[ListScore::new("alpha", 0.05)],
            "would become listless",
        )
        .unwrap();
        log.record(&repo("o/two"), &BTreeSet::new(), &[], "would become listless")
            .unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "name_with_owner,url,current_slugs,scores_json,note");
        assert_eq!(
            lines[1],
            r#"o/one,https://github.com/o/one,alpha;beta,"{""alpha"":0.05}",would become listless"#
        );
        assert!(lines[2].starts_with("o/two,https://github.com/o/two,,{},"));
    }
}
