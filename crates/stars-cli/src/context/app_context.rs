use std::path::Path;

use anyhow::Context;
use stars_config::StarsConfig;
use stars_core::CancelSignal;
use stars_db::Catalogue;
use stars_github::GithubClient;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub config: StarsConfig,
    pub catalogue: Catalogue,
    /// Set by Ctrl-C; checked by star walks between pages.
    pub cancel: CancelSignal,
}

impl AppContext {
    /// Open the catalogue at `db_override`, or the configured path.
    pub async fn init(
        config: StarsConfig,
        db_override: Option<&Path>,
        cancel: CancelSignal,
    ) -> anyhow::Result<Self> {
        let db_path = db_override.unwrap_or(&config.general.database_path);
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let catalogue = Catalogue::open_local(&db_path.to_string_lossy())
            .await
            .with_context(|| format!("failed to open catalogue at {}", db_path.display()))?;
        tracing::debug!(path = %db_path.display(), "catalogue opened");

        Ok(Self {
            config,
            catalogue,
            cancel,
        })
    }

    /// A GraphQL client, or `NotConfigured` when no token is set.
    pub fn github(&self) -> anyhow::Result<GithubClient> {
        let github = self.config.github.require()?;
        GithubClient::new(github).context("failed to build GitHub client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_database_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("nested").join("stars.db");

        let ctx = AppContext::init(StarsConfig::default(), Some(&db), CancelSignal::new())
            .await
            .unwrap();
        assert!(db.exists());
        assert!(ctx.catalogue.lists().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn github_requires_a_token() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = AppContext::init(
            StarsConfig::default(),
            Some(&dir.path().join("stars.db")),
            CancelSignal::new(),
        )
        .await
        .unwrap();

        let err = ctx.github().err().unwrap();
        assert!(err.to_string().contains("github"));
    }
}
