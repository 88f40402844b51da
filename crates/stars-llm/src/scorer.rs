//! Scores one repository against every list definition.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stars_core::entities::{ListDefinition, ListScore, Repository};

use crate::backend::{CompletionOptions, LlmBackend};
use crate::error::LlmError;
use crate::parse::parse_scores;
use crate::prompt::{SYSTEM_PROMPT, user_prompt};

/// What a scoring call produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ScoreOutcome {
    /// Parsed, validated scores for known lists.
    Structured(Vec<ListScore>),
    /// The model's verbatim reply when it could not be parsed.
    RawText(String),
}

impl ScoreOutcome {
    /// Usable scores, `None` for raw text.
    #[must_use]
    pub fn scores(&self) -> Option<&[ListScore]> {
        match self {
            Self::Structured(scores) => Some(scores),
            Self::RawText(_) => None,
        }
    }
}

/// Response shape advertised to backends that support structured output.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScoreResponse {
    pub scores: Vec<ListScore>,
}

/// JSON schema for [`ScoreResponse`].
#[must_use]
pub fn response_schema() -> serde_json::Value {
    schemars::schema_for!(ScoreResponse).to_value()
}

pub struct Scorer<'a, B: LlmBackend + ?Sized> {
    backend: &'a B,
    options: CompletionOptions,
}

impl<'a, B: LlmBackend + ?Sized> Scorer<'a, B> {
    #[must_use]
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            options: CompletionOptions::default(),
        }
    }

    /// Advertise [`response_schema`] to the backend.
    #[must_use]
    pub fn with_schema_hint(mut self) -> Self {
        self.options.schema_hint = Some(response_schema());
        self
    }

    #[must_use]
    pub fn with_auth_header(mut self, header: impl Into<String>) -> Self {
        self.options.auth_header = Some(header.into());
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Ask the model how well `repo` fits each list.
    ///
    /// # Errors
    ///
    /// Only backend transport failures. A reply that cannot be parsed is
    /// returned as [`ScoreOutcome::RawText`].
    pub async fn score(
        &self,
        repo: &Repository,
        lists: &[ListDefinition],
    ) -> Result<ScoreOutcome, LlmError> {
        if lists.is_empty() {
            return Ok(ScoreOutcome::Structured(Vec::new()));
        }

        let prompt = user_prompt(repo, lists);
        let reply = self
            .backend
            .complete(SYSTEM_PROMPT, &prompt, &self.options)
            .await?;

        let known: HashSet<&str> = lists.iter().map(|l| l.slug.as_str()).collect();
        match parse_scores(&reply, &known) {
            Some(scores) => {
                tracing::debug!(repo = %repo.facts.name_with_owner, scores = scores.len(), "scored");
                Ok(ScoreOutcome::Structured(scores))
            }
            None => {
                tracing::debug!(
                    repo = %repo.facts.name_with_owner,
                    reply_chars = reply.len(),
                    "model reply was not parseable"
                );
                Ok(ScoreOutcome::RawText(reply))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use stars_core::entities::{RepoFacts, RepoSignals};

    use super::*;

    struct CannedBackend {
        reply: Result<String, u16>,
        seen: Mutex<Vec<CompletionOptions>>,
    }

    impl CannedBackend {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmBackend for CannedBackend {
        fn model(&self) -> &str {
            "canned"
        }

        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            options: &CompletionOptions,
        ) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(options.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "down".into(),
                }),
            }
        }
    }

    fn repo() -> Repository {
        Repository {
            id: 1,
            facts: RepoFacts {
                name_with_owner: "o/r".into(),
                url: "https://github.com/o/r".into(),
                ..Default::default()
            },
            signals: RepoSignals::default(),
            summary: None,
        }
    }

    fn lists() -> Vec<ListDefinition> {
        ["alpha", "beta"]
            .into_iter()
            .map(|slug| ListDefinition {
                slug: slug.into(),
                name: slug.to_uppercase(),
                description: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn structured_reply() {
        let backend = CannedBackend::replying(r#"{"alpha": 0.9, "beta": 0.1}"#);
        let outcome = Scorer::new(&backend).score(&repo(), &lists()).await.unwrap();
        assert_eq!(
            outcome,
            ScoreOutcome::Structured(vec![
                ListScore::new("alpha", 0.9),
                ListScore::new("beta", 0.1)
            ])
        );
    }

    #[tokio::test]
    async fn unparseable_reply_is_raw_text() {
        let backend = CannedBackend::replying("no idea, sorry");
        let outcome = Scorer::new(&backend).score(&repo(), &lists()).await.unwrap();
        assert_eq!(outcome, ScoreOutcome::RawText("no idea, sorry".into()));
        assert!(outcome.scores().is_none());
    }

    #[tokio::test]
    async fn transport_failure_is_error() {
        let backend = CannedBackend {
            reply: Err(500),
            seen: Mutex::new(Vec::new()),
        };
        let err = Scorer::new(&backend)
            .score(&repo(), &lists())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn options_reach_the_backend() {
        let backend = CannedBackend::replying("[]");
        Scorer::new(&backend)
            .with_schema_hint()
            .with_auth_header("Bearer override")
            .score(&repo(), &lists())
            .await
            .unwrap();

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].auth_header.as_deref(), Some("Bearer override"));
        let schema = seen[0].schema_hint.as_ref().unwrap();
        assert!(schema["properties"].get("scores").is_some());
    }

    #[tokio::test]
    async fn no_lists_skips_the_model() {
        let backend = CannedBackend::replying("unused");
        let outcome = Scorer::new(&backend).score(&repo(), &[]).await.unwrap();
        assert_eq!(outcome, ScoreOutcome::Structured(Vec::new()));
        assert!(backend.seen.lock().unwrap().is_empty());
    }
}
