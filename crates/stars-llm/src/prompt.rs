//! Prompt construction.

use std::fmt::Write;

use stars_core::entities::{ListDefinition, Repository};

pub const SYSTEM_PROMPT: &str = "You classify GitHub repositories into a user's curated lists. \
For every list you are given, rate how well the repository fits that list's criteria with a \
score between 0 and 1. Scores are independent per list and do not need to sum to 1. \
Reply with JSON only: {\"scores\": [{\"list_slug\": \"...\", \"score\": 0.0, \"rationale\": \"...\"}]}. \
Use exactly the list slugs provided.";

/// Longest summary or description passed to the model, in characters.
const MAX_TEXT_CHARS: usize = 2000;

fn clipped(text: &str) -> &str {
    match text.char_indices().nth(MAX_TEXT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Describe the repository and the candidate lists.
#[must_use]
pub fn user_prompt(repo: &Repository, lists: &[ListDefinition]) -> String {
    let facts = &repo.facts;
    let mut out = String::new();

    let _ = writeln!(out, "Repository: {}", facts.name_with_owner);
    let _ = writeln!(out, "URL: {}", facts.url);
    if let Some(language) = &facts.primary_language {
        let _ = writeln!(out, "Primary language: {language}");
    }
    if !facts.topics.is_empty() {
        let _ = writeln!(out, "Topics: {}", facts.topics.join(", "));
    }
    if let Some(description) = &facts.description {
        let _ = writeln!(out, "Description: {}", clipped(description));
    }
    if let Some(summary) = &repo.summary {
        let _ = writeln!(out, "Summary: {}", clipped(summary));
    }

    out.push_str("\nLists:\n");
    for list in lists {
        let _ = write!(out, "- {} ({})", list.slug, list.name);
        match list.description.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(criteria) => {
                let _ = writeln!(out, ": {criteria}");
            }
            None => out.push('\n'),
        }
    }
    out
}
