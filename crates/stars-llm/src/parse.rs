//! Tolerant parsing of model replies into per-list scores.
//!
//! Accepted shapes, optionally inside Markdown code fences or surrounded by
//! prose:
//! - `{"scores": [{"list_slug": "...", "score": 0.8, "rationale": "..."}]}`
//! - a bare array of the same entries
//! - a `{"slug": 0.8}` map

use std::collections::HashSet;

use serde_json::{Map, Value};
use stars_core::entities::ListScore;

/// Strip a surrounding ```` ```json ```` fence if present.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Candidate JSON documents inside `text`, most specific first.
fn candidates(text: &str) -> Vec<&str> {
    let mut out = vec![text];
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
            if start < end {
                out.push(&text[start..=end]);
            }
        }
    }
    out
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn entry_from_object(obj: &Map<String, Value>) -> Option<(String, f64, Option<String>)> {
    let slug = ["list_slug", "slug", "list"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))?;
    let score = obj.get("score").and_then(number)?;
    let rationale = ["rationale", "reason"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::to_string);
    Some((slug.to_string(), score, rationale))
}

/// `None` when a non-empty container yielded no usable entry.
fn non_empty(
    container_len: usize,
    entries: Vec<(String, f64, Option<String>)>,
) -> Option<Vec<(String, f64, Option<String>)>> {
    (container_len == 0 || !entries.is_empty()).then_some(entries)
}

/// Raw `(slug, score, rationale)` triples, or `None` if the shape is unknown.
///
/// Literal `[]` and `{"scores": []}` are valid empty replies; anything else
/// that carries data but no score entry is not.
fn raw_entries(value: &Value) -> Option<Vec<(String, f64, Option<String>)>> {
    match value {
        Value::Array(items) => non_empty(
            items.len(),
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(entry_from_object)
                .collect(),
        ),
        Value::Object(obj) => match obj.get("scores") {
            Some(inner @ Value::Array(_)) => raw_entries(inner),
            Some(Value::Object(map)) => non_empty(map.len(), map_entries(map)),
            _ => {
                let entries = map_entries(obj);
                (!entries.is_empty()).then_some(entries)
            }
        },
        _ => None,
    }
}

fn map_entries(map: &Map<String, Value>) -> Vec<(String, f64, Option<String>)> {
    map.iter()
        .filter_map(|(slug, v)| number(v).map(|score| (slug.clone(), score, None)))
        .collect()
}

/// Parse a model reply. `None` when no accepted shape can be found.
///
/// Entries for slugs outside `known_slugs` and non-finite scores are dropped,
/// scores are clamped to `[0, 1]`, and the first entry wins for a repeated
/// slug.
#[must_use]
pub fn parse_scores(text: &str, known_slugs: &HashSet<&str>) -> Option<Vec<ListScore>> {
    let body = strip_fences(text);
    let entries = candidates(body)
        .into_iter()
        .filter_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
        .find_map(|value| raw_entries(&value))?;

    let mut seen = HashSet::new();
    let mut scores = Vec::new();
    for (slug, score, rationale) in entries {
        if !score.is_finite() || !known_slugs.contains(slug.as_str()) {
            tracing::debug!(slug, score, "dropping score entry");
            continue;
        }
        if !seen.insert(slug.clone()) {
            continue;
        }
        scores.push(ListScore {
            list_slug: slug,
            score: score.clamp(0.0, 1.0),
            rationale: rationale.filter(|r| !r.trim().is_empty()),
        });
    }
    Some(scores)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn known() -> HashSet<&'static str> {
        ["alpha", "beta"].into_iter().collect()
    }

    fn pairs(scores: &[ListScore]) -> Vec<(&str, f64)> {
        scores.iter().map(|s| (s.list_slug.as_str(), s.score)).collect()
    }

    #[rstest]
    #[case::wrapped(r#"{"scores": [{"list_slug": "alpha", "score": 0.9}, {"list_slug": "beta", "score": 0.1}]}"#)]
    #[case::bare_array(r#"[{"slug": "alpha", "score": 0.9}, {"list": "beta", "score": "0.1"}]"#)]
    #[case::map(r#"{"alpha": 0.9, "beta": 0.1}"#)]
    #[case::fenced("```json\n{\"alpha\": 0.9, \"beta\": 0.1}\n```")]
    #[case::prose("Sure! Here are the scores:\n{\"scores\": [{\"list_slug\": \"alpha\", \"score\": 0.9}, {\"list_slug\": \"beta\", \"score\": 0.1}]}\nHope that helps.")]
    fn accepted_shapes(#[case] reply: &str) {
        let scores = parse_scores(reply, &known()).unwrap();
        assert_eq!(pairs(&scores), vec![("alpha", 0.9), ("beta", 0.1)]);
    }

    #[test]
    fn clamps_and_filters() {
        let reply = r#"{"scores": [
            {"list_slug": "alpha", "score": 1.7, "rationale": "very async"},
            {"list_slug": "ghost", "score": 0.5},
            {"list_slug": "beta", "score": -0.2},
            {"list_slug": "alpha", "score": 0.0}
        ]}"#;
        let scores = parse_scores(reply, &known()).unwrap();
        assert_eq!(pairs(&scores), vec![("alpha", 1.0), ("beta", 0.0)]);
        assert_eq!(scores[0].rationale.as_deref(), Some("very async"));
    }

    #[test]
    fn non_numeric_scores_are_dropped() {
        let reply = r#"{"alpha": "high", "beta": 0.3}"#;
        let scores = parse_scores(reply, &known()).unwrap();
        assert_eq!(pairs(&scores), vec![("beta", 0.3)]);
    }

    #[rstest]
    #[case("I cannot help with that.")]
    #[case("{not json at all")]
    #[case("42")]
    #[case(r#"{"verdict": "yes"}"#)]
    #[case("[1, 2]")]
    #[case(r#"{"scores": {"alpha": "x"}}"#)]
    #[case(r#"{"scores": [{"note": "none"}]}"#)]
    fn unusable_replies(#[case] reply: &str) {
        assert_eq!(parse_scores(reply, &known()), None);
    }

    #[rstest]
    #[case("[]")]
    #[case(r#"{"scores": []}"#)]
    #[case(r#"{"scores": {}}"#)]
    fn explicit_empty_replies(#[case] reply: &str) {
        assert_eq!(parse_scores(reply, &known()), Some(vec![]));
    }
}
