//! Membership planner policy.
//!
//! Thresholds are plain scores in `[0, 1]`. The policy is serialized into each
//! scoring run so score history can be read against the bar that was applied.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

const fn default_respect_curation() -> bool {
    true
}

const fn default_curation_remove_threshold() -> f64 {
    0.1
}

const fn default_remove_threshold() -> f64 {
    0.35
}

const fn default_add_threshold() -> f64 {
    0.7
}

const fn default_review_band_width() -> f64 {
    0.15
}

/// How the planner avoids a listless outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FallbackRule {
    /// Promote the single highest-scoring review candidate; ties go to the
    /// lexicographically smallest slug.
    #[default]
    HighestReview,
    /// Never promote; an empty plan is always blocked.
    Disabled,
}

impl FallbackRule {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HighestReview => "highest_review",
            Self::Disabled => "disabled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlannerPolicy {
    /// Use the lenient `curation_remove_threshold` for removals so a single
    /// weak run does not undo manual curation.
    #[serde(default = "default_respect_curation")]
    pub respect_curation: bool,

    /// Removal bar while respecting curation.
    #[serde(default = "default_curation_remove_threshold")]
    pub curation_remove_threshold: f64,

    /// Removal bar when curation is not respected.
    #[serde(default = "default_remove_threshold")]
    pub default_remove_threshold: f64,

    /// Minimum score to add a repository to a list.
    #[serde(default = "default_add_threshold")]
    pub default_add_threshold: f64,

    /// Width of the band below the add threshold surfaced for review.
    #[serde(default = "default_review_band_width")]
    pub review_band_width: f64,

    #[serde(default)]
    pub fallback: FallbackRule,
}

impl Default for PlannerPolicy {
    fn default() -> Self {
        Self {
            respect_curation: default_respect_curation(),
            curation_remove_threshold: default_curation_remove_threshold(),
            default_remove_threshold: default_remove_threshold(),
            default_add_threshold: default_add_threshold(),
            review_band_width: default_review_band_width(),
            fallback: FallbackRule::default(),
        }
    }
}

impl PlannerPolicy {
    /// The removal threshold in effect for this policy.
    #[must_use]
    pub const fn remove_threshold(&self) -> f64 {
        if self.respect_curation {
            self.curation_remove_threshold
        } else {
            self.default_remove_threshold
        }
    }

    /// Lower edge of the review band (inclusive).
    #[must_use]
    pub fn review_floor(&self) -> f64 {
        (self.default_add_threshold - self.review_band_width).max(0.0)
    }

    /// Check every threshold lies in `[0, 1]` and the band width is non-negative.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [
            ("curation_remove_threshold", self.curation_remove_threshold),
            ("default_remove_threshold", self.default_remove_threshold),
            ("default_add_threshold", self.default_add_threshold),
            ("review_band_width", self.review_band_width),
        ];
        for (name, value) in fields {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(CoreError::Validation(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = PlannerPolicy::default();
        assert!(policy.respect_curation);
        assert!((policy.remove_threshold() - 0.1).abs() < f64::EPSILON);
        assert!(policy.curation_remove_threshold < policy.default_remove_threshold);
        assert_eq!(policy.fallback, FallbackRule::HighestReview);
        policy.validate().unwrap();
    }

    #[test]
    fn remove_threshold_follows_curation_flag() {
        let policy = PlannerPolicy {
            respect_curation: false,
            ..Default::default()
        };
        assert!((policy.remove_threshold() - 0.35).abs() < f64::EPSILON);
    }

    #[test]
    fn review_floor_never_negative() {
        let policy = PlannerPolicy {
            default_add_threshold: 0.1,
            review_band_width: 0.5,
            ..Default::default()
        };
        assert!(policy.review_floor().abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let policy = PlannerPolicy {
            default_add_threshold: 1.5,
            ..Default::default()
        };
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("default_add_threshold"));

        let policy = PlannerPolicy {
            review_band_width: f64::NAN,
            ..Default::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn partial_toml_like_json_fills_defaults() {
        let policy: PlannerPolicy =
            serde_json::from_str(r#"{"curation_remove_threshold": 0.2}"#).unwrap();
        assert!((policy.curation_remove_threshold - 0.2).abs() < f64::EPSILON);
        assert!((policy.default_add_threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(policy.fallback, FallbackRule::HighestReview);
    }
}
