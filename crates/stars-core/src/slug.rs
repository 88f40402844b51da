//! List slug derivation.
//!
//! Slugs are lowercase ASCII, `-` separated, and derived only from the list's
//! display name so that re-syncing an unchanged list yields the same slug.
//! Uniqueness across lists is enforced by the catalogue with numeric suffixes
//! (see [`with_suffix`] and [`belongs_to_base`]).

/// Fallback slug for names with no ASCII alphanumerics (e.g. emoji-only names).
pub const EMPTY_SLUG: &str = "list";

/// Derive the base slug for a list name.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if out.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        out
    }
}

/// Build the `n`-th candidate for `base`. `n <= 1` is the base itself.
#[must_use]
pub fn with_suffix(base: &str, n: u32) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}

/// Whether `slug` is `base` or one of its numeric-suffix variants.
#[must_use]
pub fn belongs_to_base(slug: &str, base: &str) -> bool {
    if slug == base {
        return true;
    }
    slug.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}
