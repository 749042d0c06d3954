//! Slug generation and validation for course URLs.
//!
//! Slugs are generated from the course title on first save; uniqueness
//! disambiguation (`-1`, `-2`, …) happens in the course service, which can
//! see the already-taken slugs.

/// Maximum slug length, matching the course title limit.
pub const MAX_SLUG_LEN: usize = 200;

/// Returns true if `slug` contains only ASCII letters, digits, hyphens and
/// underscores, and is non-empty.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Derives a slug from a free-form title.
///
/// Lowercases ASCII, keeps alphanumerics and underscores, folds every other
/// run of characters into a single hyphen, and trims leading/trailing
/// hyphens. Non-ASCII characters are dropped rather than transliterated.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out.truncate(MAX_SLUG_LEN);
    out
}

/// Appends a numeric suffix to a base slug, keeping the result within
/// `MAX_SLUG_LEN`.
#[must_use]
pub fn with_suffix(base: &str, counter: u32) -> String {
    let suffix = format!("-{counter}");
    let keep = MAX_SLUG_LEN.saturating_sub(suffix.len()).min(base.len());
    format!("{}{suffix}", &base[..keep])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Intro to Rust"), "intro-to-rust");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  A -- B  "), "a-b");
    }

    #[test]
    fn slugify_keeps_underscores() {
        assert_eq!(slugify("unit_1 basics"), "unit_1-basics");
    }

    #[test]
    fn slugify_drops_non_ascii() {
        assert_eq!(slugify("Курс rust"), "rust");
    }

    #[test]
    fn valid_slug_charset() {
        assert!(is_valid_slug("intro-to-rust_2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("кириллица"));
    }

    #[test]
    fn suffix_stays_within_limit() {
        let base = "a".repeat(MAX_SLUG_LEN);
        let slug = with_suffix(&base, 12);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(slug.ends_with("-12"));
    }
}
