//! URL slug generation.
//!
//! Slugs are the URL-safe identifiers of Markdown files (`/view/{slug}`).
//! The server accepts `^[a-z0-9-]+$`; [`generate_slug`] always produces a
//! string of that shape (or the empty string).

use std::sync::LazyLock;

use regex::Regex;

/// Characters that survive stripping: ASCII word chars, whitespace, hyphen.
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_\s-]").expect("valid regex"));

/// Runs of separators collapse into a single hyphen.
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_-]+").expect("valid regex"));

/// Pattern the server enforces on stored slugs.
static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid regex"));

/// Generate a slug from free text.
///
/// Lowercases, trims, drops anything that is not an ASCII letter, digit,
/// underscore, whitespace or hyphen, then collapses separator runs into one
/// hyphen and strips hyphens at both ends.
///
/// # Example
/// ```
/// use mdcms_admin::generate_slug;
///
/// assert_eq!(generate_slug("Hello World!"), "hello-world");
/// assert_eq!(generate_slug(""), "");
/// ```
pub fn generate_slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = DISALLOWED.replace_all(lowered.trim(), "");
    let collapsed = SEPARATORS.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

/// Check a slug against the server-side pattern `^[a-z0-9-]+$`.
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_PATTERN.is_match(slug)
}
