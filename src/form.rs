//! Client-side validation of the Markdown editor form.
//!
//! Errors are returned as data; nothing here fails. Every rule runs, so the
//! caller can show all problems at once, in field order (title, slug, content).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::slug::is_valid_slug;

/// Editor form fields as submitted. A missing field is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownForm {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
}

impl MarkdownForm {
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            slug: Some(slug.into()),
            content: Some(content.into()),
        }
    }
}

/// A single field-level problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Title is required")]
    TitleRequired,

    #[error("Slug is required")]
    SlugRequired,

    #[error("Slug can only contain lowercase letters, numbers, and hyphens")]
    SlugPattern,

    #[error("Content is required")]
    ContentRequired,
}

impl FormError {
    /// Name of the offending form field.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::TitleRequired => "title",
            Self::SlugRequired | Self::SlugPattern => "slug",
            Self::ContentRequired => "content",
        }
    }
}

/// Validate the editor form.
///
/// Returns an empty vector when the form can be submitted.
pub fn validate_markdown_form(form: &MarkdownForm) -> Vec<FormError> {
    let mut errors = Vec::new();

    if is_blank(form.title.as_deref()) {
        errors.push(FormError::TitleRequired);
    }

    match form.slug.as_deref() {
        slug if is_blank(slug) => errors.push(FormError::SlugRequired),
        // The pattern applies to the raw value, surrounding spaces included.
        Some(slug) if !is_valid_slug(slug) => errors.push(FormError::SlugPattern),
        _ => {}
    }

    if is_blank(form.content.as_deref()) {
        errors.push(FormError::ContentRequired);
    }

    errors
}

/// Absent, or only whitespace and byte-order marks.
#[inline]
fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| {
        v.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
            .is_empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &[FormError]) -> Vec<String> {
        errors.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_all_empty() {
        let errors = validate_markdown_form(&MarkdownForm::new("", "", ""));
        assert_eq!(
            messages(&errors),
            ["Title is required", "Slug is required", "Content is required"]
        );
    }

    #[test]
    fn test_all_missing() {
        let errors = validate_markdown_form(&MarkdownForm::default());
        assert_eq!(
            errors,
            [
                FormError::TitleRequired,
                FormError::SlugRequired,
                FormError::ContentRequired
            ]
        );
    }

    #[test]
    fn test_bad_slug_only() {
        let errors = validate_markdown_form(&MarkdownForm::new("T", "Bad Slug!", "C"));
        assert_eq!(
            messages(&errors),
            ["Slug can only contain lowercase letters, numbers, and hyphens"]
        );
        assert_eq!(errors[0].field(), "slug");
    }

    #[test]
    fn test_valid_form() {
        let form = MarkdownForm::new("T", "good-slug-1", "C");
        assert!(validate_markdown_form(&form).is_empty());
    }

    #[test]
    fn test_whitespace_counts_as_blank() {
        let errors = validate_markdown_form(&MarkdownForm::new("  ", "\t", "\n"));
        assert_eq!(errors.len(), 3);
        assert!(!errors.contains(&FormError::SlugPattern));
    }

    #[test]
    fn test_byte_order_mark_counts_as_blank() {
        let errors = validate_markdown_form(&MarkdownForm::new("\u{FEFF}", "ok", " \u{FEFF}\n"));
        assert_eq!(errors, [FormError::TitleRequired, FormError::ContentRequired]);
    }

    #[test]
    fn test_padded_slug_fails_pattern() {
        let errors = validate_markdown_form(&MarkdownForm::new("T", " ok ", "C"));
        assert_eq!(errors, [FormError::SlugPattern]);
    }

    #[test]
    fn test_input_untouched() {
        let form = MarkdownForm::new(" T ", "x", " C ");
        let before = form.clone();
        validate_markdown_form(&form);
        assert_eq!(form, before);
    }

    #[test]
    fn test_deserialize_partial() {
        let form: MarkdownForm = serde_json::from_str(r#"{"title":"T"}"#).unwrap();
        assert_eq!(form.slug, None);
        assert_eq!(
            validate_markdown_form(&form),
            [FormError::SlugRequired, FormError::ContentRequired]
        );
    }
}
