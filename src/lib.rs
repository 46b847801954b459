//! Mailsmith - email template composition and styling
//!
//! This library provides the editing core of an email template studio: a
//! catalog of template types with named variants, style-token substitution,
//! composition of a global wrapper document with per-type bodies, and a
//! versioned snapshot format for saving, importing and exporting projects.
//!
//! # Example
//!
//! ```rust
//! use mailsmith::{compose, default_persisted_data, ComposeOptions};
//!
//! let html = compose(default_persisted_data(), &ComposeOptions::new()).unwrap();
//! assert!(html.contains("Confirm your email"));
//! assert!(!html.contains("{{STYLE_"));
//! ```

pub mod config;
pub mod editor;
pub mod error;
pub mod persistence;
pub mod stylesheet;
pub mod template;

pub use config::{ConfigError, StudioConfig};
pub use editor::{EditorError, EditorState, ExportEntry, ExportFormat, HtmlExport, PlainTextConverter};
pub use error::StudioError;
pub use persistence::{
    default_persisted_data, is_valid_persisted_data, PersistedData, PersistenceError,
    ProjectKey, ProjectSession, ProjectStore, StorageError,
};
pub use stylesheet::{apply_style_tokens, StyleConfig, StylePatch, StyleToken};
pub use template::{compose_email, EmailTemplate, TemplateTypeInfo, TemplateVariable, TemplateVariant};

/// What to compose from a project snapshot
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    /// Template type; the snapshot's initial type when unset
    pub template_type: Option<String>,
    /// Variant to compose; the active one when unset
    pub variant: Option<String>,
    /// Output the global template alone instead of a composed email
    pub global: bool,
    /// Style overrides applied on top of the snapshot's style
    pub style: Option<StylePatch>,
}

impl ComposeOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template type
    pub fn with_type(mut self, template_type: impl Into<String>) -> Self {
        self.template_type = Some(template_type.into());
        self
    }

    /// Set the variant
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Compose the global template only
    pub fn with_global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    /// Set style overrides
    pub fn with_style(mut self, patch: StylePatch) -> Self {
        self.style = Some(patch);
        self
    }
}

/// Compose the final HTML for one template of a snapshot
///
/// # Example
///
/// ```rust
/// use mailsmith::{compose, default_persisted_data, ComposeOptions, StylePatch, StyleToken};
///
/// let options = ComposeOptions::new()
///     .with_type("magic-link")
///     .with_style(StylePatch::new().with(StyleToken::BrandName, "Acme"));
///
/// let html = compose(default_persisted_data(), &options).unwrap();
/// assert!(html.contains("Acme"));
/// ```
pub fn compose(data: PersistedData, options: &ComposeOptions) -> Result<String, StudioError> {
    let mut editor = EditorState::from_persisted(data);

    if let Some(patch) = &options.style {
        editor.update_style(patch);
    }
    if let Some(template_type) = &options.template_type {
        editor.change_type(template_type)?;
    }
    if let Some(variant) = &options.variant {
        editor.select_variant(variant);
    }
    if options.global {
        editor.edit_global();
    }

    Ok(editor.copy_html())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_default() {
        let html = compose(default_persisted_data(), &ComposeOptions::new()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>") || html.contains("<html"));
        assert!(!html.contains(template::BODY_PLACEHOLDER));
    }

    #[test]
    fn test_compose_variant() {
        let options = ComposeOptions::new().with_variant("minimal");
        let html = compose(default_persisted_data(), &options).unwrap();
        let data = default_persisted_data();
        let minimal = data.templates[0].variant("minimal").unwrap();
        let expected = compose_email(
            &data.global_template.html,
            &minimal.body_html,
            Some(&data.template_style),
        );
        assert_eq!(html, expected);
    }

    #[test]
    fn test_compose_global_keeps_placeholder() {
        let options = ComposeOptions::new().with_global(true);
        let html = compose(default_persisted_data(), &options).unwrap();
        assert!(html.contains(template::BODY_PLACEHOLDER));
    }

    #[test]
    fn test_compose_unknown_type_error() {
        let options = ComposeOptions::new().with_type("nope");
        let err = compose(default_persisted_data(), &options).unwrap_err();
        assert!(matches!(
            err,
            StudioError::Editor(EditorError::UnknownType { .. })
        ));
    }
}
