//! HTML copy/export and bulk export of every variant

use tracing::debug;

use crate::stylesheet::apply_style_tokens;
use crate::template::is_safe_id;

use super::{EditorError, EditorState};

/// A single downloadable HTML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlExport {
    pub filename: String,
    pub contents: String,
}

/// What to produce for each variant in a bulk export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    Html,
    Text,
    #[default]
    Both,
}

impl ExportFormat {
    fn wants_html(self) -> bool {
        matches!(self, ExportFormat::Html | ExportFormat::Both)
    }

    fn wants_text(self) -> bool {
        matches!(self, ExportFormat::Text | ExportFormat::Both)
    }
}

/// One file of a bulk export, at a relative path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub path: String,
    pub contents: String,
}

/// HTML to plain-text conversion for text exports
pub trait PlainTextConverter {
    fn to_plain_text(&self, html: &str) -> String;
}

impl<F> PlainTextConverter for F
where
    F: Fn(&str) -> String,
{
    fn to_plain_text(&self, html: &str) -> String {
        self(html)
    }
}

impl EditorState {
    /// HTML for the clipboard
    ///
    /// In global mode this is the style-resolved global document, otherwise
    /// the composed email.
    pub fn copy_html(&self) -> String {
        if self.is_editing_global() {
            apply_style_tokens(&self.global_template().html, self.template_style())
        } else {
            self.composed_html()
        }
    }

    /// The clipboard HTML as a named file
    pub fn export_html(&self) -> HtmlExport {
        let filename = if self.is_editing_global() {
            "base-template.html".to_string()
        } else {
            format!("{}-template.html", self.selected_type())
        };
        HtmlExport {
            filename,
            contents: self.copy_html(),
        }
    }

    /// Compose every variant of every template
    ///
    /// Paths are `{type}/{variant-id}.html` and `{type}/{variant-id}.txt`.
    /// Ids that are not safe path components fail the whole export.
    pub fn export_all(
        &self,
        format: ExportFormat,
        converter: Option<&dyn PlainTextConverter>,
    ) -> Result<Vec<ExportEntry>, EditorError> {
        let converter = match (format.wants_text(), converter) {
            (true, None) => return Err(EditorError::ConverterRequired),
            (_, converter) => converter,
        };

        let mut entries = Vec::new();
        for template in self.templates() {
            for variant in template.variants() {
                let html = self
                    .global_template()
                    .compose(&variant.body_html, Some(self.template_style()));
                let stem = format!("{}/{}", template.template_type(), variant.id);
                if !is_safe_id(template.template_type()) || !is_safe_id(&variant.id) {
                    return Err(EditorError::UnsafePath { path: stem });
                }

                if let (true, Some(converter)) = (format.wants_text(), converter) {
                    entries.push(ExportEntry {
                        path: format!("{}.txt", stem),
                        contents: converter.to_plain_text(&html),
                    });
                }
                if format.wants_html() {
                    entries.push(ExportEntry {
                        path: format!("{}.html", stem),
                        contents: html,
                    });
                }
            }
        }
        debug!(files = entries.len(), "exported all variants");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{EmailTemplate, TemplateVariant};

    #[test]
    fn test_export_html_filenames() {
        let mut state = EditorState::default();
        assert_eq!(state.export_html().filename, "confirm-signup-template.html");
        assert_eq!(state.export_html().contents, state.composed_html());

        state.edit_global();
        let export = state.export_html();
        assert_eq!(export.filename, "base-template.html");
        assert!(!export.contents.contains("{{STYLE_"));
        assert!(export.contents.contains("<!-- BODY_CONTENT -->"));
    }

    #[test]
    fn test_export_all_paths() {
        let state = EditorState::default();
        let entries = state.export_all(ExportFormat::Html, None).unwrap();
        let total: usize = state.variant_counts().values().sum();
        assert_eq!(entries.len(), total);
        assert!(entries.iter().any(|e| e.path == "confirm-signup/minimal.html"));
        assert!(entries.iter().all(|e| !e.contents.contains("{{STYLE_")));
    }

    #[test]
    fn test_export_all_rejects_unsafe_variant_id() {
        let mut state = EditorState::default();
        let variant = TemplateVariant::new("../../../tmp/pwned", "Evil", "x", "<p>x</p>");
        // written directly, skipping import sanitizing
        state.templates[0] = EmailTemplate::new("confirm-signup", variant);

        assert_eq!(
            state.export_all(ExportFormat::Html, None),
            Err(EditorError::UnsafePath {
                path: "confirm-signup/../../../tmp/pwned".to_string()
            })
        );
    }

    #[test]
    fn test_export_text_needs_converter() {
        let state = EditorState::default();
        assert_eq!(
            state.export_all(ExportFormat::Both, None),
            Err(EditorError::ConverterRequired)
        );

        let strip = |html: &str| format!("{} chars", html.len());
        let entries = state.export_all(ExportFormat::Both, Some(&strip)).unwrap();
        let texts = entries.iter().filter(|e| e.path.ends_with(".txt")).count();
        let htmls = entries.iter().filter(|e| e.path.ends_with(".html")).count();
        assert_eq!(texts, htmls);
    }
}
