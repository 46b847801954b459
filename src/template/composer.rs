//! Composition of the global wrapper document with a body fragment

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::stylesheet::{apply_style_tokens, StyleConfig};

use super::builtin::default_global_html;

/// Marker in the global template that the body fragment replaces
pub const BODY_PLACEHOLDER: &str = "<!-- BODY_CONTENT -->";

/// The shared outer document wrapping every template body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalTemplate {
    /// Full HTML document containing [`BODY_PLACEHOLDER`]
    #[serde(default)]
    pub html: String,
}

impl Default for GlobalTemplate {
    fn default() -> Self {
        Self::new(default_global_html())
    }
}

impl GlobalTemplate {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Wrap a body fragment in this document
    pub fn compose(&self, body_html: &str, style: Option<&StyleConfig>) -> String {
        compose_email(&self.html, body_html, style)
    }
}

/// Combine a global document and a body fragment into one HTML document
///
/// When `style` is given, style tokens are resolved in both inputs
/// independently before they are joined. The first body placeholder in the
/// global document is replaced by the body; if there is none the body is
/// appended to the global document instead.
pub fn compose_email(global_html: &str, body_html: &str, style: Option<&StyleConfig>) -> String {
    let (global, body): (Cow<'_, str>, Cow<'_, str>) = match style {
        Some(style) => (
            Cow::Owned(apply_style_tokens(global_html, style)),
            Cow::Owned(apply_style_tokens(body_html, style)),
        ),
        None => (Cow::Borrowed(global_html), Cow::Borrowed(body_html)),
    };

    if global.contains(BODY_PLACEHOLDER) {
        global.replacen(BODY_PLACEHOLDER, &body, 1)
    } else {
        let mut out = String::with_capacity(global.len() + body.len());
        out.push_str(&global);
        out.push_str(&body);
        out
    }
}

/// True when `global_html` carries the body placeholder
pub fn has_body_placeholder(global_html: &str) -> bool {
    global_html.contains(BODY_PLACEHOLDER)
}
