//! Style tokens for brand-wide email styling
//!
//! Templates refer to brand colors, sizes and fonts through a closed set of
//! `{{STYLE_X}}` tokens. A [`StyleConfig`] supplies the concrete values and
//! [`apply_style_tokens`] substitutes them into arbitrary HTML text.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading style overrides
#[derive(Error, Debug)]
pub enum StyleError {
    #[error("Failed to read style file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse style TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Common prefix of every style token
const TOKEN_OPEN: &str = "{{STYLE_";

/// Brand and layout values substituted into templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleConfig {
    pub brand_name: String,
    pub brand_color: String,
    pub background_color: String,
    pub container_background: String,
    pub heading_color: String,
    pub body_color: String,
    pub footer_color: String,
    pub footer_link_color: String,
    pub button_background: String,
    pub button_text_color: String,
    pub button_radius: String,
    pub container_radius: String,
    pub font_family: String,
    pub heading_size: String,
    pub body_size: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            brand_name: "YourApp".to_string(),
            brand_color: "#18181b".to_string(),
            background_color: "#f4f4f5".to_string(),
            container_background: "#ffffff".to_string(),
            heading_color: "#18181b".to_string(),
            body_color: "#52525b".to_string(),
            footer_color: "#a1a1aa".to_string(),
            footer_link_color: "#71717a".to_string(),
            button_background: "#18181b".to_string(),
            button_text_color: "#ffffff".to_string(),
            button_radius: "8px".to_string(),
            container_radius: "12px".to_string(),
            font_family: "'Helvetica Neue', Helvetica, Arial, sans-serif".to_string(),
            heading_size: "24px".to_string(),
            body_size: "15px".to_string(),
        }
    }
}

impl StyleConfig {
    /// Load style overrides from a TOML file, on top of the defaults
    pub fn from_file(path: &Path) -> Result<Self, StyleError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load style overrides from a TOML string, on top of the defaults
    ///
    /// Fields may be spelled in camelCase (`buttonRadius`) or snake_case
    /// (`button_radius`). Missing fields keep their default value.
    pub fn from_toml_str(content: &str) -> Result<Self, StyleError> {
        let patch: StylePatch = toml::from_str(content)?;
        Ok(Self::default().merged(&patch))
    }

    /// Current value of a token's field
    pub fn value(&self, token: StyleToken) -> &str {
        match token {
            StyleToken::BrandName => &self.brand_name,
            StyleToken::BrandColor => &self.brand_color,
            StyleToken::BackgroundColor => &self.background_color,
            StyleToken::ContainerBackground => &self.container_background,
            StyleToken::HeadingColor => &self.heading_color,
            StyleToken::BodyColor => &self.body_color,
            StyleToken::FooterColor => &self.footer_color,
            StyleToken::FooterLinkColor => &self.footer_link_color,
            StyleToken::ButtonBackground => &self.button_background,
            StyleToken::ButtonTextColor => &self.button_text_color,
            StyleToken::ButtonRadius => &self.button_radius,
            StyleToken::ContainerRadius => &self.container_radius,
            StyleToken::FontFamily => &self.font_family,
            StyleToken::HeadingSize => &self.heading_size,
            StyleToken::BodySize => &self.body_size,
        }
    }

    /// Apply a partial update; fields absent from `patch` keep their value
    pub fn apply(&mut self, patch: &StylePatch) {
        let pairs: [(&mut String, &Option<String>); 15] = [
            (&mut self.brand_name, &patch.brand_name),
            (&mut self.brand_color, &patch.brand_color),
            (&mut self.background_color, &patch.background_color),
            (&mut self.container_background, &patch.container_background),
            (&mut self.heading_color, &patch.heading_color),
            (&mut self.body_color, &patch.body_color),
            (&mut self.footer_color, &patch.footer_color),
            (&mut self.footer_link_color, &patch.footer_link_color),
            (&mut self.button_background, &patch.button_background),
            (&mut self.button_text_color, &patch.button_text_color),
            (&mut self.button_radius, &patch.button_radius),
            (&mut self.container_radius, &patch.container_radius),
            (&mut self.font_family, &patch.font_family),
            (&mut self.heading_size, &patch.heading_size),
            (&mut self.body_size, &patch.body_size),
        ];
        for (field, update) in pairs {
            if let Some(value) = update {
                field.clone_from(value);
            }
        }
    }

    /// Builder-style variant of [`StyleConfig::apply`]
    pub fn merged(mut self, patch: &StylePatch) -> Self {
        self.apply(patch);
        self
    }

    /// Tokens whose field value itself contains a style token
    ///
    /// Such values are inserted verbatim by [`apply_style_tokens`], so the
    /// result still carries token text after substitution.
    pub fn tokens_with_nested_values(&self) -> Vec<StyleToken> {
        StyleToken::ALL
            .iter()
            .copied()
            .filter(|t| self.value(*t).contains(TOKEN_OPEN))
            .collect()
    }
}

/// Partial style update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StylePatch {
    #[serde(alias = "brand_name", skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(alias = "brand_color", skip_serializing_if = "Option::is_none")]
    pub brand_color: Option<String>,
    #[serde(alias = "background_color", skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(alias = "container_background", skip_serializing_if = "Option::is_none")]
    pub container_background: Option<String>,
    #[serde(alias = "heading_color", skip_serializing_if = "Option::is_none")]
    pub heading_color: Option<String>,
    #[serde(alias = "body_color", skip_serializing_if = "Option::is_none")]
    pub body_color: Option<String>,
    #[serde(alias = "footer_color", skip_serializing_if = "Option::is_none")]
    pub footer_color: Option<String>,
    #[serde(alias = "footer_link_color", skip_serializing_if = "Option::is_none")]
    pub footer_link_color: Option<String>,
    #[serde(alias = "button_background", skip_serializing_if = "Option::is_none")]
    pub button_background: Option<String>,
    #[serde(alias = "button_text_color", skip_serializing_if = "Option::is_none")]
    pub button_text_color: Option<String>,
    #[serde(alias = "button_radius", skip_serializing_if = "Option::is_none")]
    pub button_radius: Option<String>,
    #[serde(alias = "container_radius", skip_serializing_if = "Option::is_none")]
    pub container_radius: Option<String>,
    #[serde(alias = "font_family", skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(alias = "heading_size", skip_serializing_if = "Option::is_none")]
    pub heading_size: Option<String>,
    #[serde(alias = "body_size", skip_serializing_if = "Option::is_none")]
    pub body_size: Option<String>,
}

impl StylePatch {
    /// Create an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a patch from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, StyleError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, StyleError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the value for a single token's field
    pub fn with(mut self, token: StyleToken, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match token {
            StyleToken::BrandName => self.brand_name = value,
            StyleToken::BrandColor => self.brand_color = value,
            StyleToken::BackgroundColor => self.background_color = value,
            StyleToken::ContainerBackground => self.container_background = value,
            StyleToken::HeadingColor => self.heading_color = value,
            StyleToken::BodyColor => self.body_color = value,
            StyleToken::FooterColor => self.footer_color = value,
            StyleToken::FooterLinkColor => self.footer_link_color = value,
            StyleToken::ButtonBackground => self.button_background = value,
            StyleToken::ButtonTextColor => self.button_text_color = value,
            StyleToken::ButtonRadius => self.button_radius = value,
            StyleToken::ContainerRadius => self.container_radius = value,
            StyleToken::FontFamily => self.font_family = value,
            StyleToken::HeadingSize => self.heading_size = value,
            StyleToken::BodySize => self.body_size = value,
        }
        self
    }

    /// True when the patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The closed set of style tokens recognized in template HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleToken {
    BrandName,
    BrandColor,
    BackgroundColor,
    ContainerBackground,
    HeadingColor,
    BodyColor,
    FooterColor,
    FooterLinkColor,
    ButtonBackground,
    ButtonTextColor,
    ButtonRadius,
    ContainerRadius,
    FontFamily,
    HeadingSize,
    BodySize,
}

impl StyleToken {
    pub const ALL: [StyleToken; 15] = [
        StyleToken::BrandName,
        StyleToken::BrandColor,
        StyleToken::BackgroundColor,
        StyleToken::ContainerBackground,
        StyleToken::HeadingColor,
        StyleToken::BodyColor,
        StyleToken::FooterColor,
        StyleToken::FooterLinkColor,
        StyleToken::ButtonBackground,
        StyleToken::ButtonTextColor,
        StyleToken::ButtonRadius,
        StyleToken::ContainerRadius,
        StyleToken::FontFamily,
        StyleToken::HeadingSize,
        StyleToken::BodySize,
    ];

    /// The literal token text as it appears in HTML
    pub fn token(self) -> &'static str {
        match self {
            StyleToken::BrandName => "{{STYLE_BRAND_NAME}}",
            StyleToken::BrandColor => "{{STYLE_BRAND_COLOR}}",
            StyleToken::BackgroundColor => "{{STYLE_BG_COLOR}}",
            StyleToken::ContainerBackground => "{{STYLE_CONTAINER_BG}}",
            StyleToken::HeadingColor => "{{STYLE_HEADING_COLOR}}",
            StyleToken::BodyColor => "{{STYLE_BODY_COLOR}}",
            StyleToken::FooterColor => "{{STYLE_FOOTER_COLOR}}",
            StyleToken::FooterLinkColor => "{{STYLE_FOOTER_LINK_COLOR}}",
            StyleToken::ButtonBackground => "{{STYLE_BUTTON_BG}}",
            StyleToken::ButtonTextColor => "{{STYLE_BUTTON_TEXT}}",
            StyleToken::ButtonRadius => "{{STYLE_BUTTON_RADIUS}}",
            StyleToken::ContainerRadius => "{{STYLE_CONTAINER_RADIUS}}",
            StyleToken::FontFamily => "{{STYLE_FONT_FAMILY}}",
            StyleToken::HeadingSize => "{{STYLE_HEADING_SIZE}}",
            StyleToken::BodySize => "{{STYLE_BODY_SIZE}}",
        }
    }

    /// Name of the [`StyleConfig`] field in the persisted format
    pub fn field_name(self) -> &'static str {
        match self {
            StyleToken::BrandName => "brandName",
            StyleToken::BrandColor => "brandColor",
            StyleToken::BackgroundColor => "backgroundColor",
            StyleToken::ContainerBackground => "containerBackground",
            StyleToken::HeadingColor => "headingColor",
            StyleToken::BodyColor => "bodyColor",
            StyleToken::FooterColor => "footerColor",
            StyleToken::FooterLinkColor => "footerLinkColor",
            StyleToken::ButtonBackground => "buttonBackground",
            StyleToken::ButtonTextColor => "buttonTextColor",
            StyleToken::ButtonRadius => "buttonRadius",
            StyleToken::ContainerRadius => "containerRadius",
            StyleToken::FontFamily => "fontFamily",
            StyleToken::HeadingSize => "headingSize",
            StyleToken::BodySize => "bodySize",
        }
    }

    /// Human-readable name for listings
    pub fn label(self) -> &'static str {
        match self {
            StyleToken::BrandName => "Brand name",
            StyleToken::BrandColor => "Brand color",
            StyleToken::BackgroundColor => "Background color",
            StyleToken::ContainerBackground => "Container background",
            StyleToken::HeadingColor => "Heading color",
            StyleToken::BodyColor => "Body text color",
            StyleToken::FooterColor => "Footer text color",
            StyleToken::FooterLinkColor => "Footer link color",
            StyleToken::ButtonBackground => "Button background",
            StyleToken::ButtonTextColor => "Button text color",
            StyleToken::ButtonRadius => "Button radius",
            StyleToken::ContainerRadius => "Container radius",
            StyleToken::FontFamily => "Font family",
            StyleToken::HeadingSize => "Heading size",
            StyleToken::BodySize => "Body text size",
        }
    }

    /// Look up a token by its literal text
    pub fn from_token(text: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.token() == text)
    }
}

/// Substitute every style token in `html` with its value from `style`
///
/// This is a single left-to-right pass over the input. Substituted values are
/// copied verbatim and never rescanned, so a value that happens to contain
/// token text is not expanded again. Unknown `{{STYLE_...}}` text is kept.
pub fn apply_style_tokens(html: &str, style: &StyleConfig) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(pos) = rest.find(TOKEN_OPEN) {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        match StyleToken::ALL
            .iter()
            .find(|t| candidate.starts_with(t.token()))
        {
            Some(token) => {
                out.push_str(style.value(*token));
                rest = &candidate[token.token().len()..];
            }
            None => {
                out.push_str(TOKEN_OPEN);
                rest = &candidate[TOKEN_OPEN.len()..];
            }
        }
    }

    out.push_str(rest);
    out
}
