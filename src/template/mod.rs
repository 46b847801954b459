//! Template types, variants and composition
//!
//! This module holds the data model the editor works on:
//!
//! - the catalog of built-in and custom template types,
//! - the author-facing variable registry,
//! - per-type templates with their named variants,
//! - composition of the global wrapper document with a body fragment.
//!
//! # Example
//!
//! ```
//! use mailsmith::template::{compose_email, BODY_PLACEHOLDER};
//! use mailsmith::StyleConfig;
//!
//! let global = format!("<main>{}</main>", BODY_PLACEHOLDER);
//! let html = compose_email(&global, "<h1>{{STYLE_BRAND_NAME}}</h1>", Some(&StyleConfig::default()));
//! assert_eq!(html, "<main><h1>YourApp</h1></main>");
//! ```

pub mod builtin;
mod catalog;
mod composer;
mod variables;
mod variants;

pub use catalog::{
    custom_type_id, is_custom_type, is_safe_id, CatalogError, CustomTypeDraft, TemplateCatalog,
    TemplateCategory, TemplateTypeInfo, CUSTOM_TYPE_PREFIX,
};
pub use composer::{compose_email, has_body_placeholder, GlobalTemplate, BODY_PLACEHOLDER};
pub use variables::{TemplateVariable, VariableRegistry};
pub use variants::{
    fresh_variant_id, EmailTemplate, TemplateVariant, VariantStore, DEFAULT_VARIANT_ID,
};
