//! Catalog of built-in and custom template types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::variables::TemplateVariable;

/// Prefix marking user-defined template type ids
pub const CUSTOM_TYPE_PREFIX: &str = "custom-";

/// Errors that can occur during catalog operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Template type not found in the catalog
    #[error("template type not found: {id}")]
    NotFound { id: String },

    /// A type with the same id already exists
    #[error("duplicate template type id: {id}")]
    Duplicate { id: String },

    /// Built-in types cannot be removed or renamed
    #[error("built-in template type cannot be modified: {id}")]
    BuiltIn { id: String },

    /// A custom type must be marked as custom
    #[error("template type {id} is not a custom type")]
    NotCustom { id: String },

    /// A variable references a type id that does not exist
    #[error("variable {variable} references unknown template type {id}")]
    UnknownVariableTarget { variable: String, id: String },

    /// Id is not usable as a single path component
    #[error("invalid template type id {id:?}: only letters, digits, '-' and '_' are allowed")]
    InvalidId { id: String },

    /// No usable slug could be derived from the label
    #[error("cannot derive a template id from label {label:?}")]
    EmptyLabel { label: String },
}

/// Origin of a template type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateCategory {
    SupabaseAuth,
    Custom,
}

/// Metadata describing one template type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateTypeInfo {
    pub id: String,
    pub label: String,
    pub description: String,
    /// Icon name for the UI
    pub icon: String,
    /// Syntaxes of the variables applicable to this type
    #[serde(default)]
    pub variables: Vec<String>,
    pub category: TemplateCategory,
    pub is_built_in: bool,
}

/// Check if a template type id names a custom type
pub fn is_custom_type(id: &str) -> bool {
    id.starts_with(CUSTOM_TYPE_PREFIX)
}

/// Check that an id is non-empty and made of ASCII letters, digits, `-` and `_`
///
/// Ids are used as file and directory names on export and in storage.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Derive a custom type id from a display label
///
/// The label is lowercased, runs of characters outside `[a-z0-9]` collapse
/// into a single `-`, leading and trailing dashes are trimmed and the result
/// is prefixed with `custom-`.
pub fn custom_type_id(label: &str) -> Result<String, CatalogError> {
    let mut slug = String::with_capacity(label.len());
    let mut pending_dash = false;
    for c in label.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        return Err(CatalogError::EmptyLabel {
            label: label.to_string(),
        });
    }
    Ok(format!("{}{}", CUSTOM_TYPE_PREFIX, slug))
}

/// Built-in types (fixed) plus user-defined custom types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateCatalog {
    builtin: Vec<TemplateTypeInfo>,
    custom: Vec<TemplateTypeInfo>,
}

impl TemplateCatalog {
    /// Create a catalog with a fixed set of built-in types
    pub fn new(builtin: Vec<TemplateTypeInfo>) -> Self {
        Self {
            builtin,
            custom: Vec::new(),
        }
    }

    /// All types, built-ins first
    pub fn all(&self) -> impl Iterator<Item = &TemplateTypeInfo> {
        self.builtin.iter().chain(self.custom.iter())
    }

    pub fn builtin(&self) -> &[TemplateTypeInfo] {
        &self.builtin
    }

    pub fn custom(&self) -> &[TemplateTypeInfo] {
        &self.custom
    }

    /// Get a type by id
    pub fn get(&self, id: &str) -> Option<&TemplateTypeInfo> {
        self.all().find(|t| t.id == id)
    }

    /// Check if a type exists
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Get all type ids
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.all().map(|t| t.id.as_str())
    }

    /// Validate a custom type and its variables without registering them
    pub fn check_custom(
        &self,
        info: &TemplateTypeInfo,
        variables: &[TemplateVariable],
    ) -> Result<(), CatalogError> {
        if info.is_built_in
            || info.category != TemplateCategory::Custom
            || !is_custom_type(&info.id)
        {
            return Err(CatalogError::NotCustom {
                id: info.id.clone(),
            });
        }
        if !is_safe_id(&info.id) {
            return Err(CatalogError::InvalidId {
                id: info.id.clone(),
            });
        }
        if self.contains(&info.id) {
            return Err(CatalogError::Duplicate {
                id: info.id.clone(),
            });
        }
        for var in variables {
            if let Some(id) = var
                .available_for
                .iter()
                .find(|id| **id != info.id && !self.contains(id))
            {
                return Err(CatalogError::UnknownVariableTarget {
                    variable: var.name.clone(),
                    id: id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Register a custom type
    pub fn register_custom(&mut self, info: TemplateTypeInfo) -> Result<(), CatalogError> {
        self.check_custom(&info, &[])?;
        self.custom.push(info);
        Ok(())
    }

    /// Remove a custom type, returning its metadata
    pub fn remove_custom(&mut self, id: &str) -> Result<TemplateTypeInfo, CatalogError> {
        if self.builtin.iter().any(|t| t.id == id) {
            return Err(CatalogError::BuiltIn { id: id.to_string() });
        }
        let pos = self
            .custom
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CatalogError::NotFound { id: id.to_string() })?;
        Ok(self.custom.remove(pos))
    }

    /// Replace the custom types wholesale
    pub fn set_custom(&mut self, custom: Vec<TemplateTypeInfo>) {
        self.custom = custom;
    }
}

/// User input for a new custom template type
#[derive(Debug, Clone, Default)]
pub struct CustomTypeDraft {
    pub name: String,
    pub description: String,
    pub icon: String,
    /// (name, description) rows; rows with a blank name are skipped
    pub variables: Vec<(String, String)>,
}

impl CustomTypeDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.variables.push((name.into(), description.into()));
        self
    }

    /// Build the type metadata and its scoped variables
    pub fn build(&self) -> Result<(TemplateTypeInfo, Vec<TemplateVariable>), CatalogError> {
        let label = self.name.trim().to_string();
        let id = custom_type_id(&label)?;

        let description = match self.description.trim() {
            "" => format!("Custom template: {}", label),
            d => d.to_string(),
        };
        let icon = match self.icon.trim() {
            "" => "Mail".to_string(),
            i => i.to_string(),
        };

        let variables: Vec<TemplateVariable> = self
            .variables
            .iter()
            .filter(|(name, _)| !name.trim().is_empty())
            .map(|(name, desc)| {
                let name = name.trim();
                let desc = match desc.trim() {
                    "" => name,
                    d => d,
                };
                TemplateVariable::new(name, format!("{{{{{}}}}}", name), desc, vec![id.clone()])
            })
            .collect();

        let info = TemplateTypeInfo {
            id,
            label,
            description,
            icon,
            variables: variables.iter().map(|v| v.syntax.clone()).collect(),
            category: TemplateCategory::Custom,
            is_built_in: false,
        };

        Ok((info, variables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin(id: &str) -> TemplateTypeInfo {
        TemplateTypeInfo {
            id: id.to_string(),
            label: id.to_string(),
            description: String::new(),
            icon: "Mail".to_string(),
            variables: vec![],
            category: TemplateCategory::SupabaseAuth,
            is_built_in: true,
        }
    }

    #[test]
    fn test_custom_type_id_slug() {
        assert_eq!(custom_type_id("Welcome").unwrap(), "custom-welcome");
        assert_eq!(
            custom_type_id("  Order -- Shipped!! (v2) ").unwrap(),
            "custom-order-shipped-v2"
        );
        assert!(matches!(
            custom_type_id("!!!"),
            Err(CatalogError::EmptyLabel { .. })
        ));
    }

    #[test]
    fn test_register_duplicate_error() {
        let mut catalog = TemplateCatalog::new(vec![builtin("confirm-signup")]);
        let (info, _) = CustomTypeDraft::new("Welcome").build().unwrap();

        catalog
            .register_custom(info.clone())
            .expect("First register should succeed");
        let result = catalog.register_custom(info);
        assert!(matches!(result, Err(CatalogError::Duplicate { .. })));
    }

    #[test]
    fn test_builtin_cannot_be_removed() {
        let mut catalog = TemplateCatalog::new(vec![builtin("confirm-signup")]);
        let result = catalog.remove_custom("confirm-signup");
        assert!(matches!(result, Err(CatalogError::BuiltIn { .. })));
        assert!(catalog.contains("confirm-signup"));
    }

    #[test]
    fn test_variable_target_must_exist() {
        let catalog = TemplateCatalog::new(vec![builtin("confirm-signup")]);
        let (info, _) = CustomTypeDraft::new("Welcome").build().unwrap();
        let stray = TemplateVariable::new("X", "{{X}}", "X", vec!["custom-gone".to_string()]);
        let result = catalog.check_custom(&info, &[stray]);
        assert!(matches!(
            result,
            Err(CatalogError::UnknownVariableTarget { .. })
        ));
    }

    #[test]
    fn test_draft_defaults() {
        let (info, vars) = CustomTypeDraft::new(" Order Shipped ")
            .with_variable("TrackingURL", "")
            .with_variable("  ", "ignored")
            .with_variable("Carrier", "Shipping company")
            .build()
            .unwrap();

        assert_eq!(info.id, "custom-order-shipped");
        assert_eq!(info.label, "Order Shipped");
        assert_eq!(info.description, "Custom template: Order Shipped");
        assert_eq!(info.icon, "Mail");
        assert_eq!(info.variables, vec!["{{TrackingURL}}", "{{Carrier}}"]);
        assert!(!info.is_built_in);

        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].description, "TrackingURL");
        assert_eq!(vars[1].description, "Shipping company");
        assert_eq!(vars[1].available_for, vec!["custom-order-shipped".to_string()]);
    }

    #[test]
    fn test_custom_ids_must_be_prefixed_and_safe() {
        let catalog = TemplateCatalog::new(vec![builtin("confirm-signup")]);
        let (mut info, _) = CustomTypeDraft::new("Welcome").build().unwrap();

        info.id = "welcome".to_string();
        assert!(matches!(
            catalog.check_custom(&info, &[]),
            Err(CatalogError::NotCustom { .. })
        ));

        info.id = "custom-../x".to_string();
        assert!(matches!(
            catalog.check_custom(&info, &[]),
            Err(CatalogError::InvalidId { .. })
        ));
    }

    #[test]
    fn test_is_safe_id() {
        assert!(is_safe_id("variant-0191_ab"));
        assert!(!is_safe_id(""));
        assert!(!is_safe_id("../tmp"));
        assert!(!is_safe_id("a/b"));
    }

    #[test]
    fn test_ids_lists_builtin_then_custom() {
        let mut catalog = TemplateCatalog::new(vec![builtin("confirm-signup")]);
        let (info, _) = CustomTypeDraft::new("Welcome").build().unwrap();
        catalog.register_custom(info).unwrap();
        let ids: Vec<&str> = catalog.ids().collect();
        assert_eq!(ids, vec!["confirm-signup", "custom-welcome"]);
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&TemplateCategory::SupabaseAuth).unwrap();
        assert_eq!(json, "\"supabase-auth\"");
    }
}
