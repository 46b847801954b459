//! Author-facing template variables
//!
//! Variables such as `{{ .ConfirmationURL }}` are left in the HTML for the
//! downstream email system to fill in. They are never substituted here; the
//! registry only answers which variables apply to a template type.

use serde::{Deserialize, Serialize};

/// A named placeholder offered for insertion into a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVariable {
    pub name: String,
    /// Literal text inserted into the template, e.g. `{{ .Email }}`
    pub syntax: String,
    pub description: String,
    /// Template type ids this variable applies to
    pub available_for: Vec<String>,
}

impl TemplateVariable {
    pub fn new(
        name: impl Into<String>,
        syntax: impl Into<String>,
        description: impl Into<String>,
        available_for: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            syntax: syntax.into(),
            description: description.into(),
            available_for,
        }
    }

    /// Check if this variable applies to a template type
    pub fn is_available_for(&self, type_id: &str) -> bool {
        self.available_for.iter().any(|id| id == type_id)
    }
}

/// Built-in and custom variables
///
/// Duplicate syntaxes are tolerated; lookups return every match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableRegistry {
    builtin: Vec<TemplateVariable>,
    custom: Vec<TemplateVariable>,
}

impl VariableRegistry {
    /// Create a registry with a fixed set of built-in variables
    pub fn new(builtin: Vec<TemplateVariable>) -> Self {
        Self {
            builtin,
            custom: Vec::new(),
        }
    }

    /// All variables, built-ins first
    pub fn all(&self) -> impl Iterator<Item = &TemplateVariable> {
        self.builtin.iter().chain(self.custom.iter())
    }

    /// Variables applicable to a template type, for display and autocomplete
    pub fn for_type<'a>(&'a self, type_id: &'a str) -> impl Iterator<Item = &'a TemplateVariable> + 'a {
        self.all().filter(move |v| v.is_available_for(type_id))
    }

    pub fn builtin(&self) -> &[TemplateVariable] {
        &self.builtin
    }

    pub fn custom(&self) -> &[TemplateVariable] {
        &self.custom
    }

    /// Append custom variables
    pub fn extend_custom(&mut self, variables: impl IntoIterator<Item = TemplateVariable>) {
        self.custom.extend(variables);
    }

    /// Replace the custom variables wholesale
    pub fn set_custom(&mut self, variables: Vec<TemplateVariable>) {
        self.custom = variables;
    }

    /// Detach a template type from custom variables
    ///
    /// The id is removed from each custom variable's `available_for`, and
    /// variables no longer available anywhere are dropped. Returns the
    /// number of variables dropped.
    pub fn detach_type(&mut self, type_id: &str) -> usize {
        let before = self.custom.len();
        for var in &mut self.custom {
            var.available_for.retain(|id| id != type_id);
        }
        self.custom.retain(|v| !v.available_for.is_empty());
        before - self.custom.len()
    }
}
