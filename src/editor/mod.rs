//! Editor state machine
//!
//! [`EditorState`] owns every mutable entity of a project: the selection,
//! the global template, the style, the per-type templates with their active
//! variant ids, and the custom part of the catalog and variable registry.
//! All mutation goes through its named operations; variant edits are routed
//! through a [`VariantStore`] so the template mirror never drifts.

mod export;

pub use export::{ExportEntry, ExportFormat, HtmlExport, PlainTextConverter};

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::persistence::{timestamp_now, PersistedData, PersistenceError, PERSISTED_VERSION};
use crate::stylesheet::{StyleConfig, StylePatch};
use crate::template::builtin::{
    builtin_template_types, builtin_variables, custom_type_template, DEFAULT_TEMPLATE_TYPE,
};
use crate::template::{
    CatalogError, EmailTemplate, GlobalTemplate, TemplateCatalog, TemplateTypeInfo,
    TemplateVariable, TemplateVariant, VariableRegistry, VariantStore, DEFAULT_VARIANT_ID,
};

/// Errors that can occur during editor operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    /// Template type id not present in the catalog
    #[error("unknown template type: {id}")]
    UnknownType { id: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Plain-text export requested without a converter
    #[error("plain-text export requires a converter")]
    ConverterRequired,

    /// Type or variant id that cannot be used as a path component
    #[error("refusing to export to unsafe path {path:?}")]
    UnsafePath { path: String },
}

/// Live editing state of one project
#[derive(Debug, Clone)]
pub struct EditorState {
    selected_type: String,
    editing_global: bool,
    global_template: GlobalTemplate,
    template_style: StyleConfig,
    templates: Vec<EmailTemplate>,
    active_variant_ids: BTreeMap<String, String>,
    catalog: TemplateCatalog,
    variables: VariableRegistry,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::from_persisted(crate::persistence::default_persisted_data())
    }
}

impl EditorState {
    /// Start editing a snapshot
    pub fn from_persisted(data: PersistedData) -> Self {
        let mut state = Self {
            selected_type: DEFAULT_TEMPLATE_TYPE.to_string(),
            editing_global: false,
            global_template: GlobalTemplate::default(),
            template_style: StyleConfig::default(),
            templates: Vec::new(),
            active_variant_ids: BTreeMap::new(),
            catalog: TemplateCatalog::new(builtin_template_types()),
            variables: VariableRegistry::new(builtin_variables()),
        };
        state.apply_persisted_data(data);
        state
    }

    pub fn selected_type(&self) -> &str {
        &self.selected_type
    }

    pub fn is_editing_global(&self) -> bool {
        self.editing_global
    }

    pub fn global_template(&self) -> &GlobalTemplate {
        &self.global_template
    }

    pub fn template_style(&self) -> &StyleConfig {
        &self.template_style
    }

    pub fn templates(&self) -> &[EmailTemplate] {
        &self.templates
    }

    pub fn active_variant_ids(&self) -> &BTreeMap<String, String> {
        &self.active_variant_ids
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn variables(&self) -> &VariableRegistry {
        &self.variables
    }

    // Derived values

    pub fn template(&self, type_id: &str) -> Option<&EmailTemplate> {
        self.templates.iter().find(|t| t.template_type() == type_id)
    }

    /// Template of the selected type
    pub fn current_template(&self) -> Option<&EmailTemplate> {
        self.template(&self.selected_type)
    }

    /// Active variant of the selected type
    pub fn active_variant(&self) -> Option<&TemplateVariant> {
        let template = self.current_template()?;
        let active = self
            .active_variant_ids
            .get(&self.selected_type)
            .map(String::as_str)
            .unwrap_or_default();
        template.resolve_active(active)
    }

    pub fn active_variant_id(&self) -> Option<&str> {
        self.active_variant().map(|v| v.id.as_str())
    }

    /// The selected template's body inside the global document, styles resolved
    pub fn composed_html(&self) -> String {
        let body = self.current_template().map(EmailTemplate::body_html).unwrap_or_default();
        self.global_template.compose(body, Some(&self.template_style))
    }

    /// Number of variants per template type
    pub fn variant_counts(&self) -> BTreeMap<String, usize> {
        self.templates
            .iter()
            .map(|t| (t.template_type().to_string(), t.variants().len()))
            .collect()
    }

    pub fn all_template_types(&self) -> Vec<&TemplateTypeInfo> {
        self.catalog.all().collect()
    }

    pub fn all_variables(&self) -> Vec<&TemplateVariable> {
        self.variables.all().collect()
    }

    /// Variables applicable to the selected type
    pub fn variables_for_selected(&self) -> Vec<&TemplateVariable> {
        self.variables.for_type(&self.selected_type).collect()
    }

    // Selection

    /// Select a template type and leave global editing
    pub fn change_type(&mut self, type_id: &str) -> Result<(), EditorError> {
        if !self.catalog.contains(type_id) {
            return Err(EditorError::UnknownType {
                id: type_id.to_string(),
            });
        }
        debug!(template_type = %type_id, "changed template type");
        self.selected_type = type_id.to_string();
        self.editing_global = false;
        Ok(())
    }

    /// Redirect body edits to the global template; the selected type is kept
    pub fn edit_global(&mut self) {
        self.editing_global = true;
    }

    // Content edits

    pub fn set_global_html(&mut self, html: impl Into<String>) {
        self.global_template.html = html.into();
    }

    /// Edit the body of whatever is being edited
    pub fn set_body_html(&mut self, html: impl Into<String>) {
        if self.editing_global {
            self.set_global_html(html);
            return;
        }
        match self.current_store() {
            Some(mut store) => store.set_body_html(html),
            None => warn!(template_type = %self.selected_type, "no template to edit"),
        }
    }

    /// Edit the subject of the active variant; ignored in global mode
    pub fn set_subject(&mut self, subject: impl Into<String>) {
        if self.editing_global {
            debug!("global template has no subject, ignoring edit");
            return;
        }
        match self.current_store() {
            Some(mut store) => store.set_subject(subject),
            None => warn!(template_type = %self.selected_type, "no template to edit"),
        }
    }

    // Variants of the selected type

    fn current_store(&mut self) -> Option<VariantStore<'_>> {
        let Self {
            selected_type,
            templates,
            active_variant_ids,
            ..
        } = self;
        let template = templates
            .iter_mut()
            .find(|t| t.template_type() == selected_type.as_str())?;
        let active = active_variant_ids.entry(selected_type.clone()).or_default();
        Some(VariantStore::new(template, active))
    }

    /// Activate a variant; an unknown id activates the first one
    ///
    /// Returns the id that ended up active.
    pub fn select_variant(&mut self, variant_id: &str) -> Option<String> {
        let mut store = self.current_store()?;
        Some(store.select(variant_id).to_string())
    }

    /// Clone the active variant into a new active variant, returning its id
    pub fn create_variant(&mut self) -> Option<String> {
        let mut store = self.current_store()?;
        Some(store.create().id.clone())
    }

    /// Clone any variant into a new active variant, returning its id
    pub fn duplicate_variant(&mut self, source_id: &str) -> Option<String> {
        let mut store = self.current_store()?;
        store.duplicate(source_id).map(|v| v.id.clone())
    }

    /// Remove a variant; the last one is kept
    pub fn delete_variant(&mut self, variant_id: &str) -> bool {
        self.current_store()
            .map(|mut store| store.delete(variant_id))
            .unwrap_or(false)
    }

    pub fn rename_variant(&mut self, variant_id: &str, name: impl Into<String>) -> bool {
        self.current_store()
            .map(|mut store| store.rename(variant_id, name))
            .unwrap_or(false)
    }

    // Style

    /// Merge a partial style update; unspecified fields keep their value
    pub fn update_style(&mut self, patch: &StylePatch) {
        self.template_style.apply(patch);
        for token in self.template_style.tokens_with_nested_values() {
            warn!(
                field = token.field_name(),
                "style value contains token text and will be inserted verbatim"
            );
        }
    }

    /// Restore every style field to its default
    pub fn reset_style(&mut self) {
        self.template_style = StyleConfig::default();
    }

    // Custom types

    /// Add a custom type with its variables and select it
    ///
    /// The new type gets a template with a single `default` variant built
    /// from the type's label and description.
    pub fn add_custom_template_type(
        &mut self,
        info: TemplateTypeInfo,
        variables: Vec<TemplateVariable>,
    ) -> Result<(), EditorError> {
        self.catalog.check_custom(&info, &variables)?;
        if self.template(&info.id).is_some() {
            return Err(CatalogError::Duplicate { id: info.id }.into());
        }

        let template = custom_type_template(&info);
        let id = info.id.clone();
        self.catalog.register_custom(info)?;

        self.templates.push(template);
        self.active_variant_ids
            .insert(id.clone(), DEFAULT_VARIANT_ID.to_string());
        self.variables.extend_custom(variables);
        info!(template_type = %id, "added custom template type");

        self.selected_type = id;
        self.editing_global = false;
        Ok(())
    }

    /// Remove a custom type together with its template
    ///
    /// Custom variables lose the type from their `available_for` and are
    /// dropped once available nowhere. If the type was selected, the
    /// default type is selected instead.
    pub fn delete_custom_template_type(&mut self, type_id: &str) -> Result<(), EditorError> {
        self.catalog.remove_custom(type_id)?;
        let dropped = self.variables.detach_type(type_id);
        self.templates.retain(|t| t.template_type() != type_id);
        self.active_variant_ids.remove(type_id);

        if self.selected_type == type_id {
            self.selected_type = DEFAULT_TEMPLATE_TYPE.to_string();
            self.editing_global = false;
        }
        info!(template_type = %type_id, dropped_variables = dropped, "deleted custom template type");
        Ok(())
    }

    // Persistence

    /// Snapshot of the persisted collections
    pub fn get_persisted_data(&self) -> PersistedData {
        PersistedData {
            version: PERSISTED_VERSION,
            last_modified: timestamp_now(),
            templates: self.templates.clone(),
            global_template: self.global_template.clone(),
            template_style: self.template_style.clone(),
            custom_template_types: self.catalog.custom().to_vec(),
            custom_variables: self.variables.custom().to_vec(),
            active_variant_ids: self.active_variant_ids.clone(),
        }
    }

    /// Replace every persisted collection with the snapshot's contents
    ///
    /// The snapshot is sanitized first. When the selected type no longer
    /// exists, selection moves to the snapshot's initial type.
    pub fn apply_persisted_data(&mut self, mut data: PersistedData) {
        data.sanitize();
        let initial = data.initial_type().to_string();

        self.templates = data.templates;
        self.global_template = data.global_template;
        self.template_style = data.template_style;
        self.catalog.set_custom(data.custom_template_types);
        self.variables.set_custom(data.custom_variables);
        self.active_variant_ids = data.active_variant_ids;

        if self.current_template().is_none() {
            self.selected_type = initial;
            self.editing_global = false;
        }
    }

    /// Import a JSON document; on failure nothing is changed
    pub fn import_json(&mut self, text: &str) -> Result<(), PersistenceError> {
        let data = PersistedData::from_json_str(text)?;
        self.apply_persisted_data(data);
        info!("imported project data");
        Ok(())
    }

    /// Pretty JSON of the current snapshot
    pub fn export_json(&self) -> Result<String, PersistenceError> {
        self.get_persisted_data().to_json_pretty()
    }
}
