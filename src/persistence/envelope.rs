//! Versioned snapshot of the full editor state
//!
//! [`PersistedData`] is the unit of save, load, export and import. Untrusted
//! input goes through three steps: a shallow shape check
//! ([`is_valid_persisted_data`]), typed decoding, and [`PersistedData::sanitize`]
//! which restores the variant invariants nested data may violate.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::stylesheet::StyleConfig;
use crate::template::builtin::{
    builtin_template_types, builtin_templates, custom_type_template, DEFAULT_TEMPLATE_TYPE,
};
use crate::template::{
    EmailTemplate, GlobalTemplate, TemplateCatalog, TemplateTypeInfo, TemplateVariable,
};

use super::error::PersistenceError;

/// The only envelope version understood
pub const PERSISTED_VERSION: u64 = 1;

/// Snapshot of everything the editor persists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedData {
    pub version: u64,
    /// RFC 3339 UTC timestamp of when the snapshot was taken
    pub last_modified: String,
    pub templates: Vec<EmailTemplate>,
    pub global_template: GlobalTemplate,
    pub template_style: StyleConfig,
    pub custom_template_types: Vec<TemplateTypeInfo>,
    pub custom_variables: Vec<TemplateVariable>,
    /// Template type id -> active variant id
    pub active_variant_ids: BTreeMap<String, String>,
}

/// Current time in the envelope's timestamp format
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// File name for a JSON export taken at `now`
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("email-templates-{}.json", now.format("%Y-%m-%d-%H%M%S"))
}

/// Check the top-level shape of untrusted data
///
/// Only presence and JSON type of each field are checked; nested templates
/// are not inspected.
pub fn check_shape(data: &Value) -> Result<(), PersistenceError> {
    let obj = data
        .as_object()
        .ok_or(PersistenceError::InvalidShape { field: "<root>" })?;

    let checks: [(&'static str, fn(&Value) -> bool); 8] = [
        ("version", |v| v.as_u64() == Some(PERSISTED_VERSION)),
        ("lastModified", Value::is_string),
        ("templates", Value::is_array),
        ("globalTemplate", Value::is_object),
        ("templateStyle", Value::is_object),
        ("customTemplateTypes", Value::is_array),
        ("customVariables", Value::is_array),
        ("activeVariantIds", Value::is_object),
    ];

    for (field, check) in checks {
        match obj.get(field) {
            Some(value) if check(value) => {}
            _ => return Err(PersistenceError::InvalidShape { field }),
        }
    }
    Ok(())
}

/// Structural guard for untrusted persisted data
pub fn is_valid_persisted_data(data: &Value) -> bool {
    check_shape(data).is_ok()
}

/// The dataset a brand new project starts from
pub fn default_persisted_data() -> PersistedData {
    let templates = builtin_templates();
    let active_variant_ids = templates
        .iter()
        .filter_map(|t| {
            t.variants()
                .first()
                .map(|v| (t.template_type().to_string(), v.id.clone()))
        })
        .collect();

    PersistedData {
        version: PERSISTED_VERSION,
        last_modified: timestamp_now(),
        templates,
        global_template: GlobalTemplate::default(),
        template_style: StyleConfig::default(),
        custom_template_types: Vec::new(),
        custom_variables: Vec::new(),
        active_variant_ids,
    }
}

impl PersistedData {
    /// Accept untrusted JSON data
    ///
    /// Rejects data failing the shape check or nested decoding, then
    /// sanitizes what was accepted.
    pub fn from_value(value: Value) -> Result<Self, PersistenceError> {
        check_shape(&value)?;
        let mut data: PersistedData =
            serde_json::from_value(value).map_err(PersistenceError::Malformed)?;
        let repaired = data.sanitize();
        if repaired > 0 {
            warn!(repaired, "repaired inconsistent templates in imported data");
        }
        Ok(data)
    }

    /// Parse and accept an imported JSON document
    pub fn from_json_str(text: &str) -> Result<Self, PersistenceError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Pretty-printed JSON for file export
    pub fn to_json_pretty(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_value(&self) -> Result<Value, PersistenceError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Reconcile the snapshot with the catalog and restore per-template invariants
    ///
    /// Custom types that are not prefixed, have unsafe ids or collide with
    /// a built-in or earlier type are dropped. Templates of unknown or
    /// repeated types are dropped, and every known type without a template
    /// gets its starter template. Variant ids that are unsafe path components
    /// or repeated are replaced. Every template ends up with at least one
    /// variant, an active id that names one of its variants, and a
    /// subject/body mirror equal to that variant. Active ids and custom
    /// variable targets of unknown types are dropped. Returns the number of
    /// entries changed; well-formed data is left untouched.
    pub fn sanitize(&mut self) -> usize {
        let mut repaired = 0;

        let mut catalog = TemplateCatalog::new(builtin_template_types());
        for info in std::mem::take(&mut self.custom_template_types) {
            let id = info.id.clone();
            if let Err(e) = catalog.register_custom(info) {
                warn!(template_type = %id, error = %e, "dropped imported custom type");
                repaired += 1;
            }
        }
        self.custom_template_types = catalog.custom().to_vec();

        let mut seen = HashSet::new();
        let before = self.templates.len();
        self.templates.retain(|t| {
            catalog.contains(t.template_type()) && seen.insert(t.template_type().to_string())
        });
        repaired += before - self.templates.len();

        let mut starters = builtin_templates();
        for id in catalog.ids() {
            if seen.contains(id) {
                continue;
            }
            let template = match starters.iter().position(|t| t.template_type() == id) {
                Some(pos) => starters.swap_remove(pos),
                None => match catalog.get(id) {
                    Some(info) => custom_type_template(info),
                    None => continue,
                },
            };
            self.templates.push(template);
            repaired += 1;
        }

        let before = self.active_variant_ids.len();
        self.active_variant_ids
            .retain(|type_id, _| catalog.contains(type_id));
        repaired += before - self.active_variant_ids.len();

        for template in &mut self.templates {
            let active = self
                .active_variant_ids
                .entry(template.template_type().to_string())
                .or_default();
            repaired += template.reassign_unsafe_ids(active);
            if template.repair(active) {
                repaired += 1;
            }
        }

        self.custom_variables.retain_mut(|var| {
            let targets = var.available_for.len();
            var.available_for.retain(|id| catalog.contains(id));
            if var.available_for.len() == targets {
                return true;
            }
            repaired += 1;
            !var.available_for.is_empty()
        });

        repaired
    }

    /// Type to select after loading: the default type when present
    pub fn initial_type(&self) -> &str {
        if self
            .templates
            .iter()
            .any(|t| t.template_type() == DEFAULT_TEMPLATE_TYPE)
        {
            return DEFAULT_TEMPLATE_TYPE;
        }
        self.templates
            .first()
            .map(|t| t.template_type())
            .unwrap_or(DEFAULT_TEMPLATE_TYPE)
    }
}
