//! Per-type email templates and their named variants
//!
//! Each [`EmailTemplate`] keeps an ordered, non-empty list of variants. The
//! id of the active variant lives outside the template (in the editor's
//! active-variant map); [`VariantStore`] borrows both and is the only place
//! that mutates variants, so the template-level `subject`/`body_html` mirror
//! always matches the active variant.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::catalog::is_safe_id;

/// Id given to the first variant of a freshly created template
pub const DEFAULT_VARIANT_ID: &str = "default";

/// One alternate subject + body design within a template type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVariant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub body_html: String,
    #[serde(default)]
    pub subject: String,
}

impl TemplateVariant {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        subject: impl Into<String>,
        body_html: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            body_html: body_html.into(),
            subject: subject.into(),
        }
    }
}

/// Generate a fresh, time-ordered variant id
pub fn fresh_variant_id() -> String {
    format!("variant-{}", Uuid::now_v7().simple())
}

/// The template for one template type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    #[serde(rename = "type")]
    template_type: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    body_html: String,
    #[serde(default)]
    variants: Vec<TemplateVariant>,
}

impl EmailTemplate {
    /// Create a template whose single variant is also the active one
    pub fn new(template_type: impl Into<String>, variant: TemplateVariant) -> Self {
        Self {
            template_type: template_type.into(),
            subject: variant.subject.clone(),
            body_html: variant.body_html.clone(),
            variants: vec![variant],
        }
    }

    /// Create a template from a list of variants, the first one active
    ///
    /// Returns `None` when `variants` is empty.
    pub fn with_variants(template_type: impl Into<String>, variants: Vec<TemplateVariant>) -> Option<Self> {
        let first = variants.first()?;
        Some(Self {
            template_type: template_type.into(),
            subject: first.subject.clone(),
            body_html: first.body_html.clone(),
            variants,
        })
    }

    /// Template type id
    pub fn template_type(&self) -> &str {
        &self.template_type
    }

    /// Subject of the active variant
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Body fragment of the active variant
    pub fn body_html(&self) -> &str {
        &self.body_html
    }

    pub fn variants(&self) -> &[TemplateVariant] {
        &self.variants
    }

    pub fn variant(&self, id: &str) -> Option<&TemplateVariant> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// Resolve an active id to a variant, falling back to the first one
    pub fn resolve_active(&self, active_id: &str) -> Option<&TemplateVariant> {
        self.variant(active_id).or_else(|| self.variants.first())
    }

    /// Restore the variant invariants on data of unknown provenance
    ///
    /// An empty variant list gets a synthetic default variant built from
    /// the mirrored fields. A missing or dangling `active_id` is pointed at
    /// the first variant, and the mirror is re-synced from the active
    /// variant. Returns true when anything changed.
    pub fn repair(&mut self, active_id: &mut String) -> bool {
        let mut changed = false;

        if self.variants.is_empty() {
            self.variants.push(TemplateVariant::new(
                DEFAULT_VARIANT_ID,
                "Default",
                self.subject.clone(),
                self.body_html.clone(),
            ));
            changed = true;
        }

        if self.variant(active_id).is_none() {
            active_id.clone_from(&self.variants[0].id);
            changed = true;
        }

        if let Some(active) = self.variants.iter().find(|v| v.id == *active_id) {
            if self.subject != active.subject || self.body_html != active.body_html {
                self.subject.clone_from(&active.subject);
                self.body_html.clone_from(&active.body_html);
                changed = true;
            }
        }

        changed
    }

    /// Give a fresh id to every variant whose id is not a safe path
    /// component or repeats an earlier one
    ///
    /// `active_id` follows its variant. Returns the number of ids replaced.
    pub fn reassign_unsafe_ids(&mut self, active_id: &mut String) -> usize {
        let mut seen = std::collections::HashSet::new();
        let mut replaced = 0;
        for variant in &mut self.variants {
            if is_safe_id(&variant.id) && seen.insert(variant.id.clone()) {
                continue;
            }
            let fresh = fresh_variant_id();
            if variant.id == *active_id && !seen.contains(active_id.as_str()) {
                active_id.clone_from(&fresh);
            }
            debug!(old = %variant.id, new = %fresh, "reassigned variant id");
            variant.id = fresh.clone();
            seen.insert(fresh);
            replaced += 1;
        }
        replaced
    }
}

/// Mutable view over one template and its active variant id
#[derive(Debug)]
pub struct VariantStore<'a> {
    template: &'a mut EmailTemplate,
    active_id: &'a mut String,
}

impl<'a> VariantStore<'a> {
    /// Borrow a template together with its active id
    ///
    /// Repairs the pairing first, so every operation starts from a state
    /// that satisfies the variant invariants.
    pub fn new(template: &'a mut EmailTemplate, active_id: &'a mut String) -> Self {
        if template.repair(active_id) {
            debug!(
                template_type = %template.template_type,
                active_id = %active_id,
                "repaired variant state"
            );
        }
        Self {
            template,
            active_id,
        }
    }

    pub fn template(&self) -> &EmailTemplate {
        &*self.template
    }

    pub fn active_id(&self) -> &str {
        self.active_id.as_str()
    }

    pub fn active(&self) -> &TemplateVariant {
        let idx = self.active_index();
        &self.template.variants[idx]
    }

    pub fn len(&self) -> usize {
        self.template.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.template.variants.is_empty()
    }

    fn active_index(&self) -> usize {
        self.template
            .variants
            .iter()
            .position(|v| v.id == *self.active_id)
            .unwrap_or(0)
    }

    fn activate(&mut self, idx: usize) {
        let variant = &self.template.variants[idx];
        self.active_id.clone_from(&variant.id);
        self.template.subject.clone_from(&variant.subject);
        self.template.body_html.clone_from(&variant.body_html);
    }

    /// Make `id` the active variant
    ///
    /// An unknown id selects the first variant. Returns the id that ended
    /// up active.
    pub fn select(&mut self, id: &str) -> &str {
        let idx = match self.template.variants.iter().position(|v| v.id == id) {
            Some(idx) => idx,
            None => {
                debug!(variant_id = id, "unknown variant, selecting first");
                0
            }
        };
        self.activate(idx);
        self.active_id.as_str()
    }

    fn push_active(&mut self, variant: TemplateVariant) -> &TemplateVariant {
        self.template.variants.push(variant);
        let idx = self.template.variants.len() - 1;
        self.activate(idx);
        &self.template.variants[idx]
    }

    /// Add a copy of the active variant named `Variant {n+1}` and activate it
    pub fn create(&mut self) -> &TemplateVariant {
        let source = self.active();
        let variant = TemplateVariant::new(
            fresh_variant_id(),
            format!("Variant {}", self.len() + 1),
            source.subject.clone(),
            source.body_html.clone(),
        );
        debug!(template_type = %self.template.template_type, variant_id = %variant.id, "created variant");
        self.push_active(variant)
    }

    /// Add a copy of `source_id` named `{name} (Copy)` and activate it
    ///
    /// Returns `None` (and changes nothing) when the source does not exist.
    pub fn duplicate(&mut self, source_id: &str) -> Option<&TemplateVariant> {
        let source = self.template.variant(source_id)?;
        let variant = TemplateVariant::new(
            fresh_variant_id(),
            format!("{} (Copy)", source.name),
            source.subject.clone(),
            source.body_html.clone(),
        );
        debug!(template_type = %self.template.template_type, variant_id = %variant.id, source_id, "duplicated variant");
        Some(self.push_active(variant))
    }

    /// Remove a variant
    ///
    /// The last remaining variant is never removed. When the active variant
    /// goes away the first remaining one becomes active. Returns true when a
    /// variant was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        if self.len() <= 1 {
            debug!(variant_id = id, "refusing to delete the last variant");
            return false;
        }
        let Some(idx) = self.template.variants.iter().position(|v| v.id == id) else {
            return false;
        };

        let was_active = *self.active_id == id;
        self.template.variants.remove(idx);
        if was_active {
            self.activate(0);
        }
        true
    }

    /// Rename a variant; subject and body are untouched
    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> bool {
        match self.template.variants.iter_mut().find(|v| v.id == id) {
            Some(variant) => {
                variant.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Set the body of the active variant and the template mirror together
    pub fn set_body_html(&mut self, html: impl Into<String>) {
        let html = html.into();
        let idx = self.active_index();
        self.template.variants[idx].body_html.clone_from(&html);
        self.template.body_html = html;
    }

    /// Set the subject of the active variant and the template mirror together
    pub fn set_subject(&mut self, subject: impl Into<String>) {
        let subject = subject.into();
        let idx = self.active_index();
        self.template.variants[idx].subject.clone_from(&subject);
        self.template.subject = subject;
    }
}
