//! Core declaration types.
//!
//! All types use 'static lifetimes so declarations can be `const` items in
//! each application's `metadata` module.

use serde_json::{json, Value};

use super::field_type::WidgetKind;

// ============================================================================
// Fieldsets
// ============================================================================

/// A titled group of fields shown together on the detail view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fieldset {
    pub title: &'static str,
    pub fields: &'static [&'static str],
}

impl Fieldset {
    pub const fn new(title: &'static str, fields: &'static [&'static str]) -> Self {
        Self { title, fields }
    }
}

/// Widget override for a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldWidget {
    pub field: &'static str,
    pub widget: WidgetKind,
}

// ============================================================================
// Declaration
// ============================================================================

/// Per-entity-type admin configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetadataDeclaration {
    /// Fields shown as list columns, in order
    pub list_display: &'static [&'static str],
    /// Detail view sections, in order
    pub fieldsets: &'static [Fieldset],
    /// Optional per-field widgets
    pub widgets: &'static [FieldWidget],
    /// Form used by the update view, by name; overrides the `{Name}Form` convention
    pub form: Option<&'static str>,
}

impl MetadataDeclaration {
    pub const fn empty() -> Self {
        Self {
            list_display: &[],
            fieldsets: &[],
            widgets: &[],
            form: None,
        }
    }

    /// All fieldset fields in declaration order, without duplicates
    pub fn combined_fields(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        for fieldset in self.fieldsets {
            for field in fieldset.fields {
                if !out.contains(field) {
                    out.push(field);
                }
            }
        }
        out
    }

    /// Every field the declaration references (list columns first)
    pub fn referenced_fields(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = self.list_display.to_vec();
        for field in self.combined_fields() {
            if !out.contains(&field) {
                out.push(field);
            }
        }
        for w in self.widgets {
            if !out.contains(&w.field) {
                out.push(w.field);
            }
        }
        out
    }

    pub fn widget_for(&self, field: &str) -> Option<WidgetKind> {
        self.widgets
            .iter()
            .find(|w| w.field == field)
            .map(|w| w.widget)
    }

    /// Fieldsets in the `[[title, {"fields": [...]}], ...]` form the admin UI reads.
    /// Sections without fields are kept as empty sections.
    pub fn fieldsets_json(&self) -> Value {
        Value::Array(
            self.fieldsets
                .iter()
                .map(|fs| json!([fs.title, { "fields": fs.fields }]))
                .collect(),
        )
    }
}
