//! Input validation for the update view
//!
//! A declaration may name the form its update view uses. Otherwise an app
//! may declare a form named `{EntityName}Form` in its `forms` hook. Without
//! either, a generic form is synthesized from the metadata declaration: one
//! optional input per fieldset field.

use std::collections::BTreeMap;
use std::sync::Arc;

use contracts::shared::admin::{Choice, FieldConfig, FieldErrors};
use contracts::shared::metadata::{
    is_valid_email, MetadataDeclaration, ValidationRules, WidgetKind, INVALID_CHOICE_MESSAGE,
    REQUIRED_MESSAGE,
};
use convert_case::{Case, Casing};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use super::discovery::AppCatalog;
use super::entity::{ColumnType, EntityType};
use super::error::ConfigError;
use super::registry::MetadataRegistry;

/// Submitted values keyed by field name
pub type FormInput = Map<String, Value>;

/// Validated values, in form field order
pub type CleanedData = Vec<(&'static str, Value)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFieldKind {
    Char,
    Text,
    Choice,
    Integer,
    Decimal,
    Boolean,
    Email,
    Json,
    /// Foreign key; empty input clears the relation
    Relation,
}

impl FormFieldKind {
    pub fn default_widget(&self) -> WidgetKind {
        match self {
            Self::Char => WidgetKind::TextInput,
            Self::Text | Self::Json => WidgetKind::Textarea,
            Self::Choice | Self::Relation => WidgetKind::Select,
            Self::Integer | Self::Decimal => WidgetKind::NumberInput,
            Self::Boolean => WidgetKind::Checkbox,
            Self::Email => WidgetKind::EmailInput,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormField {
    pub name: &'static str,
    pub kind: FormFieldKind,
    pub rules: ValidationRules,
    pub label: Option<&'static str>,
    pub help_text: Option<&'static str>,
    pub choices: &'static [(&'static str, &'static str)],
    pub widget: Option<WidgetKind>,
}

impl FormField {
    pub const fn new(name: &'static str, kind: FormFieldKind) -> Self {
        Self {
            name,
            kind,
            rules: ValidationRules::none(),
            label: None,
            help_text: None,
            choices: &[],
            widget: None,
        }
    }

    pub const fn char(name: &'static str) -> Self {
        Self::new(name, FormFieldKind::Char)
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FormFieldKind::Text)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FormFieldKind::Boolean)
    }

    pub const fn relation(name: &'static str) -> Self {
        Self::new(name, FormFieldKind::Relation)
    }

    pub const fn choice(name: &'static str, choices: &'static [(&'static str, &'static str)]) -> Self {
        let mut field = Self::new(name, FormFieldKind::Choice);
        field.choices = choices;
        field
    }

    pub const fn rules(mut self, rules: ValidationRules) -> Self {
        self.rules = rules;
        self
    }

    pub const fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    pub const fn help_text(mut self, text: &'static str) -> Self {
        self.help_text = Some(text);
        self
    }

    pub const fn widget(mut self, widget: WidgetKind) -> Self {
        self.widget = Some(widget);
        self
    }

    fn effective_widget(&self) -> WidgetKind {
        self.widget.unwrap_or_else(|| self.kind.default_widget())
    }

    pub fn config(&self) -> FieldConfig {
        let default_label = self.name.to_case(Case::Title);
        FieldConfig {
            widget: self.effective_widget(),
            required: self.rules.required,
            help_text: self.help_text.map(str::to_string),
            choices: (!self.choices.is_empty()).then(|| {
                self.choices
                    .iter()
                    .map(|(value, label)| Choice {
                        value: value.to_string(),
                        label: label.to_string(),
                    })
                    .collect()
            }),
            max_length: self.rules.max_length,
            min_length: self.rules.min_length,
            label: self
                .label
                .filter(|label| *label != default_label)
                .map(str::to_string),
        }
    }

    /// `None` means the field was not submitted
    fn clean(&self, raw: Option<&Value>) -> Result<Value, String> {
        let text = raw.and_then(raw_text).unwrap_or_default();
        let text = text.trim();

        match self.kind {
            FormFieldKind::Boolean => {
                let checked = raw.map(is_truthy).unwrap_or(false);
                if self.rules.required && !checked {
                    return Err(REQUIRED_MESSAGE.to_string());
                }
                Ok(Value::Bool(checked))
            }
            FormFieldKind::Char | FormFieldKind::Text => {
                self.rules.validate_string(text)?;
                Ok(Value::String(text.to_string()))
            }
            FormFieldKind::Email => {
                self.rules.validate_string(text)?;
                if !text.is_empty() && !is_valid_email(text) {
                    return Err("Enter a valid email address.".to_string());
                }
                Ok(Value::String(text.to_string()))
            }
            FormFieldKind::Choice => {
                self.rules.validate_string(text)?;
                if !text.is_empty() && !self.choices.iter().any(|(value, _)| *value == text) {
                    return Err(format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        text
                    ));
                }
                Ok(Value::String(text.to_string()))
            }
            FormFieldKind::Integer => {
                if text.is_empty() {
                    return self.empty_value();
                }
                let n: i64 = text
                    .parse()
                    .map_err(|_| "Enter a whole number.".to_string())?;
                self.rules.validate_number(n as f64)?;
                Ok(Value::Number(n.into()))
            }
            FormFieldKind::Decimal => {
                if text.is_empty() {
                    return self.empty_value();
                }
                let n: f64 = text.parse().map_err(|_| "Enter a number.".to_string())?;
                self.rules.validate_number(n)?;
                Number::from_f64(n)
                    .map(Value::Number)
                    .ok_or_else(|| "Enter a number.".to_string())
            }
            FormFieldKind::Relation => {
                if text.is_empty() {
                    return self.empty_value();
                }
                // Existence of the referenced row is checked when writing
                Uuid::parse_str(text)
                    .map(|id| Value::String(id.to_string()))
                    .map_err(|_| INVALID_CHOICE_MESSAGE.to_string())
            }
            FormFieldKind::Json => match raw {
                Some(value) if value.is_object() || value.is_array() => Ok(value.clone()),
                _ if text.is_empty() => self.empty_value(),
                _ => serde_json::from_str(text).map_err(|_| "Enter a valid JSON.".to_string()),
            },
        }
    }

    fn empty_value(&self) -> Result<Value, String> {
        if self.rules.required {
            Err(REQUIRED_MESSAGE.to_string())
        } else {
            Ok(Value::Null)
        }
    }
}

fn raw_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "on" | "1" | "yes"),
        _ => false,
    }
}

/// Input validator for one entity type
#[derive(Debug, Clone, PartialEq)]
pub struct FormSpec {
    pub name: String,
    pub fields: Vec<FormField>,
    /// Fields stored as keys of the entity's metadata JSON column
    pub metadata_fields: &'static [&'static str],
    /// Only submitted fields are validated and written
    pub partial: bool,
}

impl FormSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            metadata_fields: &[],
            partial: false,
        }
    }

    pub fn field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn metadata_fields(mut self, fields: &'static [&'static str]) -> Self {
        self.metadata_fields = fields;
        self
    }

    /// Form synthesized from the declaration's fieldset fields, all optional
    pub fn generic(entity: &EntityType, metadata: &MetadataDeclaration) -> Self {
        let fields = metadata
            .combined_fields()
            .into_iter()
            .filter(|name| !entity.is_protected(name))
            .filter(|name| entity.has_column(name) || entity.metadata_column.is_some())
            .map(|name| {
                let kind = match entity.field(name) {
                    Some(column) if column.relation.is_some() => FormFieldKind::Relation,
                    Some(column) => match column.column_type {
                        ColumnType::Integer => FormFieldKind::Integer,
                        ColumnType::Real => FormFieldKind::Decimal,
                        ColumnType::Boolean => FormFieldKind::Boolean,
                        ColumnType::Json => FormFieldKind::Json,
                        _ => FormFieldKind::Char,
                    },
                    None => FormFieldKind::Char,
                };
                let mut field = FormField::new(name, kind);
                field.widget = metadata.widget_for(name);
                field
            })
            .collect();

        Self {
            name: format!("{}AutoForm", entity.name),
            fields,
            metadata_fields: &[],
            partial: true,
        }
    }

    pub fn validate(&self, input: &FormInput) -> Result<CleanedData, FieldErrors> {
        let mut cleaned = Vec::new();
        let mut errors = FieldErrors::new();

        for field in &self.fields {
            let raw = input.get(field.name);
            // A JSON null counts as not submitted on partial forms
            if self.partial && raw.map_or(true, Value::is_null) {
                continue;
            }
            match field.clean(raw) {
                Ok(value) => cleaned.push((field.name, value)),
                Err(message) => errors.entry(field.name.to_string()).or_default().push(message),
            }
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }

    pub fn field_configs(&self) -> BTreeMap<String, FieldConfig> {
        self.fields
            .iter()
            .map(|f| (f.name.to_string(), f.config()))
            .collect()
    }
}

/// Finds the form for an entity type
#[derive(Debug, Clone)]
pub struct FormResolver {
    catalog: Arc<AppCatalog>,
}

impl FormResolver {
    pub fn new(catalog: Arc<AppCatalog>) -> Self {
        Self { catalog }
    }

    /// The form named by the declaration, then `{Name}Form` from the owning
    /// app, else the generic form. Not cached.
    pub fn resolve(&self, entity: &EntityType, metadata: &MetadataDeclaration) -> FormSpec {
        let forms = self.catalog.forms_of(entity.app_label);

        if let Some(declared) = metadata.form {
            if let Some(form) = forms.iter().find(|form| form.name == declared) {
                return form.clone();
            }
            tracing::warn!(
                "{} metadata names form {}, which app {} does not declare",
                entity.name,
                declared,
                entity.app_label
            );
        }

        let wanted = format!("{}Form", entity.name);
        forms
            .into_iter()
            .find(|form| form.name == wanted)
            .unwrap_or_else(|| {
                tracing::debug!(
                    "No {} in app {}, using generic form",
                    wanted,
                    entity.app_label
                );
                FormSpec::generic(entity, metadata)
            })
    }

    /// Startup check of every registered entity's form: a form named by a
    /// declaration must exist and every field pattern must compile.
    pub fn check(&self, registry: &MetadataRegistry) -> Result<(), ConfigError> {
        for entry in registry.list_all() {
            let (entity, metadata) = (entry.entity, &entry.metadata);
            if let Some(declared) = metadata.form {
                let found = self
                    .catalog
                    .forms_of(entity.app_label)
                    .iter()
                    .any(|form| form.name == declared);
                if !found {
                    return Err(ConfigError::UnknownForm {
                        entity: entity.name.to_string(),
                        form: declared.to_string(),
                    });
                }
            }

            let form = self.resolve(entity, metadata);
            for field in &form.fields {
                if let Some(pattern) = field.rules.pattern {
                    pattern.regex().map_err(|e| ConfigError::InvalidPattern {
                        form: form.name.clone(),
                        field: field.name.to_string(),
                        reason: e.to_string(),
                    })?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::metadata::discovery::{FormsHook, InstalledApp};
    use crate::shared::metadata::entity::{FieldDef, PrimaryKey};
    use contracts::shared::metadata::{FieldWidget, Fieldset, Pattern};
    use maplit::btreemap;
    use serde_json::json;

    const STATUS: &[(&str, &str)] = &[("active", "Active"), ("disabled", "Disabled")];

    const TICKET: EntityType = EntityType {
        name: "Ticket",
        app_label: "desk",
        table_name: "desk_ticket",
        primary_key: PrimaryKey::Uuid,
        fields: &[
            FieldDef::new("name", ColumnType::Text),
            FieldDef::new("priority", ColumnType::Integer),
            FieldDef::new("urgent", ColumnType::Boolean),
            FieldDef::new("owner", ColumnType::Text),
            FieldDef::foreign_key("queue_id", "desk_queue", "name"),
            FieldDef::new("metadata", ColumnType::Json),
        ],
        display_field: Some("name"),
        owned: None,
        owner_field: Some("owner"),
        metadata_column: Some("metadata"),
        ordering: None,
    };

    const TICKET_METADATA: MetadataDeclaration = MetadataDeclaration {
        list_display: &["name"],
        fieldsets: &[
            Fieldset::new("General", &["name", "priority", "urgent", "owner", "queue_id"]),
            Fieldset::new("Extra", &["escalation_note"]),
        ],
        widgets: &[FieldWidget {
            field: "escalation_note",
            widget: WidgetKind::Textarea,
        }],
        form: None,
    };

    fn ticket_form() -> FormSpec {
        FormSpec::named("TicketForm")
            .field(FormField::char("name").rules(ValidationRules::required().with_max_length(10)))
            .field(FormField::choice("status", STATUS).rules(ValidationRules::required()))
            .field(FormField::new("contact", FormFieldKind::Email))
            .field(FormField::boolean("urgent"))
    }

    fn input(value: serde_json::Value) -> FormInput {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_required_field_error_message() {
        let errors = ticket_form()
            .validate(&input(json!({"name": "", "status": "active"})))
            .unwrap_err();
        assert_eq!(errors, btreemap! {"name".to_string() => vec!["This field is required.".to_string()]});
    }

    #[test]
    fn test_errors_are_collected_per_field() {
        let errors = ticket_form()
            .validate(&input(json!({
                "name": "a very long ticket name",
                "status": "closed",
                "contact": "nobody"
            })))
            .unwrap_err();
        assert_eq!(
            errors["name"],
            vec!["Ensure this value has at most 10 characters (it has 23).".to_string()]
        );
        assert_eq!(
            errors["status"],
            vec!["Select a valid choice. closed is not one of the available choices.".to_string()]
        );
        assert_eq!(errors["contact"], vec!["Enter a valid email address.".to_string()]);
    }

    #[test]
    fn test_declared_form_treats_missing_fields_as_empty() {
        let cleaned = ticket_form()
            .validate(&input(json!({"name": " Printer ", "status": "active"})))
            .unwrap();
        assert_eq!(
            cleaned,
            vec![
                ("name", json!("Printer")),
                ("status", json!("active")),
                ("contact", json!("")),
                ("urgent", json!(false)),
            ]
        );
    }

    #[test]
    fn test_checkbox_accepts_form_encoded_values() {
        let cleaned = ticket_form()
            .validate(&input(json!({"name": "x", "status": "active", "urgent": "on"})))
            .unwrap();
        assert!(cleaned.contains(&("urgent", json!(true))));
    }

    #[test]
    fn test_generic_form_is_partial_and_optional() {
        let form = FormSpec::generic(&TICKET, &TICKET_METADATA);
        assert!(form.partial);
        let names: Vec<_> = form.fields.iter().map(|f| f.name).collect();
        // owner is protected; escalation_note lives in the metadata column
        assert_eq!(names, vec!["name", "priority", "urgent", "queue_id", "escalation_note"]);
        assert!(form.fields.iter().all(|f| !f.rules.required));
        assert_eq!(form.fields[1].kind, FormFieldKind::Integer);
        assert_eq!(form.fields[3].kind, FormFieldKind::Relation);
        assert_eq!(form.fields[4].widget, Some(WidgetKind::Textarea));

        let cleaned = form.validate(&input(json!({"name": ""}))).unwrap();
        assert_eq!(cleaned, vec![("name", json!(""))]);

        let errors = form.validate(&input(json!({"priority": "high"}))).unwrap_err();
        assert_eq!(errors["priority"], vec!["Enter a whole number.".to_string()]);
    }

    #[test]
    fn test_generic_form_skips_null_values() {
        let form = FormSpec::generic(&TICKET, &TICKET_METADATA);
        let cleaned = form
            .validate(&input(json!({"name": null, "priority": "3"})))
            .unwrap();
        assert_eq!(cleaned, vec![("priority", json!(3))]);
    }

    #[test]
    fn test_relation_field_clears_and_checks_format() {
        let form = FormSpec::generic(&TICKET, &TICKET_METADATA);
        let cleaned = form.validate(&input(json!({"queue_id": " "}))).unwrap();
        assert_eq!(cleaned, vec![("queue_id", Value::Null)]);

        let cleaned = form
            .validate(&input(json!({"queue_id": "4A1E2D33-7F60-4D8B-A1C2-3B4D5E6F7A81"})))
            .unwrap();
        assert_eq!(
            cleaned,
            vec![("queue_id", json!("4a1e2d33-7f60-4d8b-a1c2-3b4d5e6f7a81"))]
        );

        let errors = form.validate(&input(json!({"queue_id": "support"}))).unwrap_err();
        assert_eq!(errors["queue_id"], vec![INVALID_CHOICE_MESSAGE.to_string()]);

        let required = FormSpec::named("TicketForm")
            .field(FormField::relation("queue_id").rules(ValidationRules::required()));
        let errors = required.validate(&input(json!({"queue_id": ""}))).unwrap_err();
        assert_eq!(errors["queue_id"], vec![REQUIRED_MESSAGE.to_string()]);
    }

    #[test]
    fn test_field_config_for_ui() {
        let configs = ticket_form().field_configs();
        let status = &configs["status"];
        assert_eq!(status.widget, WidgetKind::Select);
        assert!(status.required);
        assert_eq!(status.choices.as_ref().unwrap()[1].value, "disabled");
        assert_eq!(configs["name"].max_length, Some(10));
        assert_eq!(configs["contact"].widget, WidgetKind::EmailInput);
    }

    static TICKET_CODE: Pattern = Pattern::new(r"^[A-Z]+-\d+$", "Use a code like OPS-12.");
    static UNBALANCED: Pattern = Pattern::new(r"^(OPS", "Never shown.");

    fn desk_forms() -> Vec<FormSpec> {
        vec![
            ticket_form(),
            FormSpec::named("QueueForm"),
            FormSpec::named("TicketTriageForm").field(
                FormField::char("code").rules(ValidationRules::required().with_pattern(&TICKET_CODE)),
            ),
        ]
    }

    fn broken_forms() -> Vec<FormSpec> {
        vec![FormSpec::named("TicketForm")
            .field(FormField::char("code").rules(ValidationRules::none().with_pattern(&UNBALANCED)))]
    }

    fn resolver_with(forms: FormsHook) -> FormResolver {
        FormResolver::new(Arc::new(AppCatalog::new(vec![InstalledApp {
            label: "desk",
            metadata: None,
            forms: Some(forms),
            schema: &[],
        }])))
    }

    #[test]
    fn test_resolver_prefers_declared_form() {
        let resolver = resolver_with(desk_forms as FormsHook);
        assert_eq!(resolver.resolve(&TICKET, &TICKET_METADATA).name, "TicketForm");

        let other = EntityType {
            name: "Comment",
            ..TICKET
        };
        let form = resolver.resolve(&other, &TICKET_METADATA);
        assert_eq!(form.name, "CommentAutoForm");
        assert!(form.partial);
    }

    #[test]
    fn test_form_named_by_declaration_comes_first() {
        let resolver = resolver_with(desk_forms as FormsHook);
        let triage = MetadataDeclaration {
            form: Some("TicketTriageForm"),
            ..TICKET_METADATA
        };
        let form = resolver.resolve(&TICKET, &triage);
        assert_eq!(form.name, "TicketTriageForm");
        let errors = form.validate(&input(json!({"code": "ops 12"}))).unwrap_err();
        assert_eq!(errors["code"], vec!["Use a code like OPS-12.".to_string()]);

        // an undeclared name falls back to the naming convention
        let missing = MetadataDeclaration {
            form: Some("TicketWizardForm"),
            ..TICKET_METADATA
        };
        assert_eq!(resolver.resolve(&TICKET, &missing).name, "TicketForm");
    }

    #[test]
    fn test_startup_check_rejects_unknown_form_name() {
        let resolver = resolver_with(desk_forms as FormsHook);
        let mut registry = MetadataRegistry::new();
        registry.register(&TICKET, TICKET_METADATA);
        assert!(resolver.check(&registry).is_ok());

        registry.register(
            &TICKET,
            MetadataDeclaration {
                form: Some("TicketWizardForm"),
                ..TICKET_METADATA
            },
        );
        let err = resolver.check(&registry).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownForm { ref entity, ref form } if entity == "Ticket" && form == "TicketWizardForm"
        ));
    }

    #[test]
    fn test_startup_check_rejects_invalid_pattern() {
        let resolver = resolver_with(broken_forms as FormsHook);
        let mut registry = MetadataRegistry::new();
        registry.register(&TICKET, TICKET_METADATA);
        let err = resolver.check(&registry).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPattern { ref form, ref field, .. } if form == "TicketForm" && field == "code"
        ));
    }
}
