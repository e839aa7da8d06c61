//! Record to JSON conversion for the generated views

use contracts::shared::admin::ColumnConfig;
use contracts::shared::metadata::MetadataDeclaration;
use convert_case::{Case, Casing};
use serde_json::{json, Map, Value};

use super::entity::{ColumnType, EntityType};
use super::error::ConfigError;
use super::store::Record;

/// Every referenced field must be `id`, `name`, a column, or a metadata key
pub fn check_declaration(entity: &EntityType, metadata: &MetadataDeclaration) -> Result<(), ConfigError> {
    match metadata
        .referenced_fields()
        .into_iter()
        .find(|field| !entity.knows_field(field))
    {
        Some(field) => Err(ConfigError::UnknownField {
            entity: entity.name.to_string(),
            field: field.to_string(),
        }),
        None => Ok(()),
    }
}

/// Display name: the display column, else the id
pub fn display_name(entity: &EntityType, record: &Record) -> Value {
    entity
        .display_field
        .and_then(|col| record.get(col))
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| Value::String(record.id()))
}

fn field_value(entity: &EntityType, record: &Record, metadata: &Map<String, Value>, field: &str) -> Value {
    if field == "name" && entity.field("name").is_none() {
        return display_name(entity, record);
    }
    match record.get(field) {
        Some(value) => value.clone(),
        None => metadata.get(field).cloned().unwrap_or(Value::Null),
    }
}

/// One row of the list view
pub fn list_item(entity: &EntityType, declaration: &MetadataDeclaration, record: &Record) -> Map<String, Value> {
    let metadata = record.metadata(entity);
    let mut item = Map::new();
    item.insert("id".to_string(), Value::String(record.id()));
    item.insert("name".to_string(), display_name(entity, record));

    for field in declaration.list_display {
        if matches!(*field, "id" | "name") {
            continue;
        }
        let value = match record.relations.get(*field) {
            Some(display) => display.clone(),
            None => field_value(entity, record, &metadata, field),
        };
        item.insert(field.to_string(), value);
    }

    for (key, value) in metadata {
        item.entry(key).or_insert(value);
    }
    item
}

/// Stored column values, as read
pub fn raw_object(record: &Record) -> Map<String, Value> {
    record.columns.clone()
}

/// Display-ready values for the detail and update views
pub fn object_data(entity: &EntityType, declaration: &MetadataDeclaration, record: &Record) -> Map<String, Value> {
    let metadata = record.metadata(entity);
    let mut data = Map::new();
    data.insert("id".to_string(), Value::String(record.id()));
    data.insert("name".to_string(), display_name(entity, record));

    for field in entity.fields {
        let stored = record.get(field.name).cloned().unwrap_or(Value::Null);
        let value = if field.relation.is_some() {
            if stored.is_null() {
                Value::Null
            } else {
                json!({
                    "id": stored,
                    "name": record.relations.get(field.name).cloned().unwrap_or(Value::Null),
                })
            }
        } else if field.column_type == ColumnType::Json && stored.is_null() {
            json!({})
        } else {
            stored
        };
        data.insert(field.name.to_string(), value);
    }

    if entity.metadata_column.is_some() {
        data.insert("metadata".to_string(), Value::Object(metadata.clone()));
    }

    for field in declaration.combined_fields() {
        if !data.contains_key(field) {
            let value = metadata
                .get(field)
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            data.insert(field.to_string(), value);
        }
    }
    data
}

/// Current values for pre-filling the edit form
pub fn initial_values(
    entity: &EntityType,
    declaration: &MetadataDeclaration,
    record: &Record,
    fields: impl IntoIterator<Item = &'static str>,
) -> Map<String, Value> {
    let data = object_data(entity, declaration, record);
    let metadata = record.metadata(entity);
    fields
        .into_iter()
        .map(|field| {
            let value = match record.get(field) {
                Some(stored) => stored.clone(),
                None => data
                    .get(field)
                    .or_else(|| metadata.get(field))
                    .cloned()
                    .unwrap_or(Value::Null),
            };
            (field.to_string(), value)
        })
        .collect()
}

/// Table columns for list templates
pub fn list_columns(entity: &EntityType, declaration: &MetadataDeclaration) -> Vec<ColumnConfig> {
    let mut columns = vec![ColumnConfig::select()];
    let display: &[&str] = if declaration.list_display.is_empty() {
        &["name"]
    } else {
        declaration.list_display
    };

    for (idx, field) in display.iter().enumerate() {
        let label = Some(field.to_case(Case::Title));
        let column = if idx == 0 {
            ColumnConfig {
                kind: Some("link".to_string()),
                field_name: Some(field.to_string()),
                label,
                href: Some(format!("/r/{}/{{id}}/view", entity.name)),
                link_text: Some(format!("{{{}}}", field)),
                sortable: true,
            }
        } else {
            ColumnConfig {
                kind: Some("text".to_string()),
                field_name: Some(field.to_string()),
                label,
                href: None,
                link_text: None,
                sortable: true,
            }
        };
        columns.push(column);
    }
    columns
}
