use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shared::metadata::WidgetKind;

/// Field name -> error messages, in field name order
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// GET m/{Name}/list when no list template exists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResponse {
    pub items: Vec<Map<String, Value>>,
    pub model_name: String,
    pub model_name_lower: String,
    pub title: String,
}

/// GET r/{Name}/{id}/view when no detail template exists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailResponse {
    /// Stored column values
    pub object: Map<String, Value>,
    /// Display-ready values: relations expanded, metadata keys merged
    pub object_data: Map<String, Value>,
    pub fieldsets: Value,
    pub model_name: String,
    pub model_name_lower: String,
    pub title: String,
}

/// GET r/{Name}/{id}/update: values for pre-filling the edit form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateFormResponse {
    pub object_id: String,
    pub model_name: String,
    pub initial: Map<String, Value>,
    pub fields: BTreeMap<String, FieldConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateSuccess {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateFailure {
    pub success: bool,
    pub errors: FieldErrors,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// UI configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

/// How the edit form renders one field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldConfig {
    pub widget: WidgetKind,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One list-table column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_text: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sortable: bool,
}

impl ColumnConfig {
    pub fn select() -> Self {
        Self {
            kind: Some("select".to_string()),
            field_name: None,
            label: None,
            href: None,
            link_text: None,
            sortable: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_success_flattens_fields() {
        let mut fields = Map::new();
        fields.insert("name".into(), json!("Support bot"));
        let body = UpdateSuccess {
            success: true,
            message: "Agent updated successfully".into(),
            redirect_url: None,
            fields,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({"success": true, "message": "Agent updated successfully", "name": "Support bot"})
        );
    }

    #[test]
    fn test_column_config_uses_camel_case() {
        let col = ColumnConfig {
            kind: Some("link".into()),
            field_name: Some("name".into()),
            label: Some("Name".into()),
            href: Some("/r/Agent/{id}/view".into()),
            link_text: Some("{name}".into()),
            sortable: true,
        };
        let value = serde_json::to_value(&col).unwrap();
        assert_eq!(value["fieldName"], "name");
        assert_eq!(value["linkText"], "{name}");
        assert_eq!(value["type"], "link");
        assert!(serde_json::to_value(ColumnConfig::select()).unwrap().get("sortable").is_none());
    }
}
