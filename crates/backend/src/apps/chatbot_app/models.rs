use crate::shared::metadata::entity::{ColumnType, EntityType, FieldDef, PrimaryKey};

pub const SCHEMA: &[&str] = &[r#"
    CREATE TABLE IF NOT EXISTS chatbot_app_prompt (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        content TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'active',
        usage_count INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT
    );
    "#];

/// Reusable system prompts; visible to every user
pub static PROMPT: EntityType = EntityType {
    name: "Prompt",
    app_label: "chatbot_app",
    table_name: "chatbot_app_prompt",
    primary_key: PrimaryKey::Uuid,
    fields: &[
        FieldDef::new("name", ColumnType::Text),
        FieldDef::new("content", ColumnType::Text),
        FieldDef::new("category", ColumnType::Text),
        FieldDef::new("status", ColumnType::Text),
        FieldDef::new("usage_count", ColumnType::Integer),
        FieldDef::new("created_at", ColumnType::DateTime),
        FieldDef::new("updated_at", ColumnType::DateTime),
    ],
    display_field: Some("name"),
    owned: None,
    owner_field: None,
    metadata_column: None,
    ordering: Some("\"created_at\" DESC"),
};
