use crate::shared::metadata::entity::{
    ColumnType, EntityType, FieldDef, OwnedAccessor, PrimaryKey, Requester, ScopeFilter,
};

pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS core_agent_agent (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'draft',
        system_prompt TEXT NOT NULL DEFAULT '',
        owner_id TEXT NOT NULL,
        metadata TEXT,
        created_at TEXT,
        updated_at TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS core_agent_agent_share (
        agent_id TEXT NOT NULL REFERENCES core_agent_agent(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL,
        PRIMARY KEY (agent_id, user_id)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS core_agent_knowledgebase (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        owner_id TEXT NOT NULL,
        created_at TEXT,
        updated_at TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS core_agent_datasource (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        source_type TEXT NOT NULL DEFAULT 'url',
        knowledge_base_id TEXT REFERENCES core_agent_knowledgebase(id) ON DELETE SET NULL,
        config TEXT,
        created_at TEXT,
        updated_at TEXT
    );
    "#,
];

/// Agents the requester owns or that were shared with them
fn owned_or_shared(requester: &Requester) -> ScopeFilter {
    ScopeFilter::new(
        "(\"owner_id\" = ? OR \"id\" IN (SELECT \"agent_id\" FROM \"core_agent_agent_share\" WHERE \"user_id\" = ?))",
        vec![requester.id.clone().into(), requester.id.clone().into()],
    )
}

pub static AGENT: EntityType = EntityType {
    name: "Agent",
    app_label: "core_agent",
    table_name: "core_agent_agent",
    primary_key: PrimaryKey::Uuid,
    fields: &[
        FieldDef::new("name", ColumnType::Text),
        FieldDef::new("description", ColumnType::Text),
        FieldDef::new("status", ColumnType::Text),
        FieldDef::new("system_prompt", ColumnType::Text),
        FieldDef::new("owner_id", ColumnType::Text),
        FieldDef::new("metadata", ColumnType::Json),
        FieldDef::new("created_at", ColumnType::DateTime),
        FieldDef::new("updated_at", ColumnType::DateTime),
    ],
    display_field: Some("name"),
    owned: Some(owned_or_shared as OwnedAccessor),
    owner_field: Some("owner_id"),
    metadata_column: Some("metadata"),
    ordering: None,
};

pub static KNOWLEDGE_BASE: EntityType = EntityType {
    name: "KnowledgeBase",
    app_label: "core_agent",
    table_name: "core_agent_knowledgebase",
    primary_key: PrimaryKey::Uuid,
    fields: &[
        FieldDef::new("name", ColumnType::Text),
        FieldDef::new("description", ColumnType::Text),
        FieldDef::new("owner_id", ColumnType::Text),
        FieldDef::new("created_at", ColumnType::DateTime),
        FieldDef::new("updated_at", ColumnType::DateTime),
    ],
    display_field: Some("name"),
    owned: None,
    owner_field: Some("owner_id"),
    metadata_column: None,
    ordering: None,
};

pub static DATA_SOURCE: EntityType = EntityType {
    name: "DataSource",
    app_label: "core_agent",
    table_name: "core_agent_datasource",
    primary_key: PrimaryKey::Uuid,
    fields: &[
        FieldDef::new("name", ColumnType::Text),
        FieldDef::new("source_type", ColumnType::Text),
        FieldDef::foreign_key("knowledge_base_id", "core_agent_knowledgebase", "name"),
        FieldDef::new("config", ColumnType::Json),
        FieldDef::new("created_at", ColumnType::DateTime),
        FieldDef::new("updated_at", ColumnType::DateTime),
    ],
    display_field: Some("name"),
    owned: None,
    owner_field: None,
    metadata_column: None,
    ordering: Some("\"created_at\" DESC"),
};
