use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use crate::shared::metadata::entity::OwnershipPolicy;
use crate::shared::metadata::urls::GeneratedRoute;
use crate::shared::metadata::views::AdminState;

#[derive(Debug, Serialize)]
pub struct RegisteredEntity {
    pub name: &'static str,
    pub app_label: &'static str,
    pub table_name: &'static str,
    pub ownership: &'static str,
    pub list_display: &'static [&'static str],
    pub fieldsets: Value,
    pub routes: Vec<GeneratedRoute>,
}

/// GET /api/system/metadata
pub async fn list(State(state): State<AdminState>) -> Json<Vec<RegisteredEntity>> {
    let entities = state
        .registry
        .list_all()
        .map(|entry| RegisteredEntity {
            name: entry.entity.name,
            app_label: entry.entity.app_label,
            table_name: entry.entity.table_name,
            ownership: match OwnershipPolicy::for_entity(entry.entity) {
                OwnershipPolicy::FilterByOwnedManager(_) => "owned_manager",
                OwnershipPolicy::FilterByOwnerField(_) => "owner_field",
                OwnershipPolicy::NoFilter => "none",
            },
            list_display: entry.metadata.list_display,
            fieldsets: entry.metadata.fieldsets_json(),
            routes: state
                .routes
                .iter()
                .filter(|r| r.entity == entry.entity.name)
                .cloned()
                .collect(),
        })
        .collect();
    Json(entities)
}
