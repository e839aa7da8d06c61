//! Registry of metadata declarations
//!
//! Populated during startup by the metadata hooks of installed apps, then
//! frozen behind an `Arc` and shared read-only with every request handler.

use std::collections::{HashMap, HashSet};

use contracts::shared::metadata::MetadataDeclaration;

use super::entity::EntityType;

/// Entity type paired with its declaration
#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry {
    pub entity: &'static EntityType,
    pub metadata: MetadataDeclaration,
}

#[derive(Debug, Default)]
pub struct MetadataRegistry {
    /// Registration order; drives route order
    entries: Vec<RegistryEntry>,
    by_name: HashMap<&'static str, usize>,
    /// Apps whose metadata hook already ran
    loaded_apps: HashSet<String>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the declaration for `entity`. Last registration wins.
    pub fn register(&mut self, entity: &'static EntityType, metadata: MetadataDeclaration) {
        let entry = RegistryEntry { entity, metadata };
        match self.by_name.get(entity.name) {
            Some(&idx) => {
                let previous = &self.entries[idx];
                tracing::warn!(
                    "Metadata for '{}' registered again (previous from app '{}', now from app '{}'); last registration wins",
                    entity.name,
                    previous.entity.app_label,
                    entity.app_label
                );
                self.entries[idx] = entry;
            }
            None => {
                self.by_name.insert(entity.name, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, entity_name: &str) -> Option<&RegistryEntry> {
        self.by_name.get(entity_name).map(|&idx| &self.entries[idx])
    }

    /// All entries in registration order; restartable
    pub fn list_all(&self) -> impl Iterator<Item = &RegistryEntry> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn is_app_loaded(&self, app: &str) -> bool {
        self.loaded_apps.contains(app)
    }

    pub(crate) fn mark_app_loaded(&mut self, app: &str) {
        self.loaded_apps.insert(app.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::metadata::entity::{ColumnType, FieldDef, PrimaryKey};
    use contracts::shared::metadata::Fieldset;

    const WIDGET: EntityType = EntityType {
        name: "Widget",
        app_label: "shop",
        table_name: "shop_widget",
        primary_key: PrimaryKey::Uuid,
        fields: &[FieldDef::new("name", ColumnType::Text)],
        display_field: Some("name"),
        owned: None,
        owner_field: None,
        metadata_column: None,
        ordering: None,
    };

    const GADGET: EntityType = EntityType {
        name: "Gadget",
        table_name: "shop_gadget",
        ..WIDGET
    };

    const FIRST: MetadataDeclaration = MetadataDeclaration {
        list_display: &["name"],
        fieldsets: &[],
        widgets: &[],
        form: None,
    };

    const SECOND: MetadataDeclaration = MetadataDeclaration {
        list_display: &["name"],
        fieldsets: &[Fieldset::new("General", &["name"])],
        widgets: &[],
        form: None,
    };

    #[test]
    fn test_get_returns_registered_declaration() {
        let mut registry = MetadataRegistry::new();
        registry.register(&WIDGET, FIRST);
        assert_eq!(registry.get("Widget").map(|e| e.metadata), Some(FIRST));
        assert!(registry.get("Gadget").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = MetadataRegistry::new();
        registry.register(&WIDGET, FIRST);
        registry.register(&GADGET, FIRST);
        registry.register(&WIDGET, SECOND);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("Widget").map(|e| e.metadata), Some(SECOND));
        // overwrite keeps the original position
        let names: Vec<_> = registry.list_all().map(|e| e.entity.name).collect();
        assert_eq!(names, vec!["Widget", "Gadget"]);
    }

    #[test]
    fn test_list_all_is_restartable() {
        let mut registry = MetadataRegistry::new();
        registry.register(&WIDGET, FIRST);
        assert_eq!(registry.list_all().count(), 1);
        assert_eq!(registry.list_all().count(), 1);
    }
}
