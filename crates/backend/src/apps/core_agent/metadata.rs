use contracts::shared::metadata::{FieldWidget, Fieldset, MetadataDeclaration, WidgetKind};

use super::models::{AGENT, DATA_SOURCE, KNOWLEDGE_BASE};
use crate::shared::metadata::registry::MetadataRegistry;

pub const AGENT_METADATA: MetadataDeclaration = MetadataDeclaration {
    list_display: &["name", "status"],
    fieldsets: &[
        Fieldset::new("General", &["name", "description", "status"]),
        Fieldset::new("Behaviour", &["system_prompt", "llm_model", "enable_web_search"]),
    ],
    widgets: &[
        FieldWidget {
            field: "system_prompt",
            widget: WidgetKind::Textarea,
        },
        FieldWidget {
            field: "enable_web_search",
            widget: WidgetKind::Checkbox,
        },
    ],
    form: None,
};

pub const KNOWLEDGE_BASE_METADATA: MetadataDeclaration = MetadataDeclaration {
    list_display: &["name", "description"],
    fieldsets: &[Fieldset::new("General", &["name", "description"])],
    widgets: &[FieldWidget {
        field: "description",
        widget: WidgetKind::Textarea,
    }],
    form: None,
};

pub const DATA_SOURCE_METADATA: MetadataDeclaration = MetadataDeclaration {
    list_display: &["name", "source_type", "knowledge_base_id"],
    fieldsets: &[
        Fieldset::new("General", &["name", "source_type", "knowledge_base_id"]),
        Fieldset::new("Connection", &["config"]),
    ],
    widgets: &[FieldWidget {
        field: "config",
        widget: WidgetKind::Textarea,
    }],
    form: None,
};

pub fn register(registry: &mut MetadataRegistry) -> anyhow::Result<()> {
    registry.register(&AGENT, AGENT_METADATA);
    registry.register(&KNOWLEDGE_BASE, KNOWLEDGE_BASE_METADATA);
    registry.register(&DATA_SOURCE, DATA_SOURCE_METADATA);
    Ok(())
}
