use contracts::shared::metadata::{FieldWidget, Fieldset, MetadataDeclaration, WidgetKind};

use super::models::PROMPT;
use crate::shared::metadata::registry::MetadataRegistry;

pub const PROMPT_METADATA: MetadataDeclaration = MetadataDeclaration {
    list_display: &["name", "category", "status", "usage_count"],
    fieldsets: &[
        Fieldset::new("Prompt", &["name", "category", "status"]),
        Fieldset::new("Content", &["content"]),
        Fieldset::new("Statistics", &["usage_count", "created_at", "updated_at"]),
    ],
    widgets: &[
        FieldWidget {
            field: "content",
            widget: WidgetKind::Textarea,
        },
        FieldWidget {
            field: "status",
            widget: WidgetKind::Select,
        },
    ],
    form: Some("PromptEditorForm"),
};

pub fn register(registry: &mut MetadataRegistry) -> anyhow::Result<()> {
    registry.register(&PROMPT, PROMPT_METADATA);
    Ok(())
}
