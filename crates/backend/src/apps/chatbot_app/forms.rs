use contracts::shared::metadata::{Pattern, ValidationRules};

use crate::shared::metadata::forms::{FormField, FormSpec};

pub const PROMPT_STATUS: &[(&str, &str)] = &[
    ("active", "Active"),
    ("inactive", "Inactive"),
    ("archived", "Archived"),
];

static CATEGORY_SLUG: Pattern = Pattern::new(
    r"^[a-z0-9_-]*$",
    "Use lowercase letters, digits, '-' or '_'.",
);

/// Named by `PROMPT_METADATA.form`
pub fn forms() -> Vec<FormSpec> {
    vec![FormSpec::named("PromptEditorForm")
        .field(FormField::char("name").rules(ValidationRules::required().with_max_length(200)))
        .field(
            FormField::char("category")
                .rules(ValidationRules::none().with_pattern(&CATEGORY_SLUG))
                .help_text("Used to group prompts in the picker"),
        )
        .field(FormField::choice("status", PROMPT_STATUS).rules(ValidationRules::required()))
        .field(FormField::text("content").rules(ValidationRules::required().with_min_length(10)))]
}
