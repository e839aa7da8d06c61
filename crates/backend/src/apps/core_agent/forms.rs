use contracts::shared::metadata::ValidationRules;

use crate::shared::metadata::forms::{FormField, FormSpec};

pub const AGENT_STATUS: &[(&str, &str)] = &[
    ("draft", "Draft"),
    ("active", "Active"),
    ("paused", "Paused"),
];

pub const LLM_MODELS: &[(&str, &str)] = &[
    ("gpt-4o", "GPT-4o"),
    ("gpt-4o-mini", "GPT-4o mini"),
    ("claude-sonnet", "Claude Sonnet"),
];

pub fn forms() -> Vec<FormSpec> {
    vec![FormSpec::named("AgentForm")
        .field(
            FormField::char("name")
                .rules(ValidationRules::required().with_max_length(255))
                .help_text("Shown in agent pickers"),
        )
        .field(FormField::text("description").rules(ValidationRules::none().with_max_length(2000)))
        .field(FormField::choice("status", AGENT_STATUS))
        .field(FormField::text("system_prompt").label("System prompt"))
        .field(FormField::choice("llm_model", LLM_MODELS).label("LLM model"))
        .field(FormField::boolean("enable_web_search"))
        .metadata_fields(&["llm_model", "enable_web_search"])]
}
