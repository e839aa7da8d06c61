//! Widget kinds understood by the admin UI

use serde::{Deserialize, Serialize};

/// Input widget used to edit a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WidgetKind {
    #[default]
    TextInput,
    Textarea,
    Select,
    Checkbox,
    DateInput,
    NumberInput,
    EmailInput,
}
