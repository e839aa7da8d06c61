pub mod forms;
pub mod metadata;
pub mod models;

use crate::shared::metadata::discovery::{FormsHook, InstalledApp, MetadataHook};

pub const APP: InstalledApp = InstalledApp {
    label: "core_agent",
    metadata: Some(metadata::register as MetadataHook),
    forms: Some(forms::forms as FormsHook),
    schema: models::SCHEMA,
};
