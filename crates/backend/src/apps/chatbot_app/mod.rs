pub mod forms;
pub mod metadata;
pub mod models;

use crate::shared::metadata::discovery::{FormsHook, InstalledApp, MetadataHook};

pub const APP: InstalledApp = InstalledApp {
    label: "chatbot_app",
    metadata: Some(metadata::register as MetadataHook),
    forms: Some(forms::forms as FormsHook),
    schema: models::SCHEMA,
};
