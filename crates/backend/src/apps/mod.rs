//! Applications compiled into this build
//!
//! `[apps] installed` in config.toml selects which of them are active.

pub mod chatbot_app;
pub mod core_agent;
pub mod home;

use crate::shared::metadata::discovery::AppCatalog;

pub fn catalog() -> AppCatalog {
    AppCatalog::new(vec![core_agent::APP, chatbot_app::APP, home::APP])
}
