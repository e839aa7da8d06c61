//! Auto-discovery of per-application metadata modules
//!
//! Every application compiled into the binary is described by an
//! [`InstalledApp`]. Its `metadata` hook plays the role of the app's
//! `metadata` module: running it registers the app's declarations. An app
//! without a hook simply declares no metadata. A hook that fails aborts
//! startup.

use super::error::ConfigError;
use super::forms::FormSpec;
use super::registry::MetadataRegistry;

pub type MetadataHook = fn(&mut MetadataRegistry) -> anyhow::Result<()>;
pub type FormsHook = fn() -> Vec<FormSpec>;

/// One application package
#[derive(Debug, Clone, Copy)]
pub struct InstalledApp {
    pub label: &'static str,
    pub metadata: Option<MetadataHook>,
    pub forms: Option<FormsHook>,
    /// Idempotent DDL for the app's tables
    pub schema: &'static [&'static str],
}

/// Every application available to this build
#[derive(Debug, Clone, Default)]
pub struct AppCatalog {
    apps: Vec<InstalledApp>,
}

impl AppCatalog {
    pub fn new(apps: Vec<InstalledApp>) -> Self {
        Self { apps }
    }

    pub fn get(&self, label: &str) -> Option<&InstalledApp> {
        self.apps.iter().find(|app| app.label == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstalledApp> + '_ {
        self.apps.iter()
    }

    /// Form declarations of one app, empty when it declares none
    pub fn forms_of(&self, label: &str) -> Vec<FormSpec> {
        self.get(label)
            .and_then(|app| app.forms)
            .map(|hook| hook())
            .unwrap_or_default()
    }

    /// Resolve configured labels, failing on labels this build does not know
    pub fn installed(&self, labels: &[String]) -> Result<Vec<&InstalledApp>, ConfigError> {
        labels
            .iter()
            .map(|label| {
                self.get(label)
                    .ok_or_else(|| ConfigError::UnknownApp(label.clone()))
            })
            .collect()
    }
}

/// Run the metadata hook of every installed app, once per app.
///
/// Must finish before routes are synthesized. Returns how many hooks ran.
pub fn discover(
    catalog: &AppCatalog,
    installed: &[String],
    registry: &mut MetadataRegistry,
) -> Result<usize, ConfigError> {
    let mut loaded = 0;

    for app in catalog.installed(installed)? {
        if registry.is_app_loaded(app.label) {
            tracing::debug!("Metadata of {} already loaded, skipping", app.label);
            continue;
        }

        let Some(hook) = app.metadata else {
            tracing::debug!("App {} declares no metadata", app.label);
            continue;
        };

        hook(registry).map_err(|e| ConfigError::MetadataModule {
            app: app.label.to_string(),
            reason: format!("{:#}", e),
        })?;
        registry.mark_app_loaded(app.label);
        loaded += 1;
        tracing::debug!("Successfully loaded metadata from {}", app.label);
    }

    tracing::info!(
        "Metadata discovery finished: {} app(s) loaded, {} entity type(s) registered",
        loaded,
        registry.len()
    );
    Ok(loaded)
}
