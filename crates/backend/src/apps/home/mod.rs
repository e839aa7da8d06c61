//! Landing page app. Declares neither metadata nor forms.

use crate::shared::metadata::discovery::InstalledApp;

pub const APP: InstalledApp = InstalledApp {
    label: "home",
    metadata: None,
    forms: None,
    schema: &[],
};
