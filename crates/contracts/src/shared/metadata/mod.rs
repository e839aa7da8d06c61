//! Metadata declarations for admin-managed entity types
//!
//! A declaration says which fields a list view shows and how the detail
//! view groups fields into sections. Declarations are compile-time
//! constants: they are built once and never change afterwards.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use contracts::shared::metadata::{Fieldset, MetadataDeclaration};
//!
//! pub const AGENT_METADATA: MetadataDeclaration = MetadataDeclaration {
//!     list_display: &["name", "status"],
//!     fieldsets: &[Fieldset::new("General", &["name", "status"])],
//!     widgets: &[],
//!     form: None,
//! };
//! ```

mod field_type;
mod types;
mod validation;

pub use field_type::WidgetKind;
pub use types::{FieldWidget, Fieldset, MetadataDeclaration};
pub use validation::{
    is_valid_email, Pattern, ValidationRules, INVALID_CHOICE_MESSAGE, REQUIRED_MESSAGE,
};
