//! Metadata-driven admin views
//!
//! Startup order: [`discovery::discover`] fills a [`registry::MetadataRegistry`],
//! [`urls::synthesize`] derives three routes per registered entity type and
//! [`views::bind`] attaches a handler to each of them.

pub mod discovery;
pub mod entity;
pub mod error;
pub mod forms;
pub mod permissions;
pub mod registry;
pub mod serialize;
pub mod store;
pub mod templates;
pub mod urls;
pub mod views;

#[cfg(test)]
pub(crate) mod test_support;
