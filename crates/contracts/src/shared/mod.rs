pub mod admin;
pub mod metadata;
