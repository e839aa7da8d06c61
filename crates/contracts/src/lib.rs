//! Types shared between the admin backend and its clients.
//!
//! Everything here is plain data: metadata declarations, widget kinds,
//! validation rules and the JSON shapes returned by the generated views.

pub mod shared;
pub mod system;
