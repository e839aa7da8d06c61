//! JSON shapes produced by the generated admin views

mod response;

pub use response::{
    Choice, ColumnConfig, DetailResponse, ErrorResponse, FieldConfig, FieldErrors, ListResponse,
    UpdateFailure, UpdateFormResponse, UpdateSuccess,
};
