//! Error taxonomy for the metadata admin
//!
//! `ConfigError` covers startup-time faults and is never recovered: it
//! halts startup. `AdminError` covers request-time faults and becomes a
//! well-formed JSON response at the handler boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use contracts::shared::admin::{ErrorResponse, FieldErrors, UpdateFailure};
use sea_orm::DbErr;
use thiserror::Error;

use super::entity::PrimaryKey;
use super::templates::TemplateError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("metadata module of app '{app}' failed to load: {reason}")]
    MetadataModule { app: String, reason: String },

    #[error("installed app '{0}' is not part of this build")]
    UnknownApp(String),

    #[error("entity type '{entity}' uses a {key:?} primary key; generated admin routes require UUID keys")]
    UnsupportedKeyType { entity: String, key: PrimaryKey },

    #[error("metadata for '{entity}' references unknown field '{field}'")]
    UnknownField { entity: String, field: String },

    #[error("metadata for '{entity}' names form '{form}', which its app does not declare")]
    UnknownForm { entity: String, form: String },

    #[error("form '{form}' field '{field}' has an invalid pattern: {reason}")]
    InvalidPattern {
        form: String,
        field: String,
        reason: String,
    },

    #[error("entity type '{0}' is not registered")]
    NotRegistered(String),
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Authentication required")]
    Unauthenticated,

    /// Covers both missing records and records owned by someone else
    #[error("{entity} not found")]
    NotFound { entity: String },

    #[error("Invalid {entity} id '{raw}'")]
    InvalidId { entity: String, raw: String },

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Unsupported request body: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl AdminError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidId { .. } | Self::Validation(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Configuration(_) | Self::Template(_) | Self::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation(errors) => (
                status,
                Json(UpdateFailure {
                    success: false,
                    errors,
                }),
            )
                .into_response(),
            Self::Configuration(_) | Self::Template(_) | Self::Database(_) => {
                tracing::error!("{}", self);
                (
                    status,
                    Json(ErrorResponse {
                        error: "Internal server error".to_string(),
                    }),
                )
                    .into_response()
            }
            other => (
                status,
                Json(ErrorResponse {
                    error: other.to_string(),
                }),
            )
                .into_response(),
        }
    }
}
