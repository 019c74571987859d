//! Error types for the guardian tech adapter
//!
//! Every backend boundary owns one error type. Transport and storage failures
//! are converted into these at the boundary, so the provisioning services only
//! ever see a descriptive message they can hand back as a `SystemErr`.

use thiserror::Error;

/// Settings could not be read from the environment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(String),

    #[error("invalid value for setting {name}: '{value}'")]
    Invalid { name: String, value: String },
}

/// A descriptor component does not match the shape it was requested as.
///
/// `errors` holds one message per structural mismatch, in discovery order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("component does not match the expected shape: {}", errors.join("; "))]
pub struct ComponentShapeError {
    pub errors: Vec<String>,
}

impl ComponentShapeError {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }
}

/// Rendering a DAG definition failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template not found for technology '{technology}'")]
    NotFound { technology: String },

    #[error(
        "An error occurred while rendering the DAG for technology '{technology}'. Please try again later. Details: {details}"
    )]
    Render { technology: String, details: String },
}

/// Publishing or removing DAG files failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DagRepositoryError {
    #[error(
        "An error occurred while publishing the DAG related to {data_contract_id}. Please try again later. Details: {details}"
    )]
    Publish {
        data_contract_id: String,
        details: String,
    },

    #[error("An error occurred while deleting the DAGs. Please try again later. Details: {details}")]
    Delete { details: String },
}

/// Reading or writing GX tasks failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("An unexpected error occurred. Please try again or contact the platform team. Details: {details}")]
pub struct GxTaskRepositoryError {
    pub details: String,
}

impl GxTaskRepositoryError {
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            details: details.into(),
        }
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for GxTaskRepositoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Low-level object store failure (put/delete by key)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("object store error on key '{key}': {message}")]
pub struct ObjectStoreError {
    pub key: String,
    pub message: String,
}
