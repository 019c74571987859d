//! GX Data Contract Guardian tech adapter
//!
//! Validates a guardian workload component against its data product descriptor
//! and provisions passive monitoring for the data contracts it guards, either by
//! publishing rendered Airflow DAGs to an object store or by persisting GX tasks
//! in a relational store.
//!
//! Pipeline: descriptor → [`services::request`] → [`services::validation`] →
//! [`services::provision`] → [`services::template`] (DAG variant) →
//! [`repositories`].

pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

#[cfg(feature = "server")]
pub mod api;

pub use error::{ConfigError, DagRepositoryError, GxTaskRepositoryError, TemplateError};
pub use models::api::{ProvisioningStatus, Status, SystemErr, ValidationError, ValidationResult};
pub use models::descriptor::DataProduct;
pub use models::gx::{GuardedResource, GxGuardianWorkload};
pub use services::provision::{DagProvisionService, ProvisionService, TaskProvisionService};
pub use services::validation::{validate_components, ValidatedComponents};
