//! Publishing backends
//!
//! - [`dag`]: rendered DAG files in an object store (DAG variant)
//! - [`task`]: GX task records (task variant), in memory or in Postgres

pub mod dag;
pub mod object_store;
pub mod task;

#[cfg(feature = "database")]
pub mod pg_task;

pub use dag::{dag_key, dag_name, sanitize_resource_id, DagRepository, ObjectStoreDagRepository};
pub use object_store::{InMemoryObjectStore, ObjectStore};
pub use task::{GxTask, GxTaskRepository, InMemoryGxTaskRepository, NewGxTask};

#[cfg(feature = "s3")]
pub use object_store::S3ObjectStore;

#[cfg(feature = "database")]
pub use pg_task::PgGxTaskRepository;
