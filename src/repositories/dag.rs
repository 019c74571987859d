//! DAG repository
//!
//! Each guarded resource gets one DAG file per environment, stored under
//! `<folder>/dag_<sanitized id>_<environment>.py`. Publishing overwrites;
//! deletion walks the ids in order and stops at the first failure, leaving
//! already-deleted files deleted.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{error, info};

use super::object_store::ObjectStore;
use crate::config::S3DagSettings;
use crate::error::DagRepositoryError;

static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w]").unwrap());

#[async_trait]
pub trait DagRepository: Send + Sync {
    async fn create_or_update_dag(
        &self,
        data_contract_id: &str,
        content: &str,
        environment: &str,
    ) -> Result<(), DagRepositoryError>;

    async fn delete_dags(
        &self,
        data_contract_ids: &[String],
        environment: &str,
    ) -> Result<(), DagRepositoryError>;
}

/// Replace every non-word character with `_`
pub fn sanitize_resource_id(id: &str) -> String {
    NON_WORD_RE.replace_all(id, "_").into_owned()
}

/// Airflow DAG id for `data_contract_id` in `environment`; also the file stem
pub fn dag_name(data_contract_id: &str, environment: &str) -> String {
    format!(
        "dag_{}_{}",
        sanitize_resource_id(data_contract_id),
        environment
    )
}

/// Object key of the DAG for `data_contract_id` in `environment`
pub fn dag_key(folder: &str, data_contract_id: &str, environment: &str) -> String {
    let separator = if folder.ends_with('/') { "" } else { "/" };
    format!(
        "{}{}{}.py",
        folder,
        separator,
        dag_name(data_contract_id, environment)
    )
}

/// DAG files kept in a bucket of an [`ObjectStore`]
pub struct ObjectStoreDagRepository<S> {
    store: S,
    settings: S3DagSettings,
}

impl<S: ObjectStore> ObjectStoreDagRepository<S> {
    pub fn new(store: S, settings: S3DagSettings) -> Self {
        Self { store, settings }
    }

    fn key(&self, data_contract_id: &str, environment: &str) -> String {
        dag_key(&self.settings.folder, data_contract_id, environment)
    }
}

#[async_trait]
impl<S: ObjectStore> DagRepository for ObjectStoreDagRepository<S> {
    async fn create_or_update_dag(
        &self,
        data_contract_id: &str,
        content: &str,
        environment: &str,
    ) -> Result<(), DagRepositoryError> {
        let key = self.key(data_contract_id, environment);
        self.store
            .put_object(&self.settings.bucket_name, &key, content.to_string())
            .await
            .map_err(|e| {
                let err = DagRepositoryError::Publish {
                    data_contract_id: data_contract_id.to_string(),
                    details: e.to_string(),
                };
                error!("{}", err);
                err
            })?;
        info!("Published DAG {} for {}", key, data_contract_id);
        Ok(())
    }

    async fn delete_dags(
        &self,
        data_contract_ids: &[String],
        environment: &str,
    ) -> Result<(), DagRepositoryError> {
        for data_contract_id in data_contract_ids {
            let key = self.key(data_contract_id, environment);
            self.store
                .delete_object(&self.settings.bucket_name, &key)
                .await
                .map_err(|e| {
                    let err = DagRepositoryError::Delete {
                        details: e.to_string(),
                    };
                    error!("{}", err);
                    err
                })?;
            info!("Deleted DAG {}", key);
        }
        Ok(())
    }
}
