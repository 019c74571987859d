//! GX task repository
//!
//! One task per guarded data contract, keyed by component id. A task records
//! the passive policy to evaluate and the full descriptor it was provisioned
//! from; the GX runner picks tasks up from here.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::GxTaskRepositoryError;

/// Task fields supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGxTask {
    pub component_id: String,
    pub passive_policy_id: String,
    pub full_descriptor: String,
}

/// Stored task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct GxTask {
    pub component_id: String,
    pub passive_policy_id: String,
    pub full_descriptor: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait GxTaskRepository: Send + Sync {
    /// Insert the task, or replace policy and descriptor of the existing one.
    ///
    /// `created_at` survives updates; `updated_at` is refreshed.
    async fn upsert_task(&self, task: &NewGxTask) -> Result<GxTask, GxTaskRepositoryError>;

    /// Bulk delete; ids without a task are ignored
    async fn delete_tasks_by_component_ids(
        &self,
        component_ids: &[String],
    ) -> Result<(), GxTaskRepositoryError>;

    async fn get_all_tasks(&self) -> Result<Vec<GxTask>, GxTaskRepositoryError>;
}

/// Process-local repository; clones share the same tasks
#[derive(Debug, Clone, Default)]
pub struct InMemoryGxTaskRepository {
    tasks: Arc<Mutex<BTreeMap<String, GxTask>>>,
}

impl InMemoryGxTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GxTaskRepository for InMemoryGxTaskRepository {
    async fn upsert_task(&self, task: &NewGxTask) -> Result<GxTask, GxTaskRepositoryError> {
        let now = Utc::now();
        let mut tasks = self.tasks.lock().await;
        let stored = tasks
            .entry(task.component_id.clone())
            .and_modify(|existing| {
                existing.passive_policy_id = task.passive_policy_id.clone();
                existing.full_descriptor = task.full_descriptor.clone();
                existing.updated_at = now;
            })
            .or_insert_with(|| GxTask {
                component_id: task.component_id.clone(),
                passive_policy_id: task.passive_policy_id.clone(),
                full_descriptor: task.full_descriptor.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(stored.clone())
    }

    async fn delete_tasks_by_component_ids(
        &self,
        component_ids: &[String],
    ) -> Result<(), GxTaskRepositoryError> {
        let mut tasks = self.tasks.lock().await;
        for id in component_ids {
            tasks.remove(id);
        }
        Ok(())
    }

    async fn get_all_tasks(&self) -> Result<Vec<GxTask>, GxTaskRepositoryError> {
        Ok(self.tasks.lock().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task(component_id: &str, policy: &str) -> NewGxTask {
        NewGxTask {
            component_id: component_id.to_string(),
            passive_policy_id: policy.to_string(),
            full_descriptor: format!("descriptor for {}", policy),
        }
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let repo = InMemoryGxTaskRepository::new();

        let inserted = repo.upsert_task(&new_task("op-a", "policy-1")).await.unwrap();
        assert_eq!(inserted.created_at, inserted.updated_at);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let updated = repo.upsert_task(&new_task("op-a", "policy-2")).await.unwrap();
        assert_eq!(updated.created_at, inserted.created_at);
        assert!(updated.updated_at > inserted.updated_at);
        assert_eq!(updated.passive_policy_id, "policy-2");
        assert_eq!(updated.full_descriptor, "descriptor for policy-2");

        let all = repo.get_all_tasks().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_ignores_unknown_ids() {
        let repo = InMemoryGxTaskRepository::new();
        repo.upsert_task(&new_task("op-a", "p")).await.unwrap();
        repo.upsert_task(&new_task("op-b", "p")).await.unwrap();

        repo.delete_tasks_by_component_ids(&["op-a".to_string(), "missing".to_string()])
            .await
            .unwrap();

        let remaining: Vec<String> = repo
            .get_all_tasks()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.component_id)
            .collect();
        assert_eq!(remaining, vec!["op-b"]);
    }
}
