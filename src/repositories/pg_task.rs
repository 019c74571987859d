//! Postgres-backed GX task repository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error};

use super::task::{GxTask, GxTaskRepository, NewGxTask};
use crate::error::GxTaskRepositoryError;

pub struct PgGxTaskRepository {
    pool: PgPool,
}

impl PgGxTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn log_failure(operation: &str, err: sqlx::Error) -> GxTaskRepositoryError {
    error!("Exception in {}: {}", operation, err);
    err.into()
}

#[async_trait]
impl GxTaskRepository for PgGxTaskRepository {
    async fn upsert_task(&self, task: &NewGxTask) -> Result<GxTask, GxTaskRepositoryError> {
        let stored = sqlx::query_as::<_, GxTask>(
            r#"
            INSERT INTO gx_tasks
                (component_id, passive_policy_id, full_descriptor, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (component_id) DO UPDATE
                SET passive_policy_id = EXCLUDED.passive_policy_id,
                    full_descriptor = EXCLUDED.full_descriptor,
                    updated_at = NOW()
            RETURNING component_id, passive_policy_id, full_descriptor, created_at, updated_at
            "#,
        )
        .bind(&task.component_id)
        .bind(&task.passive_policy_id)
        .bind(&task.full_descriptor)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| log_failure("upsert_task", e))?;

        debug!("Upserted GX task {}", stored.component_id);
        Ok(stored)
    }

    async fn delete_tasks_by_component_ids(
        &self,
        component_ids: &[String],
    ) -> Result<(), GxTaskRepositoryError> {
        if component_ids.is_empty() {
            return Ok(());
        }

        let deleted = sqlx::query(r#"DELETE FROM gx_tasks WHERE component_id = ANY($1)"#)
            .bind(component_ids)
            .execute(&self.pool)
            .await
            .map_err(|e| log_failure("delete_tasks_by_component_ids", e))?
            .rows_affected();

        debug!(
            "Deleted {} GX task(s) for {} component id(s)",
            deleted,
            component_ids.len()
        );
        Ok(())
    }

    async fn get_all_tasks(&self) -> Result<Vec<GxTask>, GxTaskRepositoryError> {
        sqlx::query_as::<_, GxTask>(
            r#"
            SELECT component_id, passive_policy_id, full_descriptor, created_at, updated_at
            FROM gx_tasks
            ORDER BY component_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| log_failure("get_all_tasks", e))
    }
}
