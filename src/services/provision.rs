//! Provisioning services
//!
//! Both variants walk the guarded resources in order and stop at the first
//! backend failure. Side effects already applied for earlier resources are
//! kept, and a rerun converges because every backend write is an overwrite.

use async_trait::async_trait;
use tracing::{error, info};

use super::request::parse_descriptor;
use super::template::{TemplateParameters, TemplateRenderer};
use crate::config::{AirflowSettings, CgpSettings};
use crate::models::api::{ProvisioningStatus, SystemErr};
use crate::models::descriptor::DataProduct;
use crate::models::gx::{GuardedResource, GxGuardianWorkload};
use crate::repositories::dag::{dag_name, DagRepository};
use crate::repositories::task::{GxTaskRepository, NewGxTask};

#[async_trait]
pub trait ProvisionService: Send + Sync {
    async fn provision(
        &self,
        data_product: &DataProduct,
        workload: &GxGuardianWorkload,
        resources: &[GuardedResource],
        full_descriptor: &str,
    ) -> Result<ProvisioningStatus, SystemErr>;

    async fn unprovision(
        &self,
        data_product: &DataProduct,
        workload: &GxGuardianWorkload,
        resources: &[GuardedResource],
        full_descriptor: &str,
    ) -> Result<ProvisioningStatus, SystemErr>;
}

fn system_err(err: impl std::fmt::Display) -> SystemErr {
    SystemErr::new(err.to_string())
}

fn require_policy_id(workload: &GxGuardianWorkload) -> Result<&str, SystemErr> {
    workload.policy_id().ok_or_else(|| {
        let error_msg = format!(
            "The guardian workload {} has no passive policy id in its private info",
            workload.id
        );
        error!("{}", error_msg);
        SystemErr::new(error_msg)
    })
}

fn resource_ids(resources: &[GuardedResource]) -> Vec<String> {
    resources.iter().map(|r| r.id().to_string()).collect()
}

// ============================================================================
// DAG variant
// ============================================================================

/// Renders one DAG per guarded resource and publishes it
pub struct DagProvisionService<R, T> {
    repository: R,
    templates: T,
    cgp: CgpSettings,
    airflow: AirflowSettings,
}

impl<R: DagRepository, T: TemplateRenderer> DagProvisionService<R, T> {
    pub fn new(repository: R, templates: T, cgp: CgpSettings, airflow: AirflowSettings) -> Self {
        Self {
            repository,
            templates,
            cgp,
            airflow,
        }
    }

    fn template_parameters(
        &self,
        data_product: &DataProduct,
        workload: &GxGuardianWorkload,
        resource: &GuardedResource,
        policy_id: &str,
        descriptor_json: &str,
    ) -> TemplateParameters {
        let scheduling = workload
            .guard_for(resource.id())
            .and_then(|g| g.monitoring_result_scheduling.as_ref())
            .map(|s| serde_json::Value::Object(s.clone()).to_string())
            .unwrap_or_else(|| "null".to_string());
        let dag_id = dag_name(resource.id(), &data_product.environment);

        [
            ("component_id", resource.id().to_string()),
            ("dag_id", dag_id),
            ("environment", data_product.environment.clone()),
            ("descriptor", descriptor_json.to_string()),
            ("policy_id", policy_id.to_string()),
            ("cgp_base_url", self.cgp.base_url.clone()),
            ("airflow_connection_id", self.airflow.connection_id.clone()),
            ("technology", resource.technology().to_string()),
            ("database", resource.database().to_string()),
            ("schema", resource.schema().to_string()),
            ("table", resource.table().to_string()),
            ("scheduling", scheduling),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// Full descriptor re-encoded as compact JSON with sorted keys
fn canonical_descriptor(full_descriptor: &str) -> Result<String, SystemErr> {
    parse_descriptor(full_descriptor)
        .map(|value| value.to_string())
        .map_err(|e| SystemErr::new(e.errors.join(" ")))
}

#[async_trait]
impl<R: DagRepository, T: TemplateRenderer> ProvisionService for DagProvisionService<R, T> {
    async fn provision(
        &self,
        data_product: &DataProduct,
        workload: &GxGuardianWorkload,
        resources: &[GuardedResource],
        full_descriptor: &str,
    ) -> Result<ProvisioningStatus, SystemErr> {
        let policy_id = require_policy_id(workload)?;
        let descriptor_json = canonical_descriptor(full_descriptor)?;

        for resource in resources {
            let parameters = self.template_parameters(
                data_product,
                workload,
                resource,
                policy_id,
                &descriptor_json,
            );
            let dag = self
                .templates
                .render_template(resource.technology(), &parameters)
                .map_err(system_err)?;
            self.repository
                .create_or_update_dag(resource.id(), &dag, &data_product.environment)
                .await
                .map_err(system_err)?;
        }

        info!(
            "Provisioned {} DAG(s) for guardian {}",
            resources.len(),
            workload.id
        );
        Ok(ProvisioningStatus::completed())
    }

    async fn unprovision(
        &self,
        data_product: &DataProduct,
        workload: &GxGuardianWorkload,
        resources: &[GuardedResource],
        _full_descriptor: &str,
    ) -> Result<ProvisioningStatus, SystemErr> {
        self.repository
            .delete_dags(&resource_ids(resources), &data_product.environment)
            .await
            .map_err(system_err)?;

        info!(
            "Unprovisioned {} DAG(s) for guardian {}",
            resources.len(),
            workload.id
        );
        Ok(ProvisioningStatus::completed())
    }
}

// ============================================================================
// Task variant
// ============================================================================

/// Persists one GX task per guarded resource
pub struct TaskProvisionService<R> {
    repository: R,
}

impl<R: GxTaskRepository> TaskProvisionService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: GxTaskRepository> ProvisionService for TaskProvisionService<R> {
    async fn provision(
        &self,
        _data_product: &DataProduct,
        workload: &GxGuardianWorkload,
        resources: &[GuardedResource],
        full_descriptor: &str,
    ) -> Result<ProvisioningStatus, SystemErr> {
        let policy_id = require_policy_id(workload)?;

        for resource in resources {
            let task = NewGxTask {
                component_id: resource.id().to_string(),
                passive_policy_id: policy_id.to_string(),
                full_descriptor: full_descriptor.to_string(),
            };
            self.repository
                .upsert_task(&task)
                .await
                .map_err(system_err)?;
        }

        info!(
            "Provisioned {} GX task(s) for guardian {}",
            resources.len(),
            workload.id
        );
        Ok(ProvisioningStatus::completed())
    }

    async fn unprovision(
        &self,
        _data_product: &DataProduct,
        workload: &GxGuardianWorkload,
        resources: &[GuardedResource],
        _full_descriptor: &str,
    ) -> Result<ProvisioningStatus, SystemErr> {
        self.repository
            .delete_tasks_by_component_ids(&resource_ids(resources))
            .await
            .map_err(system_err)?;

        info!(
            "Unprovisioned {} GX task(s) for guardian {}",
            resources.len(),
            workload.id
        );
        Ok(ProvisioningStatus::completed())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::{json, Value};

    use super::*;
    use crate::error::{DagRepositoryError, GxTaskRepositoryError, TemplateError};
    use crate::models::api::Status;
    use crate::repositories::task::{GxTask, InMemoryGxTaskRepository};

    const DESCRIPTOR: &str = "dataProduct:\n  id: dp\n  environment: development\n";

    fn snowflake_port(id: &str) -> GuardedResource {
        GuardedResource::from_component(&json!({
            "id": id,
            "kind": "outputport",
            "technology": "Snowflake",
            "dataContract": {"quality": []},
            "specific": {
                "database": "DB",
                "schema": "SCH",
                "tableName": "T",
                "viewName": "V"
            }
        }))
        .unwrap()
    }

    fn workload(ids: &[&str], policy_id: Option<&str>) -> GxGuardianWorkload {
        let guards: Vec<Value> = ids
            .iter()
            .map(|id| json!({"dataContractId": id, "monitoringResultScheduling": {"cron": "0 * * * *"}}))
            .collect();
        let mut raw = json!({
            "id": "guardian",
            "kind": "workload",
            "__dataContractGuardianSpec": {"guards": guards},
            "specific": {}
        });
        if let Some(policy_id) = policy_id {
            raw["info"] = json!({"privateInfo": {"__dataContractGuardian": {"policyId": policy_id}}});
        }
        serde_json::from_value(raw).unwrap()
    }

    fn data_product() -> DataProduct {
        serde_json::from_value(json!({"id": "dp", "environment": "development"})).unwrap()
    }

    fn settings() -> (CgpSettings, AirflowSettings) {
        (
            CgpSettings {
                base_url: "http://cgp".to_string(),
            },
            AirflowSettings {
                connection_id: "snowflake_default".to_string(),
            },
        )
    }

    /// Renders the parameters as `key=value` lines; fails on call `fail_at`
    #[derive(Default)]
    struct StubRenderer {
        calls: Mutex<usize>,
        fail_at: Option<usize>,
    }

    impl TemplateRenderer for StubRenderer {
        fn render_template(
            &self,
            technology: &str,
            parameters: &TemplateParameters,
        ) -> Result<String, TemplateError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if Some(*calls) == self.fail_at {
                return Err(TemplateError::Render {
                    technology: technology.to_string(),
                    details: "boom".to_string(),
                });
            }
            Ok(parameters
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }

    #[derive(Default)]
    struct RecordingDagRepository {
        published: Mutex<Vec<(String, String, String)>>,
        deleted: Mutex<Vec<Vec<String>>>,
        fail_publish: bool,
        fail_delete: bool,
    }

    #[async_trait]
    impl DagRepository for RecordingDagRepository {
        async fn create_or_update_dag(
            &self,
            data_contract_id: &str,
            content: &str,
            environment: &str,
        ) -> Result<(), DagRepositoryError> {
            if self.fail_publish {
                return Err(DagRepositoryError::Publish {
                    data_contract_id: data_contract_id.to_string(),
                    details: "denied".to_string(),
                });
            }
            self.published.lock().unwrap().push((
                data_contract_id.to_string(),
                content.to_string(),
                environment.to_string(),
            ));
            Ok(())
        }

        async fn delete_dags(
            &self,
            data_contract_ids: &[String],
            _environment: &str,
        ) -> Result<(), DagRepositoryError> {
            if self.fail_delete {
                return Err(DagRepositoryError::Delete {
                    details: "denied".to_string(),
                });
            }
            self.deleted.lock().unwrap().push(data_contract_ids.to_vec());
            Ok(())
        }
    }

    struct FailingTaskRepository;

    #[async_trait]
    impl GxTaskRepository for FailingTaskRepository {
        async fn upsert_task(&self, _: &NewGxTask) -> Result<GxTask, GxTaskRepositoryError> {
            Err(GxTaskRepositoryError::new("connection refused"))
        }

        async fn delete_tasks_by_component_ids(
            &self,
            _: &[String],
        ) -> Result<(), GxTaskRepositoryError> {
            Err(GxTaskRepositoryError::new("connection refused"))
        }

        async fn get_all_tasks(&self) -> Result<Vec<GxTask>, GxTaskRepositoryError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_dag_provision_publishes_every_resource() {
        let (cgp, airflow) = settings();
        let service = DagProvisionService::new(
            RecordingDagRepository::default(),
            StubRenderer::default(),
            cgp,
            airflow,
        );
        let resources = vec![snowflake_port("urn:op:a"), snowflake_port("urn:op:b")];

        let status = service
            .provision(
                &data_product(),
                &workload(&["urn:op:a", "urn:op:b"], Some("policy-1")),
                &resources,
                DESCRIPTOR,
            )
            .await
            .unwrap();

        assert_eq!(status.status, Status::Completed);
        let published = service.repository.published.lock().unwrap();
        assert_eq!(published.len(), 2);
        let (id, content, env) = &published[0];
        assert_eq!(id, "urn:op:a");
        assert_eq!(env, "development");
        assert!(content.contains("dag_id=dag_urn_op_a_development"));
        assert!(content.contains("policy_id=policy-1"));
        assert!(content.contains("cgp_base_url=http://cgp"));
        assert!(content.contains(r#"scheduling={"cron":"0 * * * *"}"#));
        assert!(content
            .contains(r#"descriptor={"dataProduct":{"environment":"development","id":"dp"}}"#));
    }

    #[tokio::test]
    async fn test_dag_provision_stops_at_first_render_failure() {
        let (cgp, airflow) = settings();
        let service = DagProvisionService::new(
            RecordingDagRepository::default(),
            StubRenderer {
                fail_at: Some(2),
                ..Default::default()
            },
            cgp,
            airflow,
        );
        let resources = vec![
            snowflake_port("urn:op:a"),
            snowflake_port("urn:op:b"),
            snowflake_port("urn:op:c"),
        ];

        let err = service
            .provision(
                &data_product(),
                &workload(&["urn:op:a", "urn:op:b", "urn:op:c"], Some("policy-1")),
                &resources,
                DESCRIPTOR,
            )
            .await
            .unwrap_err();

        assert!(err
            .error
            .starts_with("An error occurred while rendering the DAG for technology 'Snowflake'."));
        assert_eq!(*service.templates.calls.lock().unwrap(), 2);
        let published = service.repository.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "urn:op:a");
    }

    #[tokio::test]
    async fn test_dag_provision_publish_failure() {
        let (cgp, airflow) = settings();
        let service = DagProvisionService::new(
            RecordingDagRepository {
                fail_publish: true,
                ..Default::default()
            },
            StubRenderer::default(),
            cgp,
            airflow,
        );

        let err = service
            .provision(
                &data_product(),
                &workload(&["urn:op:a", "urn:op:b"], Some("policy-1")),
                &[snowflake_port("urn:op:a"), snowflake_port("urn:op:b")],
                DESCRIPTOR,
            )
            .await
            .unwrap_err();

        assert!(err
            .error
            .starts_with("An error occurred while publishing the DAG related to urn:op:a."));
        assert_eq!(*service.templates.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_provision_without_policy_id_touches_nothing() {
        let (cgp, airflow) = settings();
        let service = DagProvisionService::new(
            RecordingDagRepository::default(),
            StubRenderer::default(),
            cgp,
            airflow,
        );

        let err = service
            .provision(
                &data_product(),
                &workload(&["urn:op:a"], None),
                &[snowflake_port("urn:op:a")],
                DESCRIPTOR,
            )
            .await
            .unwrap_err();

        assert!(err.error.contains("no passive policy id"));
        assert_eq!(*service.templates.calls.lock().unwrap(), 0);
        assert!(service.repository.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dag_unprovision_is_one_bulk_delete() {
        let (cgp, airflow) = settings();
        let service = DagProvisionService::new(
            RecordingDagRepository::default(),
            StubRenderer::default(),
            cgp,
            airflow,
        );

        service
            .unprovision(
                &data_product(),
                &workload(&["urn:op:a", "urn:op:b"], None),
                &[snowflake_port("urn:op:a"), snowflake_port("urn:op:b")],
                DESCRIPTOR,
            )
            .await
            .unwrap();

        let deleted = service.repository.deleted.lock().unwrap();
        assert_eq!(*deleted, vec![vec!["urn:op:a".to_string(), "urn:op:b".to_string()]]);
    }

    #[tokio::test]
    async fn test_dag_unprovision_failure_is_system_error() {
        let (cgp, airflow) = settings();
        let service = DagProvisionService::new(
            RecordingDagRepository {
                fail_delete: true,
                ..Default::default()
            },
            StubRenderer::default(),
            cgp,
            airflow,
        );

        let err = service
            .unprovision(
                &data_product(),
                &workload(&["urn:op:a"], Some("policy-1")),
                &[snowflake_port("urn:op:a")],
                DESCRIPTOR,
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.error,
            "An error occurred while deleting the DAGs. Please try again later. Details: denied"
        );
    }

    #[tokio::test]
    async fn test_task_unprovision_failure_is_system_error() {
        let service = TaskProvisionService::new(FailingTaskRepository);

        let err = service
            .unprovision(
                &data_product(),
                &workload(&["urn:op:a"], Some("policy-1")),
                &[snowflake_port("urn:op:a")],
                DESCRIPTOR,
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.error,
            "An unexpected error occurred. Please try again or contact the platform team. Details: connection refused"
        );
    }

    #[tokio::test]
    async fn test_task_provision_and_unprovision() {
        let repo = InMemoryGxTaskRepository::new();
        let service = TaskProvisionService::new(repo.clone());
        let resources = vec![snowflake_port("urn:op:a"), snowflake_port("urn:op:b")];
        let guardian = workload(&["urn:op:a", "urn:op:b"], Some("policy-1"));

        service
            .provision(&data_product(), &guardian, &resources, DESCRIPTOR)
            .await
            .unwrap();
        let tasks = repo.get_all_tasks().await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.passive_policy_id == "policy-1"));
        assert!(tasks.iter().all(|t| t.full_descriptor == DESCRIPTOR));

        service
            .unprovision(&data_product(), &guardian, &resources, DESCRIPTOR)
            .await
            .unwrap();
        assert!(repo.get_all_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_task_provision_failure_is_system_error() {
        let service = TaskProvisionService::new(FailingTaskRepository);

        let err = service
            .provision(
                &data_product(),
                &workload(&["urn:op:a"], Some("policy-1")),
                &[snowflake_port("urn:op:a")],
                DESCRIPTOR,
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.error,
            "An unexpected error occurred. Please try again or contact the platform team. Details: connection refused"
        );
    }
}
