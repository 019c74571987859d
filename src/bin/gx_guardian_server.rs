//! gx_guardian_server: HTTP entry point of the GX guardian tech adapter.
//!
//! Reads `.env` when present, then settings from the environment (see
//! `gx_guardian_adapter::config`). `PROVISIONER_VARIANT` picks the backend:
//!   dag  - render Airflow DAGs and publish them to S3 (default)
//!   task - persist GX tasks in Postgres

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gx_guardian_adapter::api::{build_router, AppState};
use gx_guardian_adapter::config::{
    AirflowSettings, CgpSettings, DatabaseSettings, ProvisionerVariant, S3DagSettings,
    ServerSettings,
};
use gx_guardian_adapter::repositories::{ObjectStoreDagRepository, PgGxTaskRepository, S3ObjectStore};
use gx_guardian_adapter::services::template::TemplateService;
use gx_guardian_adapter::{DagProvisionService, ProvisionService, TaskProvisionService};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gx_guardian_adapter=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server = ServerSettings::from_env().context("invalid server settings")?;

    let service: Arc<dyn ProvisionService> = match server.variant {
        ProvisionerVariant::Dag => {
            let cgp = CgpSettings::from_env().context("invalid CGP settings")?;
            let airflow = AirflowSettings::from_env().context("invalid Airflow settings")?;
            let s3 = S3DagSettings::from_env().context("invalid S3 DAG settings")?;
            info!(
                "DAG provisioner publishing to s3://{}/{}",
                s3.bucket_name, s3.folder
            );

            let store = S3ObjectStore::from_env().await;
            Arc::new(DagProvisionService::new(
                ObjectStoreDagRepository::new(store, s3),
                TemplateService::new(),
                cgp,
                airflow,
            ))
        }
        ProvisionerVariant::Task => {
            let database = DatabaseSettings::from_env().context("invalid database settings")?;
            let pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .connect(&database.url)
                .await
                .context("failed to connect to database")?;
            info!("Connected to database");

            let repository = PgGxTaskRepository::new(pool);
            repository
                .migrate()
                .await
                .context("failed to run migrations")?;
            Arc::new(TaskProvisionService::new(repository))
        }
    };

    let app = build_router(AppState::new(service));

    let listener = TcpListener::bind(&server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", server.bind_addr))?;
    info!("gx_guardian_server listening on {}", server.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
