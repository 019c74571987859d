//! Route handlers
//!
//! Provision, unprovision and validate share one pipeline: unpack the
//! envelope, validate the guardian and its guarded components, then (except
//! for validate) hand the result to the configured [`ProvisionService`](crate::services::provision::ProvisionService).

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};
use tracing::info;

use super::{ApiError, AppState};
use crate::models::api::{
    ProvisioningRequest, ProvisioningStatus, SystemErr, UpdateAclRequest, ValidationError,
    ValidationRequest, ValidationResult,
};
use crate::services::request::{unpack_provisioning_request, unpack_update_acl_request};
use crate::services::validation::{validate_components, ValidatedComponents};

fn validate_request(request: &ProvisioningRequest) -> Result<ValidatedComponents, ValidationError> {
    let unpacked = unpack_provisioning_request(request)?;
    validate_components(unpacked.data_product, &unpacked.component_id)
}

/// POST /v1/provision
pub async fn provision(
    State(state): State<AppState>,
    Json(request): Json<ProvisioningRequest>,
) -> Result<Json<ProvisioningStatus>, ApiError> {
    let validated = validate_request(&request)?;
    info!(
        "Provisioning guardian {} of {}",
        validated.workload.id, validated.data_product.id
    );
    let status = state
        .service
        .provision(
            &validated.data_product,
            &validated.workload,
            &validated.resources,
            &request.descriptor,
        )
        .await?;
    Ok(Json(status))
}

/// GET /v1/provision/:token/status
pub async fn get_status(Path(_token): Path<String>) -> Result<Json<ProvisioningStatus>, ApiError> {
    Err(SystemErr::not_implemented().into())
}

/// POST /v1/unprovision
pub async fn unprovision(
    State(state): State<AppState>,
    Json(request): Json<ProvisioningRequest>,
) -> Result<Json<ProvisioningStatus>, ApiError> {
    let validated = validate_request(&request)?;
    info!(
        "Unprovisioning guardian {} of {}",
        validated.workload.id, validated.data_product.id
    );
    let status = state
        .service
        .unprovision(
            &validated.data_product,
            &validated.workload,
            &validated.resources,
            &request.descriptor,
        )
        .await?;
    Ok(Json(status))
}

/// POST /v1/updateacl
pub async fn update_acl(
    Json(request): Json<UpdateAclRequest>,
) -> Result<Json<ProvisioningStatus>, ApiError> {
    let unpacked = unpack_update_acl_request(&request)?;
    info!(
        "Access update requested for {} ({} principal(s))",
        unpacked.component_id,
        unpacked.principals.len()
    );
    Err(SystemErr::not_implemented().into())
}

/// POST /v1/validate
pub async fn validate(Json(request): Json<ProvisioningRequest>) -> Json<ValidationResult> {
    match validate_request(&request) {
        Ok(_) => Json(ValidationResult::valid()),
        Err(e) => Json(ValidationResult::invalid(e)),
    }
}

/// POST /v2/validate
pub async fn async_validate(Json(_request): Json<ValidationRequest>) -> Result<Json<Value>, ApiError> {
    Err(SystemErr::not_implemented().into())
}

/// GET /v2/validate/:token/status
pub async fn get_validation_status(Path(_token): Path<String>) -> Result<Json<Value>, ApiError> {
    Err(SystemErr::not_implemented().into())
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
