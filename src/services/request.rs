//! Request unpacking
//!
//! Turns the YAML descriptor carried by a request envelope into a parsed
//! [`DataProduct`] plus the id of the component to act on. Every defect is
//! reported as a [`ValidationError`].

use serde_json::Value;
use tracing::error;

use crate::models::api::{
    ProvisioningRequest, UpdateAclRequest, ValidationError, COMPONENT_DESCRIPTOR,
};
use crate::models::descriptor::DataProduct;

const DATA_PRODUCT_KEY: &str = "dataProduct";
const COMPONENT_ID_KEY: &str = "componentIdToProvision";

/// Data product and target component id extracted from a request
#[derive(Debug, Clone, PartialEq)]
pub struct UnpackedRequest {
    pub data_product: DataProduct,
    pub component_id: String,
}

/// Update-ACL request with the principals to grant
#[derive(Debug, Clone, PartialEq)]
pub struct UnpackedUpdateAclRequest {
    pub data_product: DataProduct,
    pub component_id: String,
    pub principals: Vec<String>,
}

pub fn unpack_provisioning_request(
    request: &ProvisioningRequest,
) -> Result<UnpackedRequest, ValidationError> {
    if request.descriptor_kind != COMPONENT_DESCRIPTOR {
        let error_msg = format!(
            "Expecting a {} but got a {} instead; please check with the platform team.",
            COMPONENT_DESCRIPTOR, request.descriptor_kind
        );
        error!("{}", error_msg);
        return Err(ValidationError::single(error_msg));
    }
    unpack_descriptor(&request.descriptor)
}

pub fn unpack_update_acl_request(
    request: &UpdateAclRequest,
) -> Result<UnpackedUpdateAclRequest, ValidationError> {
    let UnpackedRequest {
        data_product,
        component_id,
    } = unpack_descriptor(&request.provision_info.request)?;
    Ok(UnpackedUpdateAclRequest {
        data_product,
        component_id,
        principals: request.refs.clone(),
    })
}

/// Parse a YAML descriptor holding `dataProduct` and `componentIdToProvision`
pub fn unpack_descriptor(descriptor: &str) -> Result<UnpackedRequest, ValidationError> {
    let root = parse_descriptor(descriptor)?;

    let data_product = root
        .get(DATA_PRODUCT_KEY)
        .cloned()
        .ok_or_else(|| format!("missing field `{}`", DATA_PRODUCT_KEY))
        .and_then(|raw| serde_json::from_value::<DataProduct>(raw).map_err(|e| e.to_string()))
        .map_err(|cause| {
            error!("Unable to parse the data product: {}", cause);
            ValidationError::new(vec!["Unable to parse the descriptor.".to_string(), cause])
        })?;

    let component_id = root
        .get(COMPONENT_ID_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            let error_msg = "Component id to provision not found in descriptor";
            error!("{}", error_msg);
            ValidationError::single(error_msg)
        })?;

    Ok(UnpackedRequest {
        data_product,
        component_id,
    })
}

/// YAML descriptor as a JSON value (object keys sorted)
pub fn parse_descriptor(descriptor: &str) -> Result<Value, ValidationError> {
    serde_yaml::from_str::<Value>(descriptor).map_err(|e| {
        error!("Unable to parse the descriptor: {}", e);
        ValidationError::new(vec![
            "Unable to parse the descriptor.".to_string(),
            e.to_string(),
        ])
    })
}
