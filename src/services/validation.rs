//! Component validation
//!
//! Checks, in order and failing fast between stages:
//! 1. the target component parses as a guardian workload,
//! 2. every guarded id is a data contract component of the data product,
//! 3. every guarded component is a supported resource technology.

use std::collections::HashSet;

use tracing::{debug, error};

use crate::models::api::ValidationError;
use crate::models::descriptor::{component_id, DataProduct};
use crate::models::gx::{GuardedResource, GxGuardianWorkload};

const UNSUPPORTED_HEADER: &str =
    "One or more components to guard are not supported by this Tech Adapter:";

/// Outcome of a successful validation, consumed by the provisioning services
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedComponents {
    pub data_product: DataProduct,
    pub workload: GxGuardianWorkload,
    /// In guard declaration order
    pub resources: Vec<GuardedResource>,
}

pub fn validate_components(
    data_product: DataProduct,
    component_id_to_provision: &str,
) -> Result<ValidatedComponents, ValidationError> {
    let workload = match data_product
        .get_typed_component_by_id::<GxGuardianWorkload>(component_id_to_provision)
    {
        Ok(Some(workload)) => workload,
        Ok(None) => {
            let error_msg = format!(
                "Component with ID {} not found in descriptor",
                component_id_to_provision
            );
            error!("{}", error_msg);
            return Err(ValidationError::single(error_msg));
        }
        Err(shape) => {
            let error_msg = format!(
                "Failed to parse the component {} as a GXGuardianWorkload:",
                component_id_to_provision
            );
            error!("{} {:?}", error_msg, shape.errors);
            let mut combined = vec![error_msg];
            combined.extend(shape.errors);
            return Err(ValidationError::new(combined));
        }
    };

    let resources = {
        let data_contracts = data_product.get_data_contract_components();
        let mut seen = HashSet::new();
        let to_guard: Vec<_> = workload
            .guards()
            .iter()
            .filter_map(|guard| {
                data_contracts
                    .iter()
                    .copied()
                    .find(|c| component_id(c) == Some(guard.data_contract_id.as_str()))
            })
            .filter(|c| seen.insert(component_id(*c)))
            .collect();

        let declared = workload.guards().len();
        if to_guard.len() != declared {
            let error_msg = format!(
                "Not all components to guard ({}) are defined as Data Contracts in descriptor ({})",
                declared,
                to_guard.len()
            );
            error!("{}", error_msg);
            return Err(ValidationError::single(error_msg));
        }

        let mut resources = Vec::with_capacity(to_guard.len());
        let mut failures = Vec::new();
        for raw in to_guard {
            match GuardedResource::from_component(raw) {
                Ok(resource) => resources.push(resource),
                Err(shape) => failures.extend(shape.errors),
            }
        }
        if !failures.is_empty() {
            error!(
                "The Data Contract components are not valid Snowflake Output Ports: {:?}",
                failures
            );
            let mut combined = vec![UNSUPPORTED_HEADER.to_string()];
            combined.extend(failures);
            return Err(ValidationError::new(combined));
        }
        resources
    };

    debug!(
        "Validated guardian {} with {} guarded resource(s)",
        workload.id,
        resources.len()
    );
    Ok(ValidatedComponents {
        data_product,
        workload,
        resources,
    })
}
