//! Request and response envelopes of the provisioning API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Only component descriptors can be provisioned by this adapter
pub const COMPONENT_DESCRIPTOR: &str = "COMPONENT_DESCRIPTOR";

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningRequest {
    pub descriptor_kind: String,
    /// YAML document with `dataProduct` and `componentIdToProvision`
    pub descriptor: String,
    #[serde(default)]
    pub remove_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub descriptor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionInfo {
    /// Descriptor of the latest successful provisioning request
    pub request: String,
    pub result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAclRequest {
    /// Principals that should be granted access
    pub refs: Vec<String>,
    pub provision_info: ProvisionInfo,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningStatus {
    pub status: Status,
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
}

impl ProvisioningStatus {
    pub fn completed() -> Self {
        Self {
            status: Status::Completed,
            result: String::new(),
            info: None,
        }
    }
}

/// Caller-input defect, surfaced as HTTP 400
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub errors: Vec<String>,
}

impl ValidationError {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

/// Backend or transport failure, surfaced as HTTP 500
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemErr {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_error_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_info: Option<Value>,
}

impl SystemErr {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            user_message: None,
            input: None,
            input_error_field: None,
            more_info: None,
        }
    }

    pub fn not_implemented() -> Self {
        Self::new("Response not yet implemented")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ValidationError>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: ValidationError) -> Self {
        Self {
            valid: false,
            error: Some(error),
        }
    }
}
