//! Guardian workload and guarded resource shapes
//!
//! A guardian workload lists the data contracts it guards. Each guarded data
//! contract must be an output port of a supported technology; today that is
//! Snowflake only. Adding a technology means adding a [`GuardedResource`]
//! variant, its schema, and a DAG template.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::descriptor::{cast_component, ComponentShape};
use crate::error::ComponentShapeError;

// ============================================================================
// Guardian workload
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guard {
    pub data_contract_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_result_scheduling: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataContractGuardianSpec {
    pub guards: Vec<Guard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataContractGuardian {
    pub policy_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardianPrivateInfo {
    #[serde(rename = "__dataContractGuardian")]
    pub data_contract_guardian: DataContractGuardian,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianInfo {
    pub private_info: GuardianPrivateInfo,
}

/// Workload component that requests guards over data contracts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GxGuardianWorkload {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub kind: String,
    #[serde(rename = "__dataContractGuardianSpec")]
    pub data_contract_guardian_spec: DataContractGuardianSpec,
    pub specific: Map<String, Value>,
    #[serde(default)]
    pub info: Option<GuardianInfo>,
}

impl GxGuardianWorkload {
    /// Passive monitoring policy attached to this guardian, once assigned
    pub fn policy_id(&self) -> Option<&str> {
        self.info
            .as_ref()
            .map(|info| info.private_info.data_contract_guardian.policy_id.as_str())
    }

    pub fn guards(&self) -> &[Guard] {
        &self.data_contract_guardian_spec.guards
    }

    pub fn guard_for(&self, data_contract_id: &str) -> Option<&Guard> {
        self.guards()
            .iter()
            .find(|g| g.data_contract_id == data_contract_id)
    }
}

impl ComponentShape for GxGuardianWorkload {
    const SHAPE: &'static str = "GXGuardianWorkload";

    fn schema() -> Value {
        json!({
            "type": "object",
            "required": ["id", "kind", "__dataContractGuardianSpec", "specific"],
            "properties": {
                "id": {"type": "string"},
                "name": {"type": "string"},
                "kind": {"const": "workload"},
                "__dataContractGuardianSpec": {
                    "type": "object",
                    "required": ["guards"],
                    "properties": {
                        "guards": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["dataContractId"],
                                "properties": {
                                    "dataContractId": {"type": "string"},
                                    "monitoringResultScheduling": {"type": ["object", "null"]}
                                }
                            }
                        }
                    }
                },
                "specific": {"type": "object"},
                "info": {
                    "type": ["object", "null"],
                    "required": ["privateInfo"],
                    "properties": {
                        "privateInfo": {
                            "type": "object",
                            "required": ["__dataContractGuardian"],
                            "properties": {
                                "__dataContractGuardian": {
                                    "type": "object",
                                    "required": ["policyId"],
                                    "properties": {"policyId": {"type": "string"}}
                                }
                            }
                        }
                    }
                }
            }
        })
    }
}

// ============================================================================
// GX data contract
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GxImplementation {
    #[serde(rename = "type")]
    pub expectation_type: String,
    pub args: Map<String, Value>,
}

/// A Great Expectations expectation declared in a data contract's quality section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GxExpectation {
    #[serde(rename = "type")]
    pub quality_type: String,
    pub engine: String,
    pub implementation: GxImplementation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GxDataContract {
    pub quality: Vec<GxExpectation>,
    /// Schema, SLA and the other contract sections, kept verbatim
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

fn gx_data_contract_schema() -> Value {
    json!({
        "type": "object",
        "required": ["quality"],
        "properties": {
            "quality": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["type", "engine", "implementation"],
                    "properties": {
                        "type": {"const": "custom"},
                        "engine": {"const": "greatExpectations"},
                        "implementation": {
                            "type": "object",
                            "required": ["type", "args"],
                            "properties": {
                                "type": {"type": "string"},
                                "args": {"type": "object"}
                            }
                        }
                    }
                }
            }
        }
    })
}

// ============================================================================
// Guarded resources
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnowflakeSpecific {
    pub database: String,
    pub schema: String,
    pub table_name: String,
    pub view_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnowflakeOutputPort {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub technology: String,
    pub data_contract: GxDataContract,
    pub specific: SnowflakeSpecific,
}

impl ComponentShape for SnowflakeOutputPort {
    const SHAPE: &'static str = "SnowflakeOutputPort";

    fn schema() -> Value {
        json!({
            "type": "object",
            "required": ["id", "kind", "technology", "dataContract", "specific"],
            "properties": {
                "id": {"type": "string"},
                "name": {"type": "string"},
                "kind": {"const": "outputport"},
                "technology": {"const": "Snowflake"},
                "dataContract": gx_data_contract_schema(),
                "specific": {
                    "type": "object",
                    "required": ["database", "schema", "tableName", "viewName"],
                    "properties": {
                        "database": {"type": "string"},
                        "schema": {"type": "string"},
                        "tableName": {"type": "string"},
                        "viewName": {"type": "string"}
                    }
                }
            }
        })
    }
}

/// A data contract component this adapter knows how to guard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GuardedResource {
    Snowflake(SnowflakeOutputPort),
}

type Converter = fn(&Value) -> Result<GuardedResource, ComponentShapeError>;

const CONVERTERS: &[Converter] = &[snowflake_output_port];

fn snowflake_output_port(raw: &Value) -> Result<GuardedResource, ComponentShapeError> {
    cast_component::<SnowflakeOutputPort>(raw).map(GuardedResource::Snowflake)
}

impl GuardedResource {
    /// Try every supported variant in turn.
    ///
    /// Fails with the structural errors of every attempted variant when none
    /// of them matches.
    pub fn from_component(raw: &Value) -> Result<Self, ComponentShapeError> {
        let mut errors = Vec::new();
        for convert in CONVERTERS {
            match convert(raw) {
                Ok(resource) => return Ok(resource),
                Err(e) => errors.extend(e.errors),
            }
        }
        Err(ComponentShapeError::new(errors))
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Snowflake(op) => &op.id,
        }
    }

    pub fn contract(&self) -> &GxDataContract {
        match self {
            Self::Snowflake(op) => &op.data_contract,
        }
    }

    pub fn technology(&self) -> &str {
        match self {
            Self::Snowflake(op) => &op.technology,
        }
    }

    pub fn database(&self) -> &str {
        match self {
            Self::Snowflake(op) => &op.specific.database,
        }
    }

    pub fn schema(&self) -> &str {
        match self {
            Self::Snowflake(op) => &op.specific.schema,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Self::Snowflake(op) => &op.specific.table_name,
        }
    }
}
