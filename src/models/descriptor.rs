//! Data product descriptor
//!
//! The descriptor is parsed once into a [`DataProduct`] whose components stay
//! untyped. Callers ask for a component by id *as* a given shape; the raw
//! component is checked against the shape's JSON Schema (so every structural
//! mismatch is reported, not just the first) and then deserialized.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ComponentShapeError;

pub const WORKLOAD_KIND: &str = "workload";
pub const OUTPUT_PORT_KIND: &str = "outputport";

/// Root of the descriptor tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProduct {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    pub environment: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data_product_owner: Option<String>,
    #[serde(default)]
    pub components: Vec<Value>,
}

/// A component shape that can be cast out of a raw descriptor component
pub trait ComponentShape: DeserializeOwned {
    /// Name used in error messages
    const SHAPE: &'static str;

    /// JSON Schema every raw component must satisfy before deserialization
    fn schema() -> Value;
}

impl DataProduct {
    /// Raw component with the given id, if any
    pub fn get_component_by_id(&self, id: &str) -> Option<&Value> {
        self.components
            .iter()
            .find(|c| component_id(c) == Some(id))
    }

    /// Look up a component and cast it to `T`.
    ///
    /// `Ok(None)` means no component has that id. A component that exists but
    /// does not match `T` is an error.
    pub fn get_typed_component_by_id<T: ComponentShape>(
        &self,
        id: &str,
    ) -> Result<Option<T>, ComponentShapeError> {
        self.get_component_by_id(id)
            .map(cast_component::<T>)
            .transpose()
    }

    /// Output ports carrying a data contract, in descriptor order
    pub fn get_data_contract_components(&self) -> Vec<&Value> {
        self.components
            .iter()
            .filter(|c| {
                c.get("kind").and_then(Value::as_str) == Some(OUTPUT_PORT_KIND)
                    && c.get("dataContract").is_some_and(Value::is_object)
            })
            .collect()
    }
}

pub fn component_id(component: &Value) -> Option<&str> {
    component.get("id").and_then(Value::as_str)
}

/// Validate `raw` against `T`'s schema, then deserialize it
pub fn cast_component<T: ComponentShape>(raw: &Value) -> Result<T, ComponentShapeError> {
    let schema = T::schema();
    let validator = jsonschema::validator_for(&schema).map_err(|e| {
        ComponentShapeError::new(vec![format!("Invalid schema for {}: {}", T::SHAPE, e)])
    })?;

    let errors: Vec<String> = validator
        .iter_errors(raw)
        .map(|e| {
            let path = e.instance_path.to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("{}: {}", path, e)
            }
        })
        .collect();
    if !errors.is_empty() {
        return Err(ComponentShapeError::new(errors));
    }

    serde_json::from_value(raw.clone()).map_err(|e| ComponentShapeError::new(vec![e.to_string()]))
}
