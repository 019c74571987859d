//! Settings for the guardian tech adapter
//!
//! Every settings struct is built once at startup from environment variables
//! (after `dotenvy` has loaded `.env`) and then passed by value into the
//! components that need it. Nothing in the provisioning path reads the
//! environment directly.
//!
//! | Variable                  | Struct             | Default         |
//! |---------------------------|--------------------|-----------------|
//! | `PROVISIONER_VARIANT`     | `ServerSettings`   | `dag`           |
//! | `BIND_ADDR`               | `ServerSettings`   | `0.0.0.0:8888`  |
//! | `CGP_BASE_URL`            | `CgpSettings`      | required        |
//! | `AIRFLOW_CONNECTION_ID`   | `AirflowSettings`  | required        |
//! | `S3_DAG_BUCKET_NAME`      | `S3DagSettings`    | required        |
//! | `S3_DAG_FOLDER`           | `S3DagSettings`    | required        |
//! | `DATABASE_URL`            | `DatabaseSettings` | required        |
//! | `DATABASE_MAX_CONNECTIONS`| `DatabaseSettings` | `5`             |

use std::str::FromStr;

use crate::error::ConfigError;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8888";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Which publisher backend this deployment provisions through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProvisionerVariant {
    /// Render a DAG per guarded resource and publish it to the object store
    #[default]
    Dag,
    /// Persist one GX task row per guarded resource
    Task,
}

impl FromStr for ProvisionerVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dag" => Ok(Self::Dag),
            "task" => Ok(Self::Task),
            other => Err(ConfigError::Invalid {
                name: "PROVISIONER_VARIANT".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind_addr: String,
    pub variant: ProvisionerVariant,
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let variant = match lookup("PROVISIONER_VARIANT") {
            Some(raw) => raw.parse()?,
            None => ProvisionerVariant::default(),
        };
        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            variant,
        })
    }
}

/// Data Contract Guardian Platform endpoint the DAGs report results to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgpSettings {
    pub base_url: String,
}

impl CgpSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: required(&lookup, "CGP_BASE_URL")?,
        })
    }
}

/// Airflow connection used by rendered DAGs to reach the warehouse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirflowSettings {
    pub connection_id: String,
}

impl AirflowSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            connection_id: required(&lookup, "AIRFLOW_CONNECTION_ID")?,
        })
    }
}

/// Bucket and folder Airflow reads DAG files from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3DagSettings {
    pub bucket_name: String,
    pub folder: String,
}

impl S3DagSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            bucket_name: required(&lookup, "S3_DAG_BUCKET_NAME")?,
            folder: required(&lookup, "S3_DAG_FOLDER")?,
        })
    }
}

/// Relational store holding GX tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS".to_string(),
                value: raw.clone(),
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        Ok(Self {
            url: required(&lookup, "DATABASE_URL")?,
            max_connections,
        })
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String, ConfigError> {
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_server_settings_defaults() {
        let settings = ServerSettings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(settings.variant, ProvisionerVariant::Dag);
    }

    #[test]
    fn test_variant_parse() {
        let settings =
            ServerSettings::from_lookup(lookup_from(&[("PROVISIONER_VARIANT", "Task")])).unwrap();
        assert_eq!(settings.variant, ProvisionerVariant::Task);

        let err = ServerSettings::from_lookup(lookup_from(&[("PROVISIONER_VARIANT", "ftp")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_missing_required_setting() {
        let err = S3DagSettings::from_lookup(lookup_from(&[("S3_DAG_BUCKET_NAME", "dags")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("S3_DAG_FOLDER".to_string()));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let err = CgpSettings::from_lookup(lookup_from(&[("CGP_BASE_URL", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("CGP_BASE_URL".to_string()));
    }

    #[test]
    fn test_database_settings() {
        let settings = DatabaseSettings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgresql:///gx"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(settings.url, "postgresql:///gx");
        assert_eq!(settings.max_connections, 12);

        let err = DatabaseSettings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgresql:///gx"),
            ("DATABASE_MAX_CONNECTIONS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
