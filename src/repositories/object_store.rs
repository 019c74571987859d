//! Object store port
//!
//! The DAG repository only needs put and delete by key. [`S3ObjectStore`] is
//! the production backend; [`InMemoryObjectStore`] backs tests and local runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::ObjectStoreError;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` under `key`, replacing any existing object
    async fn put_object(&self, bucket: &str, key: &str, body: String)
        -> Result<(), ObjectStoreError>;

    /// Remove the object under `key`; removing a missing key succeeds
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Objects keyed by `(bucket, key)`. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<Mutex<BTreeMap<(String, String), String>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored in `bucket`, sorted
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub async fn get(&self, bucket: &str, key: &str) -> Option<String> {
        self.objects
            .lock()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: String,
    ) -> Result<(), ObjectStoreError> {
        self.objects
            .lock()
            .await
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        self.objects
            .lock()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

// ============================================================================
// S3
// ============================================================================

#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;

#[cfg(feature = "s3")]
mod s3 {
    use async_trait::async_trait;
    use aws_config::BehaviorVersion;
    use aws_sdk_s3::error::DisplayErrorContext;
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::Client;
    use tracing::debug;

    use super::ObjectStore;
    use crate::error::ObjectStoreError;

    /// S3 backend; credentials and region come from the default AWS provider chain
    #[derive(Debug, Clone)]
    pub struct S3ObjectStore {
        client: Client,
    }

    impl S3ObjectStore {
        pub fn new(client: Client) -> Self {
            Self { client }
        }

        pub async fn from_env() -> Self {
            let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
            Self::new(Client::new(&config))
        }
    }

    #[async_trait]
    impl ObjectStore for S3ObjectStore {
        async fn put_object(
            &self,
            bucket: &str,
            key: &str,
            body: String,
        ) -> Result<(), ObjectStoreError> {
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(body.into_bytes()))
                .send()
                .await
                .map_err(|e| ObjectStoreError {
                    key: key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                })?;
            debug!("Put s3://{}/{}", bucket, key);
            Ok(())
        }

        async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
            self.client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| ObjectStoreError {
                    key: key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                })?;
            debug!("Deleted s3://{}/{}", bucket, key);
            Ok(())
        }
    }
}
