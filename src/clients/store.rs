//! Object store client backed by the `object_store` crate.

use crate::{
    config::StoreConfig,
    errors::{StoreError, StoreResult},
};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::{
    ClientOptions, ObjectStore, PutPayload, aws::AmazonS3Builder, path::Path as ObjectPath,
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::debug;

/// Per-request timeout applied to every store call.
pub const STORE_REQUEST_TIMEOUT: Duration = Duration::from_secs(50);

/// Result of a successful `put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutput {
    /// Key the store reports for the written object.
    pub key: String,
}

/// Location for `key`, provided the store would address it under exactly
/// that name. Keys the path syntax would rewrite (leading or trailing `/`,
/// empty or relative segments, control characters) are rejected.
pub fn object_path(key: &str) -> StoreResult<ObjectPath> {
    let invalid = || StoreError::InvalidKey(key.to_string());
    let location = ObjectPath::parse(key).map_err(|_| invalid())?;
    if key.is_empty() || location.as_ref() != key {
        return Err(invalid());
    }
    Ok(location)
}

#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> StoreResult<PutOutput>;

    async fn remove(&self, bucket: &str, key: &str) -> StoreResult<()>;
}

/// Routes calls to one `ObjectStore` per bucket.
#[derive(Clone, Default)]
pub struct BucketStore {
    buckets: HashMap<String, Arc<dyn ObjectStore>>,
}

impl BucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `store` as the backend for `bucket`.
    pub fn with_bucket(mut self, bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        self.buckets.insert(bucket.into(), store);
        self
    }

    /// Build an S3 client for the configured bucket.
    pub fn from_config(cfg: &StoreConfig) -> StoreResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&cfg.bucket_name)
            .with_region(&cfg.region)
            .with_endpoint(cfg.endpoint_url())
            .with_allow_http(!cfg.use_ssl)
            .with_client_options(ClientOptions::new().with_timeout(STORE_REQUEST_TIMEOUT));

        if !cfg.access_key.is_empty() {
            builder = builder.with_access_key_id(&cfg.access_key);
        }
        if !cfg.secret_key.is_empty() {
            builder = builder.with_secret_access_key(&cfg.secret_key);
        }

        let store = builder.build()?;
        Ok(Self::new().with_bucket(cfg.bucket_name.clone(), Arc::new(store)))
    }

    fn bucket(&self, bucket: &str) -> StoreResult<&Arc<dyn ObjectStore>> {
        self.buckets
            .get(bucket)
            .ok_or_else(|| StoreError::UnknownBucket(bucket.to_string()))
    }
}

#[async_trait]
impl ObjectStoreClient for BucketStore {
    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> StoreResult<PutOutput> {
        let store = self.bucket(bucket)?;
        let location = object_path(key)?;
        let size = data.len();

        let result = store.put(&location, PutPayload::from(data)).await?;
        debug!(bucket, key, size, e_tag = ?result.e_tag, "object stored");

        Ok(PutOutput {
            key: location.as_ref().to_string(),
        })
    }

    async fn remove(&self, bucket: &str, key: &str) -> StoreResult<()> {
        let store = self.bucket(bucket)?;
        store.delete(&object_path(key)?).await?;
        debug!(bucket, key, "object removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use object_store::memory::InMemory;

    fn store_with(bucket: &str) -> (BucketStore, Arc<InMemory>) {
        let memory = Arc::new(InMemory::new());
        let store = BucketStore::new().with_bucket(bucket, memory.clone());
        (store, memory)
    }

    #[tokio::test]
    async fn put_writes_payload_and_echoes_key() {
        let (store, memory) = store_with("bucket");

        let out = store
            .put("bucket", "photo.png_abc", Bytes::from_static(b"data"))
            .await
            .unwrap();

        assert_eq!(out.key, "photo.png_abc");
        let stored = memory
            .get(&ObjectPath::from("photo.png_abc"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(stored.as_ref(), b"data");
    }

    #[tokio::test]
    async fn remove_deletes_object() {
        let (store, memory) = store_with("bucket");
        store
            .put("bucket", "object", Bytes::from_static(b"data"))
            .await
            .unwrap();

        store.remove("bucket", "object").await.unwrap();

        assert!(memory.head(&ObjectPath::from("object")).await.is_err());
    }

    #[tokio::test]
    async fn unknown_bucket_is_rejected() {
        let (store, _) = store_with("bucket");

        let err = store
            .put("other", "object", Bytes::from_static(b"data"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::UnknownBucket(name) if name == "other"));
    }

    #[tokio::test]
    async fn keys_with_reserved_characters_are_stored_verbatim() {
        let (store, memory) = store_with("bucket");

        for key in ["photo #1.png_abc", "100%.png_abc", "a b?.png_abc"] {
            let out = store
                .put("bucket", key, Bytes::from_static(b"data"))
                .await
                .unwrap();
            assert_eq!(out.key, key);

            store.remove("bucket", &out.key).await.unwrap();
        }

        let left: Vec<_> = memory.list(None).collect().await;
        assert!(left.is_empty(), "objects left behind: {left:?}");
    }

    #[tokio::test]
    async fn keys_the_store_would_rewrite_are_rejected() {
        let (store, memory) = store_with("bucket");

        for key in ["/lead.png_abc", "a//b_abc", "trail/_abc/", "../up_abc", ""] {
            let err = store
                .put("bucket", key, Bytes::from_static(b"data"))
                .await
                .unwrap_err();
            assert!(matches!(&err, StoreError::InvalidKey(k) if k == key), "{key:?}: {err}");

            let err = store.remove("bucket", key).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidKey(_)));
        }

        let left: Vec<_> = memory.list(None).collect().await;
        assert!(left.is_empty());
    }

    #[test]
    fn object_path_keeps_nested_keys() {
        assert_eq!(object_path("dir/photo.png_abc").unwrap().as_ref(), "dir/photo.png_abc");
        assert!(object_path("dir//photo.png_abc").is_err());
    }
}
