//! Repository — translates object operations into calls on the object store,
//! the HTTP existence check and (optionally) the metadata index.
//!
//! There is no branching here beyond error wrapping and the metadata variant:
//! - `upload` → store `put`, then metadata `create` when an index is configured
//! - `delete` → store `remove`, then best-effort metadata `delete`
//! - `get`    → metadata `find_one` when configured, otherwise HTTP GET on the URL

use crate::{
    clients::{HttpClient, MetadataStore, ObjectStoreClient},
    errors::{RepositoryError, RepositoryResult},
    models::object::Object,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};

#[async_trait]
pub trait ObjectRepository: Send + Sync {
    /// Store `data` under `bucket/key`; returns `(url, key)`.
    async fn upload(
        &self,
        data: Bytes,
        bucket: &str,
        key: &str,
    ) -> RepositoryResult<(String, String)>;

    async fn delete(&self, bucket: &str, key: &str) -> RepositoryResult<()>;

    /// URL of the object, or `None` when it does not exist.
    async fn get(&self, bucket: &str, key: &str) -> RepositoryResult<Option<String>>;

    fn get_url(&self, bucket: &str, key: &str) -> String;
}

/// Repository over the concrete store clients.
#[derive(Clone)]
pub struct StoreRepository {
    endpoint: String,
    store: Arc<dyn ObjectStoreClient>,
    http: Arc<dyn HttpClient>,
    metadata: Option<Arc<dyn MetadataStore>>,
}

impl StoreRepository {
    /// `endpoint` is the public host used to build object URLs.
    pub fn new(
        endpoint: impl Into<String>,
        store: Arc<dyn ObjectStoreClient>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            store,
            http,
            metadata: None,
        }
    }

    /// Enable the metadata index variant.
    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataStore>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[async_trait]
impl ObjectRepository for StoreRepository {
    async fn upload(
        &self,
        data: Bytes,
        bucket: &str,
        key: &str,
    ) -> RepositoryResult<(String, String)> {
        let output = self
            .store
            .put(bucket, key, data)
            .await
            .map_err(|source| RepositoryError::Upload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            })?;

        let url = self.get_url(bucket, &output.key);

        if let Some(metadata) = &self.metadata {
            metadata
                .create(&Object::new(url.clone(), output.key.clone()))
                .await
                .map_err(|source| RepositoryError::Metadata {
                    key: output.key.clone(),
                    source,
                })?;
        }

        Ok((url, output.key))
    }

    async fn delete(&self, bucket: &str, key: &str) -> RepositoryResult<()> {
        self.store
            .remove(bucket, key)
            .await
            .map_err(|source| RepositoryError::Delete {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            })?;

        // The object is gone; a stale index row is only logged.
        if let Some(metadata) = &self.metadata {
            if let Err(err) = metadata.delete(key).await {
                warn!(error = %err, bucket, key, "metadata cleanup failed after delete");
            }
        }

        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> RepositoryResult<Option<String>> {
        let wrap = |source| RepositoryError::Get {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        };

        if let Some(metadata) = &self.metadata {
            let row = metadata.find_one(key).await.map_err(wrap)?;
            return Ok(row.map(|object| object.image_url));
        }

        let url = self.get_url(bucket, key);
        let status = self.http.get_status(&url).await.map_err(wrap)?;
        if status != 200 {
            debug!(bucket, key, status, "object not reachable");
            return Ok(None);
        }

        Ok(Some(url))
    }

    fn get_url(&self, bucket: &str, key: &str) -> String {
        format!("https://{}/{}/{}", self.endpoint, bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clients::{BucketStore, SqliteMetadataStore},
        errors::{StoreError, StoreResult},
    };
    use futures::StreamExt;
    use object_store::{ObjectStore, memory::InMemory, path::Path as ObjectPath};
    use std::sync::Mutex;

    const ENDPOINT: &str = "mock-endpoint";

    /// Answers every GET with a fixed status and records the URLs it saw.
    struct FakeHttp {
        status: Option<u16>,
        seen: Mutex<Vec<String>>,
    }

    impl FakeHttp {
        fn responding(status: u16) -> Arc<Self> {
            Arc::new(Self {
                status: Some(status),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                status: None,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpClient for FakeHttp {
        async fn get_status(&self, url: &str) -> StoreResult<u16> {
            self.seen.lock().unwrap().push(url.to_string());
            self.status
                .ok_or_else(|| StoreError::UnknownBucket("unreachable".into()))
        }
    }

    struct BrokenMetadata;

    #[async_trait]
    impl MetadataStore for BrokenMetadata {
        async fn create(&self, _object: &Object) -> StoreResult<()> {
            Err(StoreError::Sqlx(sqlx::Error::PoolClosed))
        }

        async fn find_one(&self, _object_key: &str) -> StoreResult<Option<Object>> {
            Err(StoreError::Sqlx(sqlx::Error::PoolClosed))
        }

        async fn delete(&self, _object_key: &str) -> StoreResult<()> {
            Err(StoreError::Sqlx(sqlx::Error::PoolClosed))
        }
    }

    fn repo_with(http: Arc<FakeHttp>) -> (StoreRepository, Arc<InMemory>) {
        let memory = Arc::new(InMemory::new());
        let store = BucketStore::new().with_bucket("bucket", memory.clone());
        (StoreRepository::new(ENDPOINT, Arc::new(store), http), memory)
    }

    #[test]
    fn get_url_is_deterministic() {
        let (repo, _) = repo_with(FakeHttp::responding(200));

        assert_eq!(
            repo.get_url("bucket", "object"),
            "https://mock-endpoint/bucket/object"
        );
    }

    #[tokio::test]
    async fn upload_returns_url_and_store_key() {
        let (repo, memory) = repo_with(FakeHttp::responding(200));

        let (url, key) = repo
            .upload(Bytes::from_static(b"data"), "bucket", "object")
            .await
            .unwrap();

        assert_eq!(key, "object");
        assert_eq!(url, repo.get_url("bucket", "object"));
        assert!(memory.head(&ObjectPath::from("object")).await.is_ok());
    }

    #[tokio::test]
    async fn upload_to_unknown_bucket_fails() {
        let (repo, _) = repo_with(FakeHttp::responding(200));

        let err = repo
            .upload(Bytes::from_static(b"data"), "missing", "object")
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Upload { .. }));
    }

    #[tokio::test]
    async fn delete_removes_object() {
        let (repo, memory) = repo_with(FakeHttp::responding(200));
        repo.upload(Bytes::from_static(b"data"), "bucket", "object")
            .await
            .unwrap();

        repo.delete("bucket", "object").await.unwrap();

        assert!(memory.head(&ObjectPath::from("object")).await.is_err());
    }

    #[tokio::test]
    async fn delete_error_is_wrapped() {
        let (repo, _) = repo_with(FakeHttp::responding(200));

        let err = repo.delete("missing", "object").await.unwrap_err();

        assert!(matches!(err, RepositoryError::Delete { .. }));
    }

    #[tokio::test]
    async fn get_checks_constructed_url() {
        let http = FakeHttp::responding(200);
        let (repo, _) = repo_with(http.clone());

        let url = repo.get("bucket", "object").await.unwrap();

        assert_eq!(url.as_deref(), Some("https://mock-endpoint/bucket/object"));
        assert_eq!(
            http.seen.lock().unwrap().as_slice(),
            ["https://mock-endpoint/bucket/object".to_string()]
        );
    }

    #[tokio::test]
    async fn get_non_ok_status_is_not_found() {
        let (repo, _) = repo_with(FakeHttp::responding(404));

        assert_eq!(repo.get("bucket", "object").await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_transport_error_is_error() {
        let (repo, _) = repo_with(FakeHttp::failing());

        let err = repo.get("bucket", "object").await.unwrap_err();

        assert!(matches!(err, RepositoryError::Get { .. }));
    }

    #[tokio::test]
    async fn metadata_row_follows_object_lifecycle() {
        let http = FakeHttp::failing();
        let (repo, _) = repo_with(http.clone());
        let metadata = Arc::new(SqliteMetadataStore::in_memory().await.unwrap());
        let repo = repo.with_metadata(metadata.clone());

        let (url, key) = repo
            .upload(Bytes::from_static(b"data"), "bucket", "object")
            .await
            .unwrap();
        let row = metadata.find_one(&key).await.unwrap().unwrap();
        assert_eq!(row.image_url, url);

        assert_eq!(repo.get("bucket", "object").await.unwrap(), Some(url));
        assert!(http.seen.lock().unwrap().is_empty());

        repo.delete("bucket", "object").await.unwrap();
        assert!(metadata.find_one(&key).await.unwrap().is_none());
        assert_eq!(repo.get("bucket", "object").await.unwrap(), None);
    }

    #[tokio::test]
    async fn metadata_create_failure_fails_upload() {
        let (repo, _) = repo_with(FakeHttp::responding(200));
        let repo = repo.with_metadata(Arc::new(BrokenMetadata));

        let err = repo
            .upload(Bytes::from_static(b"data"), "bucket", "object")
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Metadata { .. }));
    }

    #[tokio::test]
    async fn metadata_delete_failure_is_ignored() {
        let (repo, _) = repo_with(FakeHttp::responding(200));
        let repo = repo.with_metadata(Arc::new(BrokenMetadata));

        repo.delete("bucket", "object").await.unwrap();
    }

    #[tokio::test]
    async fn reserved_characters_keep_url_and_key_in_step() {
        let (repo, memory) = repo_with(FakeHttp::responding(200));

        for key in ["photo #1.png_abc", "100%.png_abc"] {
            let (url, stored) = repo
                .upload(Bytes::from_static(b"data"), "bucket", key)
                .await
                .unwrap();
            assert_eq!(stored, key);
            assert_eq!(url, repo.get_url("bucket", &stored));

            repo.delete("bucket", &stored).await.unwrap();
        }

        let left: Vec<_> = memory.list(None).collect().await;
        assert!(left.is_empty(), "objects left behind: {left:?}");
    }

    #[tokio::test]
    async fn rewritten_keys_fail_upload_before_writing() {
        let (repo, memory) = repo_with(FakeHttp::responding(200));

        for key in ["/lead.png_abc", "a//b.png_abc"] {
            let err = repo
                .upload(Bytes::from_static(b"data"), "bucket", key)
                .await
                .unwrap_err();
            assert!(
                matches!(&err, RepositoryError::Upload { source: StoreError::InvalidKey(k), .. } if k == key),
                "{key:?}: {err}"
            );
        }

        let left: Vec<_> = memory.list(None).collect().await;
        assert!(left.is_empty());
    }

    #[tokio::test]
    async fn index_finds_reserved_character_keys() {
        let (repo, _) = repo_with(FakeHttp::failing());
        let metadata = Arc::new(SqliteMetadataStore::in_memory().await.unwrap());
        let repo = repo.with_metadata(metadata);

        let (url, key) = repo
            .upload(Bytes::from_static(b"data"), "bucket", "photo #1.png_abc")
            .await
            .unwrap();

        assert_eq!(repo.get("bucket", "photo #1.png_abc").await.unwrap(), Some(url));
        assert_eq!(key, "photo #1.png_abc");
    }
}
