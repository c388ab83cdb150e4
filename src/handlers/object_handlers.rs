//! gRPC handlers for `store.object.v1.ObjectService`.
//! Validates requests, delegates I/O to the repository and maps failures to
//! status codes. Causes of internal failures are logged, never returned.

use crate::{
    clients::store::object_path,
    errors::{
        AppError, FILE_EMPTY_ERROR_MESSAGE, INVALID_FILE_KEY_ERROR_MESSAGE,
        INVALID_FILE_SIZE_ERROR_MESSAGE, KEY_EMPTY_ERROR_MESSAGE, OBJECT_NOT_FOUND_ERROR_MESSAGE,
    },
    models::object::ObjectRef,
    proto::{
        DeleteByKeyObjectRequest, DeleteByKeyObjectResponse, FindByKeyObjectRequest,
        FindByKeyObjectResponse, UploadObjectRequest, UploadObjectResponse,
        object_service_server::ObjectService,
    },
    services::object_repository::ObjectRepository,
    utils::random::{KEY_SUFFIX_LEN, KeySuffixGenerator},
};
use bytes::Bytes;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{error, info};

/// Reject keys the store could not address verbatim, before any I/O.
fn check_key(op: &str, key: &str) -> Result<(), AppError> {
    if key.is_empty() {
        error!(op, "request rejected: {}", KEY_EMPTY_ERROR_MESSAGE);
        return Err(AppError::invalid_argument(KEY_EMPTY_ERROR_MESSAGE));
    }
    if let Err(err) = object_path(key) {
        error!(op, error = %err, "request rejected: {}", INVALID_FILE_KEY_ERROR_MESSAGE);
        return Err(AppError::invalid_argument(INVALID_FILE_KEY_ERROR_MESSAGE));
    }
    Ok(())
}

pub struct ObjectServiceImpl {
    repo: Arc<dyn ObjectRepository>,
    random: Arc<dyn KeySuffixGenerator>,
    bucket: String,
    max_file_size: usize,
}

impl ObjectServiceImpl {
    pub fn new(
        repo: Arc<dyn ObjectRepository>,
        random: Arc<dyn KeySuffixGenerator>,
        bucket: impl Into<String>,
        max_file_size: usize,
    ) -> Self {
        Self {
            repo,
            random,
            bucket: bucket.into(),
            max_file_size,
        }
    }

    async fn upload_object(&self, filename: &str, data: Bytes) -> Result<ObjectRef, AppError> {
        if data.is_empty() {
            error!(filename, "upload rejected: {}", FILE_EMPTY_ERROR_MESSAGE);
            return Err(AppError::invalid_argument(FILE_EMPTY_ERROR_MESSAGE));
        }
        if data.len() > self.max_file_size {
            error!(
                filename,
                size = data.len(),
                max = self.max_file_size,
                "upload rejected: {}",
                INVALID_FILE_SIZE_ERROR_MESSAGE
            );
            return Err(AppError::invalid_argument(INVALID_FILE_SIZE_ERROR_MESSAGE));
        }

        let suffix = self.random.generate(KEY_SUFFIX_LEN).map_err(|err| {
            error!(error = %err, filename, "key suffix generation failed");
            AppError::internal()
        })?;
        let object_key = format!("{}_{}", filename, suffix);
        check_key("upload", &object_key)?;

        let (url, key) = self
            .repo
            .upload(data, &self.bucket, &object_key)
            .await
            .map_err(|err| {
                error!(error = %err, cause = ?std::error::Error::source(&err), "upload failed");
                AppError::internal()
            })?;

        info!(bucket = %self.bucket, key = %key, "object uploaded");
        Ok(ObjectRef { url, key })
    }

    async fn find_object(&self, key: &str) -> Result<ObjectRef, AppError> {
        check_key("find", key)?;

        let url = self.repo.get(&self.bucket, key).await.map_err(|err| {
            error!(error = %err, cause = ?std::error::Error::source(&err), "find failed");
            AppError::internal()
        })?;

        match url {
            Some(url) => Ok(ObjectRef {
                url,
                key: key.to_string(),
            }),
            None => Err(AppError::not_found(OBJECT_NOT_FOUND_ERROR_MESSAGE)),
        }
    }

    async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        check_key("delete", key)?;

        self.repo.delete(&self.bucket, key).await.map_err(|err| {
            error!(error = %err, cause = ?std::error::Error::source(&err), "delete failed");
            AppError::internal()
        })?;

        info!(bucket = %self.bucket, key, "object deleted");
        Ok(())
    }
}

#[tonic::async_trait]
impl ObjectService for ObjectServiceImpl {
    async fn upload(
        &self,
        request: Request<UploadObjectRequest>,
    ) -> Result<Response<UploadObjectResponse>, Status> {
        let req = request.into_inner();
        let object = self
            .upload_object(&req.filename, Bytes::from(req.data))
            .await?;

        Ok(Response::new(UploadObjectResponse {
            object: Some(object.into()),
        }))
    }

    async fn find_by_key(
        &self,
        request: Request<FindByKeyObjectRequest>,
    ) -> Result<Response<FindByKeyObjectResponse>, Status> {
        let req = request.into_inner();
        let object = self.find_object(&req.key).await?;

        Ok(Response::new(FindByKeyObjectResponse {
            object: Some(object.into()),
        }))
    }

    /// Any error status stands for `success: false`; a response body is only
    /// sent on success.
    async fn delete_by_key(
        &self,
        request: Request<DeleteByKeyObjectRequest>,
    ) -> Result<Response<DeleteByKeyObjectResponse>, Status> {
        let req = request.into_inner();
        self.delete_object(&req.key).await?;

        Ok(Response::new(DeleteByKeyObjectResponse { success: true }))
    }
}
