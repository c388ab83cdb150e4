use std::fmt;
use thiserror::Error;
use tonic::{Code, Status};

pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal server error";
pub const FILE_EMPTY_ERROR_MESSAGE: &str = "File cannot be empty";
pub const INVALID_FILE_SIZE_ERROR_MESSAGE: &str = "Invalid file size";
pub const KEY_EMPTY_ERROR_MESSAGE: &str = "Key cannot be empty";
pub const OBJECT_NOT_FOUND_ERROR_MESSAGE: &str = "Object not found";
pub const INVALID_FILE_KEY_ERROR_MESSAGE: &str = "Invalid file key";

/// Failure of an external collaborator (object store, HTTP, metadata DB).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bucket `{0}` is not configured")]
    UnknownBucket(String),
    #[error("key `{0}` cannot be stored without being rewritten")]
    InvalidKey(String),
    #[error(transparent)]
    ObjectStore(#[from] object_store::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("couldn't upload object to {bucket}/{key}")]
    Upload {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("couldn't record metadata for object {key}")]
    Metadata {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("couldn't delete object {bucket}/{key}")]
    Delete {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("couldn't get object {bucket}/{key}")]
    Get {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RandomError {
    #[error("entropy source failed: {0}")]
    Entropy(String),
}

/// A client-facing error: a gRPC code plus a message that is safe to return.
#[derive(Debug)]
pub struct AppError {
    pub code: Code,
    pub message: String,
}

impl AppError {
    pub fn new(code: Code, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
        }
    }

    /// Generic internal error; the cause belongs in the logs, not here.
    pub fn internal() -> Self {
        Self::new(Code::Internal, INTERNAL_SERVER_ERROR_MESSAGE)
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(Code::NotFound, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        Status::new(err.code, err.message)
    }
}
