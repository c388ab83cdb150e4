//! Represents an object recorded in the metadata index.

use crate::proto;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata row for an object stored in the bucket.
///
/// Created on a successful upload, looked up and deleted by `object_key`.
/// The payload itself only lives in the object store.
#[derive(Clone, FromRow, Debug, PartialEq)]
pub struct Object {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Public URL of the object.
    pub image_url: String,

    /// Object key (unique within the bucket).
    pub object_key: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Object {
    pub fn new(image_url: impl Into<String>, object_key: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            image_url: image_url.into(),
            object_key: object_key.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// URL + key pair returned after an upload or lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRef {
    pub url: String,
    pub key: String,
}

impl From<ObjectRef> for proto::Object {
    fn from(object: ObjectRef) -> Self {
        proto::Object {
            url: object.url,
            key: object.key,
        }
    }
}
