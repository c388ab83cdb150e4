//! Adapters over the external collaborators the repository talks to.
//!
//! Each collaborator is exposed as a small capability trait so the
//! repository and service can run against fakes in tests:
//! - [`store::ObjectStoreClient`] — `put` / `remove` on an S3-compatible store
//! - [`http::HttpClient`] — existence check by URL
//! - [`metadata::MetadataStore`] — optional relational index of uploaded objects

pub mod http;
pub mod metadata;
pub mod store;

pub use http::{HttpClient, ReqwestHttpClient};
pub use metadata::{MetadataStore, SqliteMetadataStore};
pub use store::{BucketStore, ObjectStoreClient, PutOutput};
