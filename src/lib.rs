//! gRPC broker for S3-compatible object storage.
//!
//! Requests flow `handlers` → `services` (repository) → `clients`
//! (object store, HTTP existence check, optional metadata index).

pub mod clients;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod models;
pub mod proto;
pub mod routes;
pub mod services;
pub mod shutdown;
pub mod utils;
