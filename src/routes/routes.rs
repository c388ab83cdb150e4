//! Composes the gRPC services exposed by the process.
//!
//! ## Structure
//! - `store.object.v1.ObjectService` — `Upload`, `FindByKey`, `DeleteByKey`
//! - `grpc.health.v1.Health` — standard health checking
//! - `grpc.reflection.v1.ServerReflection` — service discovery for tooling

use crate::{
    handlers::object_handlers::ObjectServiceImpl,
    proto::{self, object_service_server::ObjectServiceServer},
};
use tonic::transport::{Server, server::Router};
use tonic_health::pb::health_server::{Health, HealthServer};

/// Headroom over the max file size for the rest of the upload message.
const MESSAGE_OVERHEAD: usize = 64 * 1024;

/// Build the router carrying every service.
///
/// Decoding is capped at `max_file_size` plus a small envelope so oversized
/// uploads are refused before reaching the handler.
pub fn routes(
    object_service: ObjectServiceImpl,
    health_service: HealthServer<impl Health>,
    max_file_size: usize,
) -> anyhow::Result<Router> {
    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(proto::FILE_DESCRIPTOR_SET)
        .register_encoded_file_descriptor_set(tonic_health::pb::FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let objects = ObjectServiceServer::new(object_service)
        .max_decoding_message_size(max_file_size.saturating_add(MESSAGE_OVERHEAD));

    Ok(Server::builder()
        .add_service(health_service)
        .add_service(reflection)
        .add_service(objects))
}
