//! Generated protobuf and gRPC types for `store.object.v1`.

tonic::include_proto!("store.object.v1");

/// Encoded descriptor set used by the reflection service.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("object_descriptor");
