//! Standard `grpc.health.v1.Health` reporting.
//!
//! - overall status (`""`) and `store.object.v1.ObjectService` start SERVING
//! - both flip to NOT_SERVING once shutdown begins

use crate::{
    handlers::object_handlers::ObjectServiceImpl, proto::object_service_server::ObjectServiceServer,
};
use tonic_health::{
    ServingStatus,
    pb::health_server::{Health, HealthServer},
    server::HealthReporter,
};

/// Create the health service with the object service marked as serving.
pub async fn health_reporting() -> (HealthReporter, HealthServer<impl Health>) {
    let (mut reporter, service) = tonic_health::server::health_reporter();
    reporter
        .set_serving::<ObjectServiceServer<ObjectServiceImpl>>()
        .await;
    (reporter, service)
}

pub async fn mark_not_serving(mut reporter: HealthReporter) {
    reporter
        .set_not_serving::<ObjectServiceServer<ObjectServiceImpl>>()
        .await;
    reporter
        .set_service_status("", ServingStatus::NotServing)
        .await;
}
