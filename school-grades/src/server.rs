use crate::graphql::create_schema;
use axum::Router;
use school_core::auth::{Authenticator, JwtKeys};
use school_core::config::ServiceConfig;
use school_core::http::{graphql_router, ServiceInfo};
use school_core::storage::Storage;
use std::sync::Arc;

pub const SERVICE: ServiceInfo = ServiceInfo {
    name: "grades",
    version: env!("CARGO_PKG_VERSION"),
};

/// Create the HTTP server router
pub fn create_server(storage: Arc<dyn Storage>, config: &ServiceConfig) -> Router {
    let keys = JwtKeys::new(&config.jwt_secret, config.jwt_ttl_seconds);
    let schema = create_schema(storage.clone());

    graphql_router(SERVICE, schema, Authenticator::new(keys, storage))
}
