use crate::auth::Authenticator;
use crate::common::error::Result;
use crate::metrics::record_graphql_request;
use async_graphql::http::GraphiQLSource;
use async_graphql::{EmptySubscription, ObjectType, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    http::{header::AUTHORIZATION, HeaderMap, Method},
    response::{Html, IntoResponse, Json},
    routing::get,
    Extension, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Name and version reported by `/health` and used to label metrics.
#[derive(Debug, Clone, Copy)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Health check endpoint
async fn health(Extension(service): Extension<ServiceInfo>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": service.name,
        "version": service.version,
    }))
}

/// GraphiQL IDE endpoint
async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

/// GraphQL endpoint handler. The caller resolved from the bearer token, if
/// any, is attached to the request data.
async fn graphql_handler<Q, M>(
    Extension(schema): Extension<Schema<Q, M, EmptySubscription>>,
    Extension(auth): Extension<Authenticator>,
    Extension(service): Extension<ServiceInfo>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse
where
    Q: ObjectType + 'static,
    M: ObjectType + 'static,
{
    record_graphql_request(service.name);

    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let mut request = req.into_inner();
    if let Some(viewer) = auth.viewer(header).await {
        request = request.data(viewer);
    }

    schema.execute(request).await.into()
}

/// Create the HTTP router for one GraphQL service
pub fn graphql_router<Q, M>(
    service: ServiceInfo,
    schema: Schema<Q, M, EmptySubscription>,
    auth: Authenticator,
) -> Router
where
    Q: ObjectType + 'static,
    M: ObjectType + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/graphiql", get(graphiql))
        .route("/graphql", get(graphiql).post(graphql_handler::<Q, M>))
        .layer(Extension(schema))
        .layer(Extension(auth))
        .layer(Extension(service))
        .layer(cors)
}

/// Serve `router` on all interfaces until ctrl-c.
pub async fn serve(router: Router, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server running on http://{}", addr);
    info!("GraphQL:      http://{}/graphql", addr);
    info!("GraphiQL UI:  http://{}/graphiql", addr);
    info!("Health check: http://{}/health", addr);

    axum::Server::try_bind(&addr)?
        .serve(router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
