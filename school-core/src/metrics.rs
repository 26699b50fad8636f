use crate::common::error::{Result, SchoolError};
use std::net::SocketAddr;
use tracing::info;

pub const GRAPHQL_REQUESTS_TOTAL: &str = "graphql_requests_total";

/// Install the Prometheus exporter when an address is given. Without one the
/// counters are recorded into the no-op recorder.
pub fn init_metrics(addr: Option<&str>) -> Result<()> {
    let Some(addr) = addr else {
        return Ok(());
    };
    let addr: SocketAddr = addr
        .parse()
        .map_err(|_| SchoolError::Config(format!("Invalid metrics address: {addr}")))?;

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| SchoolError::Internal(format!("Prometheus exporter install failed: {e}")))?;

    info!("Prometheus exporter listening on http://{}/metrics", addr);
    Ok(())
}

pub fn record_graphql_request(service: &'static str) {
    metrics::counter!(GRAPHQL_REQUESTS_TOTAL, "service" => service).increment(1);
}
