//! Prometheus metrics for Tombsync
//!
//! Metrics are recorded through the `metrics` facade and are no-ops until
//! [`install_exporter`] sets up a recorder. The exporter listens on its own
//! address so the webhook endpoint stays the only route of the relay.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tombsync_core::{Error, Result};
use tracing::info;

/// Metric names
pub mod names {
    pub const WEBHOOK_REQUESTS_TOTAL: &str = "tombsync_webhook_requests_total";
    pub const DELETIONS_TOTAL: &str = "tombsync_deletions_total";
    pub const DELETION_DURATION_SECONDS: &str = "tombsync_deletion_duration_seconds";
    pub const TARGETS: &str = "tombsync_targets";
    pub const INFO: &str = "tombsync_info";
}

/// Start the Prometheus exporter on `address`
pub fn install_exporter(address: &str) -> Result<()> {
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| Error::Config(format!("invalid metrics address {}: {}", address, e)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| Error::Config(format!("failed to start metrics exporter: {}", e)))?;

    gauge!(names::INFO, "version" => tombsync_core::VERSION).set(1.0);
    info!("Prometheus metrics at http://{}/metrics", addr);

    Ok(())
}

/// Record one webhook call by decode verdict (or rejection reason)
pub fn record_webhook(verdict: &'static str) {
    counter!(names::WEBHOOK_REQUESTS_TOTAL, "verdict" => verdict).increment(1);
}

/// Record one per-target deletion attempt
pub fn record_deletion(target: &str, outcome: &'static str, duration_secs: f64) {
    counter!(
        names::DELETIONS_TOTAL,
        "target" => target.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        names::DELETION_DURATION_SECONDS,
        "target" => target.to_string()
    )
    .record(duration_secs);
}

pub fn set_target_count(count: usize) {
    gauge!(names::TARGETS).set(count as f64);
}
