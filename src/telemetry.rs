//! Prometheus counters for synchronizer activity
//!
//! Registered in the default registry so a host process can expose them
//! alongside its own metrics.

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec, Encoder, TextEncoder};

lazy_static! {
    /// Counter: resources created, by kind
    pub static ref RESOURCES_CREATED: CounterVec = register_counter_vec!(
        "projectflow_resources_created_total",
        "Resources created through the synchronizer",
        &["kind"]
    )
    .expect("Failed to create resources_created metric");

    /// Counter: adapter errors, by operation and error kind
    pub static ref ADAPTER_ERRORS: CounterVec = register_counter_vec!(
        "projectflow_adapter_errors_total",
        "Errors returned by the project adapter",
        &["operation", "error_kind"]
    )
    .expect("Failed to create adapter_errors metric");

    /// Counter: stale writes rejected, by resource kind
    pub static ref VERSION_CONFLICTS: CounterVec = register_counter_vec!(
        "projectflow_version_conflicts_total",
        "Updates rejected because the expected version was stale",
        &["kind"]
    )
    .expect("Failed to create version_conflicts metric");

    /// Counter: batch operations that ended part way, by operation
    pub static ref PARTIAL_BATCHES: CounterVec = register_counter_vec!(
        "projectflow_partial_batches_total",
        "Batch operations that reported a partial failure",
        &["operation"]
    )
    .expect("Failed to create partial_batches metric");

    /// Counter: sprint link attempts, by outcome
    pub static ref SPRINT_LINKS: CounterVec = register_counter_vec!(
        "projectflow_sprint_links_total",
        "Issue to sprint link attempts by outcome",
        &["outcome"]
    )
    .expect("Failed to create sprint_links metric");
}

pub fn record_created(kind: &str) {
    RESOURCES_CREATED.with_label_values(&[kind]).inc();
}

pub fn record_adapter_error(operation: &str, error_kind: &str) {
    ADAPTER_ERRORS
        .with_label_values(&[operation, error_kind])
        .inc();
}

pub fn record_version_conflict(kind: &str) {
    VERSION_CONFLICTS.with_label_values(&[kind]).inc();
}

pub fn record_partial_batch(operation: &str) {
    PARTIAL_BATCHES.with_label_values(&[operation]).inc();
}

pub fn record_sprint_link(linked: bool) {
    let outcome = if linked { "linked" } else { "failed" };
    SPRINT_LINKS.with_label_values(&[outcome]).inc();
}

/// Encode all registered metrics in the Prometheus text format
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
