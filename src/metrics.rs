// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the DNS owner controller.
//!
//! This module provides metrics with the namespace prefix `dns_firestoned_io_`
//! (prometheus-safe version of "dns.firestoned.io").
//!
//! # Metrics Categories
//!
//! - **Owner Set Metrics** - Active owner IDs and the changes observed at the top of the stack
//! - **Watch Metrics** - `DNSOwner` events and initial setup duration
//! - **Error Metrics** - Watch failures by category
//!
//! # Example
//!
//! ```rust,no_run
//! use dnsowner::metrics::{gather_metrics, record_owner_event};
//!
//! record_owner_event("apply");
//! let text = gather_metrics().unwrap();
//! assert!(text.contains("dns_firestoned_io_owner_events_total"));
//! ```

use crate::owners::{LayerAccess, OwnerHandler, OwnerSet};
use prometheus::{
    CounterVec, Encoder, Gauge, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::info;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all controller metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "dns_firestoned_io";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Owner Set Metrics
// ============================================================================

/// Number of owner IDs currently visible at the top of the owner stack
pub static ACTIVE_OWNER_IDS: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(
        format!("{METRICS_NAMESPACE}_active_owner_ids"),
        "Number of owner IDs the controller is currently responsible for",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Total number of owner IDs that became active
pub static OWNER_IDS_ADDED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        format!("{METRICS_NAMESPACE}_owner_ids_added_total"),
        "Total number of owner IDs that became active",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of owner IDs that became inactive
pub static OWNER_IDS_DELETED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        format!("{METRICS_NAMESPACE}_owner_ids_deleted_total"),
        "Total number of owner IDs that became inactive",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Watch Metrics
// ============================================================================

/// Total number of `DNSOwner` events handled
///
/// Labels:
/// - `event`: `apply`, `delete`, `ignored` or `init`
pub static OWNER_EVENTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_owner_events_total"),
        "Total number of DNSOwner events by kind",
    );
    let counter = CounterVec::new(opts, &["event"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of processing an initial `DNSOwner` list
pub static SETUP_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_setup_duration_seconds"),
        "Duration of processing the initial DNSOwner list in seconds",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by category
///
/// Labels:
/// - `error_type`: Category of error (`watch_error`, `invalid_object`)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by category",
    );
    let counter = CounterVec::new(opts, &["error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a change of the visible owner set
///
/// # Arguments
/// * `added` - Owner IDs that became visible
/// * `deleted` - Owner IDs that disappeared
/// * `active` - Number of owner IDs visible afterwards
pub fn record_owner_set_changed(added: &OwnerSet, deleted: &OwnerSet, active: usize) {
    OWNER_IDS_ADDED_TOTAL.inc_by(added.len() as u64);
    OWNER_IDS_DELETED_TOTAL.inc_by(deleted.len() as u64);
    #[allow(clippy::cast_precision_loss)]
    ACTIVE_OWNER_IDS.set(active as f64);
}

/// Record a handled `DNSOwner` event
///
/// # Arguments
/// * `event` - Kind of event (e.g., `apply`, `delete`)
pub fn record_owner_event(event: &str) {
    OWNER_EVENTS_TOTAL.with_label_values(&[event]).inc();
}

/// Record the duration of an initial list
pub fn record_setup(duration: Duration) {
    SETUP_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record an error
///
/// # Arguments
/// * `error_type` - Category of error (e.g., `watch_error`)
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

// ============================================================================
// Owner Set Observer
// ============================================================================

/// Observer logging every owner-set change seen at one access and feeding
/// the owner set metrics.
pub struct LoggingHandler {
    access: LayerAccess,
}

impl LoggingHandler {
    /// Create the handler and register it at `access`.
    pub fn register(access: &LayerAccess) -> Arc<Self> {
        let handler = Arc::new(Self {
            access: access.clone(),
        });
        access.register_handler(Arc::clone(&handler) as Arc<dyn OwnerHandler>);
        handler
    }
}

impl OwnerHandler for LoggingHandler {
    fn owner_set_changed(&self, added: &OwnerSet, deleted: &OwnerSet) {
        let active = self.access.get_ids();
        info!(
            added = ?added,
            deleted = ?deleted,
            active = ?active,
            "Owner set changed"
        );
        record_owner_set_changed(added, deleted, active.len());
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;
