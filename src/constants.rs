// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the DNS owner controller.
//!
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group of the `DNSOwner` CRD
pub const API_GROUP: &str = "dns.firestoned.io";

/// API version of the `DNSOwner` CRD
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "dns.firestoned.io/v1alpha1";

/// Kind name for `DNSOwner` resource
pub const KIND_DNS_OWNER: &str = "DNSOwner";

// ============================================================================
// Owner Defaults
// ============================================================================

/// Owner ID the controller asserts for itself unless configured otherwise
pub const DEFAULT_IDENTIFIER: &str = "dnscontroller";

/// Client ID under which `DNSOwner` objects are asserted in the owner registry
pub const OWNER_RESOURCES_CLIENT: &str = "dns-owner-resources";

// ============================================================================
// Controller Tuning
// ============================================================================

/// Default number of workers processing the initial `DNSOwner` list
pub const DEFAULT_SETUP_WORKERS: usize = 1;

/// Default listen address of the metrics endpoint
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:8080";

/// Path the Prometheus metrics are served on
pub const METRICS_PATH: &str = "/metrics";

/// Number of Tokio worker threads of the controller runtime
pub const TOKIO_WORKER_THREADS: usize = 4;
