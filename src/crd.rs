// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definition for DNS owner IDs.
//!
//! A [`DNSOwner`] declares that the controller is responsible for DNS
//! entries marked with its owner ID. Deactivating the object (or deleting
//! it) withdraws that responsibility without touching the entries.
//!
//! # Example
//!
//! ```rust
//! use dnsowner::crd::{DNSOwner, DNSOwnerSpec};
//!
//! let owner = DNSOwner::new(
//!     "team-a",
//!     DNSOwnerSpec {
//!         owner_id: "team-a-prod".to_string(),
//!         active: Some(false),
//!     },
//! );
//! assert_eq!(owner.spec.owner_id, "team-a-prod");
//! assert!(!owner.spec.is_active());
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `DNSOwner` activates one owner ID for the controller.
///
/// # Example YAML
///
/// ```yaml
/// apiVersion: dns.firestoned.io/v1alpha1
/// kind: DNSOwner
/// metadata:
///   name: team-a
///   annotations:
///     dns.firestoned.io/class: default
/// spec:
///   ownerId: team-a-prod
///   active: true
/// ```
#[derive(CustomResource, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.firestoned.io",
    version = "v1alpha1",
    kind = "DNSOwner",
    shortname = "dnso",
    doc = "DNSOwner activates an owner ID. DNS entries carrying an active owner ID are handled by this controller; entries carrying other owner IDs are left alone.",
    printcolumn = r#"{"name":"OwnerId","type":"string","jsonPath":".spec.ownerId"}"#,
    printcolumn = r#"{"name":"Active","type":"boolean","jsonPath":".spec.active"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DNSOwnerSpec {
    /// Owner ID activated by this object.
    ///
    /// Several objects may name the same owner ID; it stays active as long as
    /// at least one of them is active.
    #[schemars(length(min = 1))]
    pub owner_id: String,

    /// Whether the owner ID is active. Defaults to `true` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl DNSOwnerSpec {
    /// Effective activation, treating an unset flag as active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
