// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # dnsowner - DNS owner ID tracking for Kubernetes DNS controllers
//!
//! A DNS controller only touches DNS entries whose owner ID it is responsible
//! for. This crate maintains that set of owner IDs and notifies interested
//! components whenever it changes.
//!
//! ## Overview
//!
//! - An [`owners::OwnerRegistry`] counts, per owner ID, how many clients assert
//!   it and reports only the IDs whose count crosses zero
//! - An [`owners::OwnerStack`] chains layers on top of the registry; layers such
//!   as [`owners::FilteredLayer`] restrict what the layers above them see, and
//!   can be inserted while the stack is live
//! - The [`reconciler`] watches [`crd::DNSOwner`] objects and asserts the
//!   owner IDs they activate as one registry client
//!
//! ## Modules
//!
//! - [`owners`] - Owner registry, layers and stack wiring
//! - [`crd`] - The `DNSOwner` custom resource
//! - [`classes`] - Controller class scoping of objects
//! - [`config`] - Command-line options
//! - [`reconciler`] - `DNSOwner` watch loop
//! - [`metrics`] - Prometheus metrics and the change-logging observer
//!
//! ## Example
//!
//! ```rust
//! use dnsowner::owners::{owner_set, OwnerStack};
//!
//! let (stack, registry) = OwnerStack::new_owners();
//! registry.update_client("client1", owner_set(["id1", "id2"]));
//! registry.update_client("client2", owner_set(["id2", "id3"]));
//! registry.delete_client("client1");
//!
//! assert_eq!(stack.access().get_ids(), owner_set(["id2", "id3"]));
//! ```

pub mod classes;
pub mod config;
pub mod constants;
pub mod crd;
pub mod errors;
pub mod labels;
pub mod metrics;
pub mod owners;
pub mod reconciler;
