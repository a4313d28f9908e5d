// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Base layer of every owner stack: reference-counted owner IDs per client.
//!
//! Each client asserts a complete set of owner IDs; the registry counts, per
//! owner ID, how many clients currently assert it. An owner ID is active while
//! its count is positive. Notifications fire only when a count crosses zero,
//! so observers get one `added` when an ID becomes active and one `deleted`
//! when the last client drops it, regardless of how many clients churn in
//! between.

use super::{LayerAccess, LayerLink, OwnerHandler, OwnerLayer, OwnerSet};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct Tables {
    /// Owner ID → number of clients asserting it. Never holds a zero count.
    owners: HashMap<String, usize>,
    /// Client ID → the set it asserted last.
    clients: HashMap<String, OwnerSet>,
}

impl Tables {
    /// Replace the set asserted by `client` and return the zero crossings.
    fn replace(&mut self, client: &str, owners: OwnerSet) -> (OwnerSet, OwnerSet) {
        let old = self.clients.remove(client).unwrap_or_default();

        let mut added = OwnerSet::new();
        for id in owners.difference(&old) {
            let count = self.owners.entry(id.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                added.insert(id.clone());
            }
        }

        let mut deleted = OwnerSet::new();
        for id in old.difference(&owners) {
            if let Some(count) = self.owners.get_mut(id) {
                *count -= 1;
                if *count == 0 {
                    self.owners.remove(id);
                    deleted.insert(id.clone());
                }
            }
        }

        if !owners.is_empty() {
            self.clients.insert(client.to_string(), owners);
        }
        (added, deleted)
    }
}

/// Reference-counting base layer.
///
/// Clients are created by their first [`update_client`](Self::update_client)
/// and forgotten by [`delete_client`](Self::delete_client); a client that
/// never asserted anything behaves exactly like one that asserted the empty
/// set.
pub struct OwnerRegistry {
    up: LayerLink,
    tables: RwLock<Tables>,
}

impl OwnerRegistry {
    pub(crate) fn new(up: LayerLink) -> Self {
        Self {
            up,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Creator for [`OwnerStack::new`](super::OwnerStack::new).
    pub fn creator() -> impl FnOnce(LayerLink, Option<LayerAccess>) -> Arc<dyn OwnerLayer> {
        |up: LayerLink, _: Option<LayerAccess>| -> Arc<dyn OwnerLayer> { Arc::new(Self::new(up)) }
    }

    /// Replace the owner IDs asserted by `client`.
    ///
    /// The full current set must be passed every time; this is a replace,
    /// not a merge. IDs that became active or inactive are propagated up the
    /// stack. Nothing is propagated when no count crossed zero.
    ///
    /// # Arguments
    ///
    /// * `client` - Identifies the contributing source
    /// * `owners` - Every owner ID the client asserts right now
    pub fn update_client(&self, client: &str, owners: OwnerSet) {
        self.up.locked(|| {
            let (added, deleted) = self.tables.write().replace(client, owners);
            debug!(
                client = %client,
                added = ?added,
                deleted = ?deleted,
                "Updated owner client"
            );
            self.notify(&added, &deleted);
        });
    }

    /// Forget `client`, releasing every owner ID it asserted.
    pub fn delete_client(&self, client: &str) {
        self.up.locked(|| {
            let (added, deleted) = self.tables.write().replace(client, OwnerSet::new());
            debug!(client = %client, deleted = ?deleted, "Deleted owner client");
            self.notify(&added, &deleted);
        });
    }

    /// Owner IDs last asserted by `client`, empty if the client is unknown.
    #[must_use]
    pub fn get_ids_for(&self, client: &str) -> OwnerSet {
        self.tables
            .read()
            .clients
            .get(client)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of clients currently asserting `id`.
    #[must_use]
    pub fn reference_count(&self, id: &str) -> usize {
        self.tables.read().owners.get(id).copied().unwrap_or(0)
    }

    /// Clients with a non-empty assertion.
    #[must_use]
    pub fn clients(&self) -> Vec<String> {
        let mut clients: Vec<String> = self.tables.read().clients.keys().cloned().collect();
        clients.sort();
        clients
    }

    fn notify(&self, added: &OwnerSet, deleted: &OwnerSet) {
        if !added.is_empty() || !deleted.is_empty() {
            self.up.owner_set_changed(added, deleted);
        }
    }
}

impl OwnerLayer for OwnerRegistry {
    fn get_ids(&self) -> OwnerSet {
        self.tables.read().owners.keys().cloned().collect()
    }

    fn is_responsible_for(&self, id: &str) -> bool {
        self.tables.read().owners.contains_key(id)
    }

    fn start(self: Arc<Self>, _down: OwnerSet) -> Option<Arc<dyn OwnerHandler>> {
        None
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
#[path = "base_tests.rs"]
mod base_tests;
