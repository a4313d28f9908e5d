// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `DNSOwner` watch loop feeding the owner registry.
//!
//! All `DNSOwner` objects of our classes are folded into an
//! [`OwnerCache`]; whenever the set of active owner IDs changes it is
//! asserted to the base registry under the single client
//! [`OWNER_RESOURCES_CLIENT`]. The controller's own identifier is part of
//! that assertion from the first setup on.
//!
//! The initial list (and every relist after a watch restart) is processed
//! by a configurable number of setup workers and published once. Objects
//! that disappeared while the watch was down are dropped during the relist.

use crate::classes::Classes;
use crate::constants::OWNER_RESOURCES_CLIENT;
use crate::crd::DNSOwner;
use crate::errors::ReconcileError;
use crate::metrics::{record_error, record_owner_event, record_setup};
use crate::owners::{ObjectKey, OwnerCache, OwnerRegistry, OwnerSet};
use futures::StreamExt;
use kube::runtime::{watcher, watcher::Event, WatchStreamExt};
use kube::{Api, Client, Resource, ResourceExt};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Key of a `DNSOwner` object.
///
/// # Errors
///
/// Returns [`ReconcileError::MissingName`] for objects without a name.
pub fn object_key(owner: &DNSOwner) -> Result<ObjectKey, ReconcileError> {
    let name = owner
        .meta()
        .name
        .clone()
        .ok_or(ReconcileError::MissingName)?;
    Ok(ObjectKey::new(owner.namespace(), name))
}

/// Applies `DNSOwner` objects to the owner registry.
pub struct OwnerReconciler {
    registry: Arc<OwnerRegistry>,
    cache: OwnerCache,
    classes: Classes,
    /// Serializes cache updates with the assertion that publishes them.
    publish: Mutex<()>,
}

impl OwnerReconciler {
    #[must_use]
    pub fn new(registry: Arc<OwnerRegistry>, identifier: &str, classes: Classes) -> Self {
        Self {
            registry,
            cache: OwnerCache::new(identifier),
            classes,
            publish: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn cache(&self) -> &OwnerCache {
        &self.cache
    }

    /// Handle an added or modified object.
    ///
    /// Objects of another class are treated as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MissingName`] for objects without a name.
    pub fn reconcile(&self, owner: &DNSOwner) -> Result<(), ReconcileError> {
        let key = object_key(owner)?;
        if !self.classes.is_responsible_for(owner) {
            record_owner_event("ignored");
            self.remove(&key);
            return Ok(());
        }
        record_owner_event("apply");

        let _guard = self.publish.lock();
        let (changed, active) =
            self.cache
                .update_owner(key.clone(), &owner.spec.owner_id, owner.spec.is_active());
        info!(
            owner = %key,
            changed = ?changed,
            active = ?active,
            "Updated DNSOwner"
        );
        if !changed.is_empty() {
            self.assert_ids(active);
        }
        Ok(())
    }

    /// Handle a deleted object.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MissingName`] for objects without a name.
    pub fn deleted(&self, owner: &DNSOwner) -> Result<(), ReconcileError> {
        record_owner_event("delete");
        self.remove(&object_key(owner)?);
        Ok(())
    }

    /// Process a complete list of objects.
    ///
    /// Every object is folded into the cache by up to `workers` concurrent
    /// workers, objects missing from the list are forgotten, and the
    /// resulting owner set is asserted once.
    pub async fn setup(&self, owners: Vec<DNSOwner>, workers: usize) {
        let workers = workers.max(1);
        let start = Instant::now();
        info!(objects = owners.len(), workers, "Processing DNSOwner list");

        let seen: Mutex<HashSet<ObjectKey>> = Mutex::new(HashSet::new());
        futures::stream::iter(owners)
            .for_each_concurrent(workers, |owner| {
                let seen = &seen;
                async move {
                    record_owner_event("init");
                    let key = match object_key(&owner) {
                        Ok(key) => key,
                        Err(e) => {
                            warn!("Skipping DNSOwner: {}", e);
                            record_error("invalid_object");
                            return;
                        }
                    };
                    if self.classes.is_responsible_for(&owner) {
                        self.cache
                            .update_owner(key.clone(), &owner.spec.owner_id, owner.spec.is_active());
                        seen.lock().insert(key);
                    }
                }
            })
            .await;

        let seen = seen.into_inner();
        let _guard = self.publish.lock();
        for key in self.cache.keys() {
            if !seen.contains(&key) {
                debug!(owner = %key, "DNSOwner vanished during relist");
                self.cache.delete_owner(&key);
            }
        }

        let active = self.cache.get_ids();
        info!(identifier = %self.cache.identifier(), "Standard identifier");
        info!(active = ?active, "Initial owner set");
        self.assert_ids(active);
        record_setup(start.elapsed());
    }

    fn remove(&self, key: &ObjectKey) {
        let _guard = self.publish.lock();
        let (changed, active) = self.cache.delete_owner(key);
        info!(
            owner = %key,
            changed = ?changed,
            active = ?active,
            "Removed DNSOwner"
        );
        if !changed.is_empty() {
            self.assert_ids(active);
        }
    }

    fn assert_ids(&self, active: OwnerSet) {
        self.registry.update_client(OWNER_RESOURCES_CLIENT, active);
    }
}

/// Watch `DNSOwner` objects cluster-wide and apply them to `reconciler`.
///
/// Only returns if the watch stream ends.
///
/// # Errors
///
/// Returns [`ReconcileError::StreamEnded`] when the watch stream terminates.
pub async fn run(
    client: Client,
    reconciler: Arc<OwnerReconciler>,
    workers: usize,
) -> Result<(), ReconcileError> {
    info!("Starting DNSOwner watch");
    let api = Api::<DNSOwner>::all(client);
    let mut stream = std::pin::pin!(watcher(api, watcher::Config::default()).default_backoff());

    let mut batch: Option<Vec<DNSOwner>> = None;
    while let Some(event) = stream.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!("DNSOwner watch error: {}", e);
                record_error("watch_error");
                continue;
            }
        };
        let result = match event {
            Event::Init => {
                debug!("DNSOwner relist started");
                batch = Some(Vec::new());
                Ok(())
            }
            Event::InitApply(owner) => {
                batch.get_or_insert_with(Vec::new).push(owner);
                Ok(())
            }
            Event::InitDone => {
                reconciler
                    .setup(batch.take().unwrap_or_default(), workers)
                    .await;
                Ok(())
            }
            Event::Apply(owner) => reconciler.reconcile(&owner),
            Event::Delete(owner) => reconciler.deleted(&owner),
        };
        if let Err(e) = result {
            error!("Failed to handle DNSOwner event: {}", e);
            record_error("invalid_object");
        }
    }

    Err(ReconcileError::StreamEnded)
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod reconciler_tests;
