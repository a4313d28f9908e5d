// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Layer that only lets owner IDs accepted by a predicate through.

use super::{LayerAccess, LayerLink, OwnerHandler, OwnerLayer, OwnerSet};
use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Predicate deciding whether an owner ID passes a [`FilteredLayer`].
pub type Accepted = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Caches the accepted subset of the IDs visible below it.
///
/// IDs rejected by the predicate never enter the cache and never appear in a
/// delta emitted by this layer. If the predicate depends on external inputs,
/// call [`filter_changed`](Self::filter_changed) after they change.
pub struct FilteredLayer {
    up: LayerLink,
    down: Option<LayerAccess>,
    accepted: Accepted,
    cache: RwLock<OwnerSet>,
}

impl FilteredLayer {
    #[must_use]
    pub fn new(accepted: Accepted, up: LayerLink, down: Option<LayerAccess>) -> Self {
        Self {
            up,
            down,
            accepted,
            cache: RwLock::new(OwnerSet::new()),
        }
    }

    /// Creator for [`OwnerStack::insert_layer`](super::OwnerStack::insert_layer).
    ///
    /// # Example
    ///
    /// ```rust
    /// use dnsowner::owners::{FilteredLayer, OwnerStack};
    ///
    /// let (stack, _registry) = OwnerStack::new_owners();
    /// stack.insert_layer(
    ///     &stack.access(),
    ///     FilteredLayer::creator(|id: &str| id.starts_with("team-a")),
    /// );
    /// ```
    pub fn creator<P>(accepted: P) -> impl FnOnce(LayerLink, Option<LayerAccess>) -> Arc<dyn OwnerLayer>
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::shared_creator(Arc::new(accepted))
    }

    /// Like [`creator`](Self::creator) for a predicate that is already shared.
    pub fn shared_creator(
        accepted: Accepted,
    ) -> impl FnOnce(LayerLink, Option<LayerAccess>) -> Arc<dyn OwnerLayer> {
        move |up: LayerLink, down: Option<LayerAccess>| -> Arc<dyn OwnerLayer> {
            Arc::new(Self::new(accepted, up, down))
        }
    }

    /// Recompute the cache after the predicate's inputs changed.
    ///
    /// Re-reads everything visible below, diffs the accepted subset against
    /// the previous cache and propagates the difference.
    pub fn filter_changed(&self) {
        self.up.locked(|| {
            let below = self
                .down
                .as_ref()
                .map(LayerAccess::get_ids)
                .unwrap_or_default();

            let (added, deleted) = {
                let mut cache = self.cache.write();
                let next: OwnerSet = below
                    .into_iter()
                    .filter(|id| (self.accepted)(id.as_str()))
                    .collect();
                let added: OwnerSet = next.difference(&cache).cloned().collect();
                let deleted: OwnerSet = cache.difference(&next).cloned().collect();
                *cache = next;
                (added, deleted)
            };

            debug!(added = ?added, deleted = ?deleted, "Owner filter recomputed");
            if !added.is_empty() || !deleted.is_empty() {
                self.up.owner_set_changed(&added, &deleted);
            }
        });
    }
}

impl OwnerHandler for FilteredLayer {
    fn owner_set_changed(&self, added: &OwnerSet, deleted: &OwnerSet) {
        let (add, del) = {
            let mut cache = self.cache.write();
            let mut add = OwnerSet::new();
            for id in added {
                if (self.accepted)(id.as_str()) && cache.insert(id.clone()) {
                    add.insert(id.clone());
                }
            }
            let mut del = OwnerSet::new();
            for id in deleted {
                if cache.remove(id) {
                    del.insert(id.clone());
                }
            }
            (add, del)
        };
        if !add.is_empty() || !del.is_empty() {
            self.up.owner_set_changed(&add, &del);
        }
    }
}

impl OwnerLayer for FilteredLayer {
    fn get_ids(&self) -> OwnerSet {
        self.cache.read().clone()
    }

    fn is_responsible_for(&self, id: &str) -> bool {
        self.cache.read().contains(id)
    }

    fn seed(&self, down: &OwnerSet) {
        let accepted = down
            .iter()
            .filter(|id| (self.accepted)(id.as_str()))
            .cloned()
            .collect();
        *self.cache.write() = accepted;
    }

    fn start(self: Arc<Self>, down: OwnerSet) -> Option<Arc<dyn OwnerHandler>> {
        let deleted: OwnerSet = down
            .into_iter()
            .filter(|id| !(self.accepted)(id.as_str()))
            .collect();
        if !deleted.is_empty() {
            self.up.owner_set_changed(&OwnerSet::new(), &deleted);
        }
        Some(self as Arc<dyn OwnerHandler>)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
#[path = "filtered_tests.rs"]
mod filtered_tests;
