// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Bookkeeping of `DNSOwner` objects and the owner IDs they activate.
//!
//! Every `DNSOwner` object names one owner ID and whether it is active. The
//! cache folds all objects into the set of active owner IDs the owner
//! reconciler asserts as a single client of the base registry. The
//! controller's own identifier is always part of that set.

use super::OwnerSet;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// Identity of a watched object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    #[must_use]
    pub fn new(namespace: Option<String>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct OwnerEntry {
    owner_id: String,
    active: bool,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<ObjectKey, OwnerEntry>,
    /// Owner ID → number of active objects naming it.
    active: HashMap<String, usize>,
}

/// Active owner IDs derived from `DNSOwner` objects.
pub struct OwnerCache {
    identifier: String,
    state: RwLock<CacheState>,
}

impl OwnerCache {
    /// Create a cache that always reports `identifier` as active.
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            state: RwLock::new(CacheState::default()),
        }
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Record the owner ID and activation of the object behind `key`.
    ///
    /// # Returns
    ///
    /// `(changed, active)`: the owner IDs whose activation flipped, and the
    /// full set of active owner IDs afterwards.
    pub fn update_owner(&self, key: ObjectKey, owner_id: &str, active: bool) -> (OwnerSet, OwnerSet) {
        let mut state = self.state.write();
        let entry = OwnerEntry {
            owner_id: owner_id.to_string(),
            active,
        };
        let old = state.entries.insert(key, entry.clone());
        let changed = self.apply(&mut state, old.as_ref(), Some(&entry));
        (changed, self.collect(&state))
    }

    /// Forget the object behind `key`.
    ///
    /// Returns the same `(changed, active)` pair as
    /// [`update_owner`](Self::update_owner).
    pub fn delete_owner(&self, key: &ObjectKey) -> (OwnerSet, OwnerSet) {
        let mut state = self.state.write();
        let old = state.entries.remove(key);
        let changed = self.apply(&mut state, old.as_ref(), None);
        (changed, self.collect(&state))
    }

    /// Active owner IDs, including the controller's own identifier.
    #[must_use]
    pub fn get_ids(&self) -> OwnerSet {
        self.collect(&self.state.read())
    }

    /// Keys of every object currently tracked.
    #[must_use]
    pub fn keys(&self) -> Vec<ObjectKey> {
        let mut keys: Vec<ObjectKey> = self.state.read().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn is_active(&self, state: &CacheState, id: &str) -> bool {
        id == self.identifier || state.active.contains_key(id)
    }

    fn apply(
        &self,
        state: &mut CacheState,
        old: Option<&OwnerEntry>,
        new: Option<&OwnerEntry>,
    ) -> OwnerSet {
        let touched: Vec<&str> = old
            .into_iter()
            .chain(new)
            .map(|entry| entry.owner_id.as_str())
            .collect();
        let before: Vec<bool> = touched.iter().map(|id| self.is_active(state, id)).collect();

        if let Some(old) = old.filter(|entry| entry.active) {
            if let Some(count) = state.active.get_mut(&old.owner_id) {
                *count -= 1;
                if *count == 0 {
                    state.active.remove(&old.owner_id);
                }
            }
        }
        if let Some(new) = new.filter(|entry| entry.active) {
            *state.active.entry(new.owner_id.clone()).or_insert(0) += 1;
        }

        touched
            .iter()
            .zip(before)
            .filter(|(id, was)| self.is_active(state, id) != *was)
            .map(|(id, _)| (*id).to_string())
            .collect()
    }

    fn collect(&self, state: &CacheState) -> OwnerSet {
        let mut ids: OwnerSet = state.active.keys().cloned().collect();
        ids.insert(self.identifier.clone());
        ids
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod cache_tests;
