// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared helpers for owner stack tests.

use super::{owner_set, OwnerHandler, OwnerSet};
use parking_lot::Mutex;
use std::sync::Arc;

/// Observer that records every delta it receives.
#[derive(Default)]
pub(crate) struct RecordingHandler {
    events: Mutex<Vec<(OwnerSet, OwnerSet)>>,
}

impl RecordingHandler {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn events(&self) -> Vec<(OwnerSet, OwnerSet)> {
        self.events.lock().clone()
    }

    pub(crate) fn last(&self) -> Option<(OwnerSet, OwnerSet)> {
        self.events.lock().last().cloned()
    }

    pub(crate) fn count(&self) -> usize {
        self.events.lock().len()
    }

    /// Replay all deltas from an empty set, checking each one applies cleanly.
    pub(crate) fn replay(&self) -> OwnerSet {
        let mut state = OwnerSet::new();
        for (added, deleted) in self.events() {
            assert!(added.is_disjoint(&deleted), "delta adds and deletes {added:?} / {deleted:?}");
            for id in deleted {
                assert!(state.remove(&id), "deleted {id} which was not visible");
            }
            for id in added {
                assert!(state.insert(id.clone()), "added {id} which was already visible");
            }
        }
        state
    }
}

impl OwnerHandler for RecordingHandler {
    fn owner_set_changed(&self, added: &OwnerSet, deleted: &OwnerSet) {
        self.events.lock().push((added.clone(), deleted.clone()));
    }
}

pub(crate) fn as_handler(handler: &Arc<RecordingHandler>) -> Arc<dyn OwnerHandler> {
    Arc::clone(handler) as Arc<dyn OwnerHandler>
}

pub(crate) fn ids(items: &[&str]) -> OwnerSet {
    owner_set(items.iter().copied())
}
