// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Owner stack topology: positions, links and the stack-wide lock.
//!
//! A stack is an arena of two record kinds:
//!
//! - an **access** record per position, holding the observers registered
//!   there and the link that currently serves reads at that position
//! - a **link** record per layer, binding the layer to the access above it
//!   (where its deltas are delivered) and the access below it
//!
//! Records are addressed by index. [`LayerAccess`] and [`LayerLink`] are
//! handles made of a weak pointer to the arena plus an index, so layers can
//! hold handles to their neighbours without keeping the stack alive.
//!
//! Inserting a layer at access `A` that is served by link `P`:
//!
//! ```text
//!   before                      after
//!
//!   A ──► P (layer)             A ──► L (new layer)
//!         │                           │
//!         ▼                           ▼
//!        ...                          N ──► P (layer)
//!                                           │
//!                                           ▼
//!                                          ...
//! ```
//!
//! Observers registered at `A` stay at `A` and now see the output of the new
//! layer. The new layer's own handler is registered at `N`.

use super::filtered::{Accepted, FilteredLayer};
use super::{same_allocation, OwnerHandler, OwnerLayer, OwnerRegistry, OwnerSet};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

type AccessId = usize;
type LinkId = usize;

/// The topmost position of every stack. Insertions never move it.
const TOP: AccessId = 0;

struct AccessRecord {
    link: LinkId,
    handlers: Vec<Arc<dyn OwnerHandler>>,
}

struct LinkRecord {
    up: AccessId,
    layer: Arc<dyn OwnerLayer>,
    down: Option<AccessId>,
}

#[derive(Default)]
struct Topology {
    accesses: Vec<AccessRecord>,
    links: Vec<LinkRecord>,
}

impl Topology {
    fn layer_at(&self, access: AccessId) -> Option<Arc<dyn OwnerLayer>> {
        let record = self.accesses.get(access)?;
        self.links.get(record.link).map(|link| Arc::clone(&link.layer))
    }

    fn below(&self, access: AccessId) -> Option<AccessId> {
        let record = self.accesses.get(access)?;
        self.links.get(record.link).and_then(|link| link.down)
    }

    fn is_reachable(&self, access: AccessId) -> bool {
        let mut cur = Some(TOP);
        while let Some(id) = cur {
            if id == access {
                return true;
            }
            cur = self.below(id);
        }
        false
    }

    fn bottom(&self) -> AccessId {
        let mut cur = TOP;
        while let Some(next) = self.below(cur) {
            cur = next;
        }
        cur
    }
}

/// A delta waiting to be fanned out, with the observers registered when it
/// was produced.
struct Delivery {
    handlers: Vec<Arc<dyn OwnerHandler>>,
    added: OwnerSet,
    deleted: OwnerSet,
}

/// State shared by a stack and every handle into it.
pub(crate) struct StackShared {
    /// Stack-wide lock. Always taken before any layer-local lock.
    lock: ReentrantMutex<()>,
    /// Arena guard. Held only for short bookkeeping, never across calls into
    /// layers, creators or handlers.
    topology: RwLock<Topology>,
    /// Deltas produced while another delta is being fanned out.
    pending: Mutex<VecDeque<Delivery>>,
    /// Set while some `notify` call is draining `pending`.
    delivering: AtomicBool,
}

/// Resets the delivery state when the draining call returns or unwinds.
struct DeliveryGuard<'a>(&'a StackShared);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        // Leftovers only exist after an observer panicked mid fan-out.
        self.0.pending.lock().clear();
        self.0.delivering.store(false, Ordering::Release);
    }
}

impl StackShared {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            lock: ReentrantMutex::new(()),
            topology: RwLock::new(Topology::default()),
            pending: Mutex::new(VecDeque::new()),
            delivering: AtomicBool::new(false),
        })
    }

    fn register(&self, access: AccessId, handler: Arc<dyn OwnerHandler>) {
        let mut topology = self.topology.write();
        let Some(record) = topology.accesses.get_mut(access) else {
            return;
        };
        if record
            .handlers
            .iter()
            .any(|existing| same_allocation(existing, &handler))
        {
            return;
        }
        record.handlers.push(handler);
    }

    fn unregister(&self, access: AccessId, handler: &Arc<dyn OwnerHandler>) {
        let mut topology = self.topology.write();
        if let Some(record) = topology.accesses.get_mut(access) {
            record
                .handlers
                .retain(|existing| !same_allocation(existing, handler));
        }
    }

    /// Fan a delta out to the observers of `access`.
    ///
    /// Deltas raised from inside an observer are queued and delivered once
    /// the current fan-out is complete, so every observer sees deltas in the
    /// order they were produced. The outermost call drains the queue.
    fn notify(&self, access: AccessId, added: &OwnerSet, deleted: &OwnerSet) {
        let _order = self.lock.lock();
        let handlers = {
            let topology = self.topology.read();
            match topology.accesses.get(access) {
                Some(record) if !record.handlers.is_empty() => record.handlers.clone(),
                _ => return,
            }
        };
        self.pending.lock().push_back(Delivery {
            handlers,
            added: added.clone(),
            deleted: deleted.clone(),
        });
        if self.delivering.swap(true, Ordering::Acquire) {
            return;
        }

        let _guard = DeliveryGuard(self);
        loop {
            let next = self.pending.lock().pop_front();
            let Some(delivery) = next else {
                break;
            };
            for handler in &delivery.handlers {
                handler.owner_set_changed(&delivery.added, &delivery.deleted);
            }
        }
    }
}

/// Container owning an ordered chain of owner layers.
///
/// The stack is created with a base layer and grows by inserting layers at
/// existing positions. Layers are never removed.
pub struct OwnerStack {
    shared: Arc<StackShared>,
}

impl OwnerStack {
    /// Create a stack whose base layer is built by `creator`.
    ///
    /// The creator receives the link to notify through and `None` for the
    /// position below, since nothing lies below the base.
    pub fn new<C>(creator: C) -> Self
    where
        C: FnOnce(LayerLink, Option<LayerAccess>) -> Arc<dyn OwnerLayer>,
    {
        let shared = StackShared::new();
        let layer = creator(LayerLink::base(&shared), None);
        Self::from_base(shared, layer)
    }

    /// Create a stack on top of a fresh [`OwnerRegistry`].
    ///
    /// # Returns
    ///
    /// The stack and its base registry, which is where clients assert owner IDs.
    #[must_use]
    pub fn new_owners() -> (Self, Arc<OwnerRegistry>) {
        let shared = StackShared::new();
        let registry = Arc::new(OwnerRegistry::new(LayerLink::base(&shared)));
        let stack = Self::from_base(shared, Arc::clone(&registry) as Arc<dyn OwnerLayer>);
        (stack, registry)
    }

    /// Create a registry-based stack with one [`FilteredLayer`] per predicate.
    ///
    /// Filters are inserted at the top in order, so the last one ends up
    /// topmost. Insertion happens before any client can reach the registry.
    pub fn with_filters<I>(filters: I) -> (Self, Arc<OwnerRegistry>)
    where
        I: IntoIterator<Item = Accepted>,
    {
        let (stack, registry) = Self::new_owners();
        for accepted in filters {
            stack.insert_layer(&stack.access(), FilteredLayer::shared_creator(accepted));
        }
        (stack, registry)
    }

    fn from_base(shared: Arc<StackShared>, layer: Arc<dyn OwnerLayer>) -> Self {
        {
            let mut topology = shared.topology.write();
            topology.accesses.push(AccessRecord {
                link: 0,
                handlers: Vec::new(),
            });
            topology.links.push(LinkRecord {
                up: TOP,
                layer,
                down: None,
            });
        }
        Self { shared }
    }

    /// The topmost position, read by provider adapters.
    #[must_use]
    pub fn access(&self) -> LayerAccess {
        LayerAccess {
            stack: Arc::downgrade(&self.shared),
            id: TOP,
        }
    }

    /// The layer at the bottom of the stack.
    #[must_use]
    pub fn base_layer(&self) -> Arc<dyn OwnerLayer> {
        let _order = self.shared.lock.lock();
        let topology = self.shared.topology.read();
        let bottom = topology.bottom();
        // Every access record points at a link, so the bottom has a layer.
        Arc::clone(&topology.links[topology.accesses[bottom].link].layer)
    }

    /// The base layer as an [`OwnerRegistry`], if that is what it is.
    #[must_use]
    pub fn registry(&self) -> Option<Arc<OwnerRegistry>> {
        self.base_layer().into_any().downcast::<OwnerRegistry>().ok()
    }

    /// Splice a new layer directly below `at`.
    ///
    /// The layer currently serving `at` moves one position down, and `at`
    /// reads through the new layer from then on. The new layer is seeded with
    /// the IDs visible at `at` just before the splice, and the seeding is done
    /// before the layer becomes reachable. Snapshot, seeding, rewiring and
    /// `start` all run under the stack-wide lock, so no client change can
    /// slip in between.
    ///
    /// # Arguments
    ///
    /// * `at` - Position to insert at; must belong to this stack
    /// * `creator` - Builds the layer from its upward link and downward access
    ///
    /// # Returns
    ///
    /// `at` if the layer was inserted, `None` if `at` is not a position of
    /// this stack.
    pub fn insert_layer<C>(&self, at: &LayerAccess, creator: C) -> Option<LayerAccess>
    where
        C: FnOnce(LayerLink, Option<LayerAccess>) -> Arc<dyn OwnerLayer>,
    {
        if !Weak::ptr_eq(&at.stack, &Arc::downgrade(&self.shared)) {
            return None;
        }

        let _order = self.shared.lock.lock();

        let (current, down_id, link_id) = {
            let topology = self.shared.topology.read();
            if !topology.is_reachable(at.id) {
                return None;
            }
            (
                topology.layer_at(at.id)?,
                topology.accesses.len(),
                topology.links.len(),
            )
        };

        let snapshot = current.get_ids();
        debug!(
            position = at.id,
            snapshot = ?snapshot,
            "Inserting owner layer"
        );

        let weak = Arc::downgrade(&self.shared);
        let layer = creator(
            LayerLink {
                stack: weak.clone(),
                id: link_id,
            },
            Some(LayerAccess {
                stack: weak,
                id: down_id,
            }),
        );
        layer.seed(&snapshot);

        {
            let mut topology = self.shared.topology.write();
            if topology.accesses.len() != down_id || topology.links.len() != link_id {
                warn!(
                    position = at.id,
                    "Owner stack changed while the layer was being created, insertion dropped"
                );
                return None;
            }
            let pos = topology.accesses[at.id].link;
            topology.accesses.push(AccessRecord {
                link: pos,
                handlers: Vec::new(),
            });
            topology.links.push(LinkRecord {
                up: at.id,
                layer: Arc::clone(&layer),
                down: Some(down_id),
            });
            topology.links[pos].up = down_id;
            topology.accesses[at.id].link = link_id;
        }

        if let Some(handler) = layer.start(snapshot) {
            self.shared.register(down_id, handler);
        }

        Some(at.clone())
    }
}

impl fmt::Debug for OwnerStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topology = self.shared.topology.read();
        f.debug_struct("OwnerStack")
            .field("layers", &topology.links.len())
            .finish()
    }
}

/// Handle to a position in an owner stack.
///
/// This is what code outside the stack holds. Several callers may share the
/// same position; clones compare equal.
#[derive(Clone)]
pub struct LayerAccess {
    stack: Weak<StackShared>,
    id: AccessId,
}

impl LayerAccess {
    fn layer(&self) -> Option<Arc<dyn OwnerLayer>> {
        let shared = self.stack.upgrade()?;
        let topology = shared.topology.read();
        topology.layer_at(self.id)
    }

    /// Snapshot of the owner IDs visible at this position.
    #[must_use]
    pub fn get_ids(&self) -> OwnerSet {
        self.layer()
            .map(|layer| layer.get_ids())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_responsible_for(&self, id: &str) -> bool {
        self.layer()
            .is_some_and(|layer| layer.is_responsible_for(id))
    }

    /// The position one step further down, `None` at the base.
    #[must_use]
    pub fn next_layer(&self) -> Option<LayerAccess> {
        let shared = self.stack.upgrade()?;
        let _order = shared.lock.lock();
        let below = shared.topology.read().below(self.id)?;
        Some(LayerAccess {
            stack: self.stack.clone(),
            id: below,
        })
    }

    /// The layer currently serving this position.
    ///
    /// Meant for diagnostics; production code reads through the access.
    #[must_use]
    pub fn current_layer(&self) -> Option<Arc<dyn OwnerLayer>> {
        let shared = self.stack.upgrade()?;
        let _order = shared.lock.lock();
        let topology = shared.topology.read();
        topology.layer_at(self.id)
    }

    /// The layer serving this position, if it is a `T`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use dnsowner::owners::{FilteredLayer, OwnerStack};
    ///
    /// let (stack, _registry) = OwnerStack::new_owners();
    /// stack.insert_layer(&stack.access(), FilteredLayer::creator(|_: &str| true));
    ///
    /// let filter = stack.access().layer_as::<FilteredLayer>();
    /// assert!(filter.is_some());
    /// ```
    #[must_use]
    pub fn layer_as<T: OwnerLayer>(&self) -> Option<Arc<T>> {
        self.current_layer()?.into_any().downcast::<T>().ok()
    }

    /// Register an observer for changes visible at this position.
    ///
    /// Registering the same observer twice has no effect.
    pub fn register_handler(&self, handler: Arc<dyn OwnerHandler>) {
        if let Some(shared) = self.stack.upgrade() {
            let _order = shared.lock.lock();
            shared.register(self.id, handler);
        }
    }

    /// Remove an observer. Unknown observers are ignored.
    pub fn unregister_handler(&self, handler: &Arc<dyn OwnerHandler>) {
        if let Some(shared) = self.stack.upgrade() {
            let _order = shared.lock.lock();
            shared.unregister(self.id, handler);
        }
    }
}

impl PartialEq for LayerAccess {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.stack, &other.stack)
    }
}

impl Eq for LayerAccess {}

impl fmt::Debug for LayerAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerAccess").field("id", &self.id).finish()
    }
}

/// A layer's connection to the position above it.
///
/// Layers notify upward through their link and use it to take the
/// stack-wide lock before touching their own state.
#[derive(Clone)]
pub struct LayerLink {
    stack: Weak<StackShared>,
    id: LinkId,
}

impl LayerLink {
    fn base(shared: &Arc<StackShared>) -> Self {
        Self {
            stack: Arc::downgrade(shared),
            id: 0,
        }
    }

    /// Deliver a delta to every observer of the position above this layer.
    pub fn owner_set_changed(&self, added: &OwnerSet, deleted: &OwnerSet) {
        let Some(shared) = self.stack.upgrade() else {
            return;
        };
        let up = {
            let topology = shared.topology.read();
            match topology.links.get(self.id) {
                Some(link) => link.up,
                None => return,
            }
        };
        shared.notify(up, added, deleted);
    }

    /// Run `f` while holding the stack-wide lock.
    ///
    /// Layers take their local lock inside `f`, which yields the required
    /// order: stack lock first, local lock second, released in reverse.
    /// If the stack is gone, `f` runs unlocked; nobody is left to notify.
    pub fn locked<R>(&self, f: impl FnOnce() -> R) -> R {
        match self.stack.upgrade() {
            Some(shared) => {
                let _order = shared.lock.lock();
                f()
            }
            None => f(),
        }
    }
}

impl OwnerHandler for LayerLink {
    fn owner_set_changed(&self, added: &OwnerSet, deleted: &OwnerSet) {
        LayerLink::owner_set_changed(self, added, deleted);
    }
}

impl fmt::Debug for LayerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerLink").field("id", &self.id).finish()
    }
}

#[cfg(test)]
#[path = "stack_tests.rs"]
mod stack_tests;
