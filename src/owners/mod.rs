// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Owner-ID aggregation pipeline.
//!
//! DNS providers may only touch entries whose owner ID is currently live
//! somewhere in the cluster. Many independent sources ("clients") each assert
//! a set of owner IDs; this module folds those assertions into one
//! authoritative view and streams incremental changes to whoever listens.
//!
//! # Architecture
//!
//! ```text
//!   provider adapters ──► LayerAccess (top)      GetIds / IsResponsibleFor / observers
//!                              │
//!                         FilteredLayer          accepts a subset of owner IDs
//!                              │
//!                         LayerAccess
//!                              │
//!   reconcilers ────────► OwnerRegistry (base)   reference counts per owner ID
//! ```
//!
//! Each position in the chain is a [`LayerAccess`]. Deltas travel bottom-up:
//! the base registry reports owner IDs whose reference count crossed zero, and
//! each layer above re-emits the part of the delta it lets through.
//!
//! # Locking
//!
//! Every stack carries one stack-wide lock next to the local lock each layer
//! keeps for its own state. Anything that mutates and then notifies takes the
//! stack lock first, then its local lock, and drops them in reverse order.
//! Local locks are released before the delta is propagated, so observers may
//! read any layer from inside a callback. Plain reads only take the local lock.
//!
//! Observers may also change the stack from inside a callback. The resulting
//! delta is queued and fanned out only after the current one has reached every
//! observer, so all observers see deltas in the order they were produced.
//!
//! # Example
//!
//! ```rust
//! use dnsowner::owners::{owner_set, FilteredLayer, OwnerStack};
//!
//! let (stack, registry) = OwnerStack::new_owners();
//! registry.update_client("client1", owner_set(["id1", "id2"]));
//! registry.update_client("client2", owner_set(["id2", "id3"]));
//!
//! let allowed = owner_set(["id2", "id3"]);
//! stack.insert_layer(
//!     &stack.access(),
//!     FilteredLayer::creator(move |id: &str| allowed.contains(id)),
//! );
//!
//! assert_eq!(stack.access().get_ids(), owner_set(["id2", "id3"]));
//! ```

use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;

pub mod base;
pub mod cache;
pub mod filter;
pub mod filtered;
pub mod passthrough;
pub mod stack;

#[cfg(test)]
pub(crate) mod test_support;

pub use base::OwnerRegistry;
pub use cache::{ObjectKey, OwnerCache};
pub use filter::OwnerIdFilter;
pub use filtered::{Accepted, FilteredLayer};
pub use passthrough::PassThroughLayer;
pub use stack::{LayerAccess, LayerLink, OwnerStack};

/// Set of owner IDs.
///
/// Ordered so that log output and test expectations are deterministic.
pub type OwnerSet = BTreeSet<String>;

/// Build an [`OwnerSet`] from anything yielding string-like items.
pub fn owner_set<I, S>(ids: I) -> OwnerSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter().map(Into::into).collect()
}

/// Receives the delta of an owner set whenever it changes.
///
/// `added` and `deleted` are always disjoint. Callbacks run synchronously on
/// the thread that produced the change, while the stack-wide lock is held.
/// A change made from inside a callback is delivered after the current delta.
pub trait OwnerHandler: Send + Sync {
    fn owner_set_changed(&self, added: &OwnerSet, deleted: &OwnerSet);
}

/// One stage of an owner stack.
pub trait OwnerLayer: Send + Sync + 'static {
    /// Snapshot of the owner IDs visible at this layer.
    fn get_ids(&self) -> OwnerSet;

    fn is_responsible_for(&self, id: &str) -> bool;

    /// Fill internal state from the IDs visible directly below the layer.
    ///
    /// Called once, before the layer becomes reachable, so readers never
    /// observe it unseeded. Must not notify.
    fn seed(&self, _down: &OwnerSet) {}

    /// Activate the layer once it has been spliced into the stack.
    ///
    /// Receives the same IDs as [`OwnerLayer::seed`]. The returned handler is
    /// registered below the layer so it receives every later change from there.
    fn start(self: Arc<Self>, down: OwnerSet) -> Option<Arc<dyn OwnerHandler>>;

    /// Type-erased view used to recover the concrete layer.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Compare two trait objects by the address of their allocation.
pub(crate) fn same_allocation<T: ?Sized, U: ?Sized>(a: &Arc<T>, b: &Arc<U>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
