// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Identity layer: shows exactly what lies below it.

use super::{LayerAccess, LayerLink, OwnerHandler, OwnerLayer, OwnerSet};
use std::any::Any;
use std::sync::Arc;

/// Forwards reads to the position below and deltas to the position above.
///
/// Keeps no state of its own. Useful as a placeholder position that can later
/// receive a real layer, and for exercising stack wiring.
pub struct PassThroughLayer {
    up: LayerLink,
    down: Option<LayerAccess>,
}

impl PassThroughLayer {
    #[must_use]
    pub fn new(up: LayerLink, down: Option<LayerAccess>) -> Self {
        Self { up, down }
    }

    /// Creator for [`OwnerStack::insert_layer`](super::OwnerStack::insert_layer).
    pub fn creator() -> impl FnOnce(LayerLink, Option<LayerAccess>) -> Arc<dyn OwnerLayer> {
        |up: LayerLink, down: Option<LayerAccess>| -> Arc<dyn OwnerLayer> {
            Arc::new(Self::new(up, down))
        }
    }
}

impl OwnerLayer for PassThroughLayer {
    fn get_ids(&self) -> OwnerSet {
        self.down
            .as_ref()
            .map(LayerAccess::get_ids)
            .unwrap_or_default()
    }

    fn is_responsible_for(&self, id: &str) -> bool {
        self.down
            .as_ref()
            .is_some_and(|down| down.is_responsible_for(id))
    }

    fn start(self: Arc<Self>, _down: OwnerSet) -> Option<Arc<dyn OwnerHandler>> {
        Some(Arc::new(self.up.clone()))
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
#[path = "passthrough_tests.rs"]
mod passthrough_tests;
