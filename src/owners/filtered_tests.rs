// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `filtered.rs`

#[cfg(test)]
mod tests {
    use crate::owners::test_support::{as_handler, ids, RecordingHandler};
    use crate::owners::{FilteredLayer, OwnerIdFilter, OwnerLayer, OwnerSet, OwnerStack};

    #[test]
    fn test_rejected_ids_never_reach_the_top() {
        let (stack, registry) = OwnerStack::new_owners();
        stack.insert_layer(&stack.access(), FilteredLayer::creator(|id: &str| id.ends_with('a')));
        let handler = RecordingHandler::new();
        stack.access().register_handler(as_handler(&handler));

        registry.update_client("client1", ids(&["1a", "2b"]));
        registry.update_client("client1", ids(&["3b"]));

        for (added, deleted) in handler.events() {
            assert!(added.iter().chain(deleted.iter()).all(|id| id.ends_with('a')));
        }
        assert_eq!(
            handler.events(),
            vec![(ids(&["1a"]), OwnerSet::new()), (OwnerSet::new(), ids(&["1a"]))]
        );
        assert!(!stack.access().is_responsible_for("3b"));
    }

    #[test]
    fn test_fully_absorbed_delta_stops_at_filter() {
        let (stack, registry) = OwnerStack::new_owners();
        stack.insert_layer(&stack.access(), FilteredLayer::creator(|id: &str| id == "keep"));
        let handler = RecordingHandler::new();
        stack.access().register_handler(as_handler(&handler));

        registry.update_client("client1", ids(&["drop1", "drop2"]));
        registry.delete_client("client1");

        assert_eq!(handler.count(), 0);
    }

    #[test]
    fn test_filter_changed_recomputes_from_below() {
        let filter = OwnerIdFilter::new(["id1"]);
        let (stack, registry) = OwnerStack::with_filters([filter.predicate()]);
        registry.update_client("client1", ids(&["id1", "id2", "id3"]));
        assert_eq!(stack.access().get_ids(), ids(&["id1"]));

        let handler = RecordingHandler::new();
        stack.access().register_handler(as_handler(&handler));

        filter.set_patterns(["id2", "id3"]);
        // Cache is stale until the layer is told.
        assert!(stack.access().is_responsible_for("id1"));

        let layer = stack.access().layer_as::<FilteredLayer>().expect("filter layer");
        layer.filter_changed();

        assert_eq!(stack.access().get_ids(), ids(&["id2", "id3"]));
        assert_eq!(handler.last(), Some((ids(&["id2", "id3"]), ids(&["id1"]))));

        layer.filter_changed();
        assert_eq!(handler.count(), 1);
    }

    #[test]
    fn test_start_reports_rejected_snapshot_members() {
        let (stack, registry) = OwnerStack::new_owners();
        registry.update_client("client1", ids(&["a", "b", "c"]));
        let handler = RecordingHandler::new();
        stack.access().register_handler(as_handler(&handler));

        stack.insert_layer(&stack.access(), FilteredLayer::creator(|id: &str| id == "b"));

        assert_eq!(handler.events(), vec![(OwnerSet::new(), ids(&["a", "c"]))]);
        let layer = stack.access().layer_as::<FilteredLayer>().expect("filter layer");
        assert_eq!(layer.get_ids(), ids(&["b"]));
        assert!(layer.is_responsible_for("b"));
        assert!(!layer.is_responsible_for("a"));
    }

    #[test]
    fn test_visible_delta_is_subset_of_base_delta() {
        let (stack, registry) = OwnerStack::new_owners();
        stack.insert_layer(&stack.access(), FilteredLayer::creator(|id: &str| id != "id2"));
        let base = RecordingHandler::new();
        let below = stack.access().next_layer().expect("registry position");
        below.register_handler(as_handler(&base));
        let top = RecordingHandler::new();
        stack.access().register_handler(as_handler(&top));

        registry.update_client("client1", ids(&["id1", "id2"]));
        registry.update_client("client2", ids(&["id2", "id3"]));
        registry.update_client("client1", ids(&["id4"]));

        let base_events = base.events();
        let top_events = top.events();
        assert_eq!(base_events.len(), top_events.len());
        for ((base_added, base_deleted), (top_added, top_deleted)) in
            base_events.iter().zip(top_events.iter())
        {
            assert!(top_added.is_subset(base_added));
            assert!(top_deleted.is_subset(base_deleted));
            assert!(!top_added.contains("id2") && !top_deleted.contains("id2"));
        }
    }
}
