// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `base.rs`

#[cfg(test)]
mod tests {
    use crate::owners::test_support::{as_handler, ids, RecordingHandler};
    use crate::owners::{OwnerLayer, OwnerSet, OwnerStack};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_scenario_two_clients_then_delete() {
        let (stack, registry) = OwnerStack::new_owners();
        registry.update_client("client1", ids(&["id1", "id2"]));
        registry.update_client("client2", ids(&["id2", "id3"]));
        assert_eq!(registry.get_ids(), ids(&["id1", "id2", "id3"]));

        let handler = RecordingHandler::new();
        stack.access().register_handler(as_handler(&handler));
        registry.delete_client("client1");

        assert_eq!(registry.get_ids(), ids(&["id2", "id3"]));
        assert_eq!(handler.events(), vec![(OwnerSet::new(), ids(&["id1"]))]);
    }

    #[test]
    fn test_reference_counts_track_clients() {
        let (_stack, registry) = OwnerStack::new_owners();
        registry.update_client("client1", ids(&["id1", "id2"]));
        registry.update_client("client2", ids(&["id2"]));

        assert_eq!(registry.reference_count("id1"), 1);
        assert_eq!(registry.reference_count("id2"), 2);
        assert_eq!(registry.reference_count("id3"), 0);
        assert_eq!(registry.clients(), vec!["client1", "client2"]);
    }

    #[test]
    fn test_shared_id_survives_single_client_delete_silently() {
        let (stack, registry) = OwnerStack::new_owners();
        registry.update_client("client1", ids(&["id2"]));
        registry.update_client("client2", ids(&["id2"]));

        let handler = RecordingHandler::new();
        stack.access().register_handler(as_handler(&handler));
        registry.delete_client("client1");

        assert!(registry.is_responsible_for("id2"));
        assert_eq!(handler.count(), 0);
    }

    #[test]
    fn test_reassertion_fires_no_second_event() {
        let (stack, registry) = OwnerStack::new_owners();
        let handler = RecordingHandler::new();
        stack.access().register_handler(as_handler(&handler));

        registry.update_client("client1", ids(&["id1", "id2"]));
        registry.update_client("client1", ids(&["id1", "id2"]));

        assert_eq!(handler.count(), 1);
    }

    #[test]
    fn test_delete_unknown_client_is_silent() {
        let (stack, registry) = OwnerStack::new_owners();
        let handler = RecordingHandler::new();
        stack.access().register_handler(as_handler(&handler));

        registry.delete_client("ghost");

        assert_eq!(handler.count(), 0);
        assert_eq!(registry.get_ids(), OwnerSet::new());
    }

    #[test]
    fn test_empty_assertion_equals_absence() {
        let (_stack, registry) = OwnerStack::new_owners();
        registry.update_client("client1", ids(&["id1"]));
        registry.update_client("client1", OwnerSet::new());

        assert!(registry.clients().is_empty());
        assert_eq!(registry.get_ids_for("client1"), OwnerSet::new());
        assert!(!registry.is_responsible_for("id1"));
    }

    #[test]
    fn test_snapshots_are_not_aliased() {
        let (_stack, registry) = OwnerStack::new_owners();
        registry.update_client("client1", ids(&["id1"]));

        let mut ids_snapshot = registry.get_ids();
        ids_snapshot.insert("intruder".to_string());
        let mut client_snapshot = registry.get_ids_for("client1");
        client_snapshot.clear();

        assert_eq!(registry.get_ids(), ids(&["id1"]));
        assert_eq!(registry.get_ids_for("client1"), ids(&["id1"]));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Update(usize, Vec<usize>),
        Delete(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..4usize, proptest::collection::vec(0..6usize, 0..6))
                .prop_map(|(client, owners)| Op::Update(client, owners)),
            (0..4usize).prop_map(Op::Delete),
        ]
    }

    fn union(model: &BTreeMap<usize, OwnerSet>) -> OwnerSet {
        model.values().flatten().cloned().collect()
    }

    proptest! {
        #[test]
        fn zero_crossings_match_union_changes(ops in proptest::collection::vec(op_strategy(), 1..40)) {
            let (stack, registry) = OwnerStack::new_owners();
            let handler = RecordingHandler::new();
            stack.access().register_handler(as_handler(&handler));
            let mut model: BTreeMap<usize, OwnerSet> = BTreeMap::new();

            for op in ops {
                let before = union(&model);
                let events_before = handler.count();
                match op {
                    Op::Update(client, owners) => {
                        let set: OwnerSet = owners.iter().map(|i| format!("id{i}")).collect();
                        registry.update_client(&format!("client{client}"), set.clone());
                        model.insert(client, set);
                    }
                    Op::Delete(client) => {
                        registry.delete_client(&format!("client{client}"));
                        model.remove(&client);
                    }
                }
                let after = union(&model);
                let added: OwnerSet = after.difference(&before).cloned().collect();
                let deleted: OwnerSet = before.difference(&after).cloned().collect();

                prop_assert_eq!(registry.get_ids(), after.clone());
                if added.is_empty() && deleted.is_empty() {
                    prop_assert_eq!(handler.count(), events_before);
                } else {
                    prop_assert_eq!(handler.count(), events_before + 1);
                    prop_assert_eq!(handler.last(), Some((added, deleted)));
                }
                for id in &after {
                    let holders = model.values().filter(|set| set.contains(id)).count();
                    prop_assert_eq!(registry.reference_count(id), holders);
                }
            }
            prop_assert_eq!(handler.replay(), registry.get_ids());
        }
    }
}
