// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod tests {
    use crate::owners::test_support::{as_handler, ids, RecordingHandler};
    use crate::owners::{OwnerStack, PassThroughLayer};

    #[test]
    fn test_reads_follow_the_layer_below() {
        let (stack, registry) = OwnerStack::new_owners();
        stack.insert_layer(&stack.access(), PassThroughLayer::creator());
        registry.update_client("client1", ids(&["id1"]));

        assert!(stack.access().layer_as::<PassThroughLayer>().is_some());
        assert!(stack.access().is_responsible_for("id1"));
        assert!(!stack.access().is_responsible_for("id2"));

        registry.update_client("client1", ids(&["id2"]));
        assert_eq!(stack.access().get_ids(), ids(&["id2"]));
    }

    #[test]
    fn test_insertion_over_populated_stack_is_silent() {
        let (stack, registry) = OwnerStack::new_owners();
        registry.update_client("client1", ids(&["id1", "id2"]));
        let handler = RecordingHandler::new();
        stack.access().register_handler(as_handler(&handler));

        stack.insert_layer(&stack.access(), PassThroughLayer::creator());

        assert_eq!(handler.count(), 0);
        assert_eq!(stack.access().get_ids(), ids(&["id1", "id2"]));
    }
}
