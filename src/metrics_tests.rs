// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `metrics.rs`

#[cfg(test)]
mod tests {
    use crate::metrics::*;
    use crate::owners::{owner_set, OwnerStack};
    use std::time::Duration;

    #[test]
    fn test_record_owner_event() {
        let counter = OWNER_EVENTS_TOTAL.with_label_values(&["test_event"]);
        let before = counter.get();

        record_owner_event("test_event");

        assert!(counter.get() > before);
    }

    #[test]
    fn test_record_setup() {
        let before = SETUP_DURATION_SECONDS.get_sample_count();
        record_setup(Duration::from_millis(5));
        assert!(SETUP_DURATION_SECONDS.get_sample_count() > before);
    }

    #[test]
    fn test_logging_handler_counts_changes() {
        let (stack, registry) = OwnerStack::new_owners();
        LoggingHandler::register(&stack.access());
        let added_before = OWNER_IDS_ADDED_TOTAL.get();
        let deleted_before = OWNER_IDS_DELETED_TOTAL.get();

        registry.update_client("client1", owner_set(["metrics-a", "metrics-b"]));
        registry.update_client("client1", owner_set(["metrics-b"]));

        assert!(OWNER_IDS_ADDED_TOTAL.get() >= added_before + 2);
        assert!(OWNER_IDS_DELETED_TOTAL.get() > deleted_before);
    }

    #[test]
    fn test_gather_metrics() {
        record_owner_event("gather_test");
        record_error("test_error");

        let metrics_text = gather_metrics().unwrap();
        assert!(
            metrics_text.contains("dns_firestoned_io"),
            "Metrics should contain namespace prefix"
        );
        assert!(metrics_text.contains("owner_events_total"));
        assert!(metrics_text.contains("errors_total"));
    }
}
