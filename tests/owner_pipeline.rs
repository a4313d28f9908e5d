// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end tests of the owner pipeline through the public API.
//!
//! These run without a cluster: `DNSOwner` objects are fed to the reconciler
//! directly and the effect is observed at the top of the owner stack.

use dnsowner::classes::Classes;
use dnsowner::config::Options;
use dnsowner::crd::{DNSOwner, DNSOwnerSpec};
use dnsowner::owners::{
    owner_set, FilteredLayer, OwnerHandler, OwnerIdFilter, OwnerLayer, OwnerSet, OwnerStack,
    PassThroughLayer,
};
use dnsowner::reconciler::OwnerReconciler;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(OwnerSet, OwnerSet)>>,
}

impl OwnerHandler for Recorder {
    fn owner_set_changed(&self, added: &OwnerSet, deleted: &OwnerSet) {
        self.events.lock().push((added.clone(), deleted.clone()));
    }
}

fn owner(name: &str, owner_id: &str, active: bool) -> DNSOwner {
    DNSOwner::new(
        name,
        DNSOwnerSpec {
            owner_id: owner_id.to_string(),
            active: Some(active),
        },
    )
}

#[tokio::test]
async fn test_dns_owners_flow_through_configured_filter() {
    let options = Options {
        owner_id_filters: vec!["dnscontroller".into(), "team-a-*".into()],
        ..Options::default()
    };
    options.validate().expect("valid options");
    let filter = options.owner_id_filter().expect("filter configured");
    let (stack, registry) = OwnerStack::with_filters([filter.predicate()]);
    let reconciler = OwnerReconciler::new(
        Arc::clone(&registry),
        options.identifier(),
        options.classes().expect("valid classes"),
    );

    reconciler
        .setup(
            vec![
                owner("a", "team-a-prod", true),
                owner("b", "team-b-prod", true),
            ],
            options.setup_workers(),
        )
        .await;

    assert_eq!(
        registry.get_ids(),
        owner_set(["dnscontroller", "team-a-prod", "team-b-prod"])
    );
    assert_eq!(
        stack.access().get_ids(),
        owner_set(["dnscontroller", "team-a-prod"])
    );

    // Widen the filter at runtime
    filter.set_patterns(["*"]);
    stack
        .access()
        .layer_as::<FilteredLayer>()
        .expect("filter on top")
        .filter_changed();
    assert!(stack.access().is_responsible_for("team-b-prod"));
}

#[tokio::test]
async fn test_layer_inserted_at_runtime_sees_existing_owners() {
    let (stack, registry) = OwnerStack::new_owners();
    let reconciler = OwnerReconciler::new(Arc::clone(&registry), "ctl", Classes::default());
    reconciler
        .setup(vec![owner("a", "keep", true), owner("b", "drop", true)], 2)
        .await;

    let recorder = Arc::new(Recorder::default());
    stack
        .access()
        .register_handler(Arc::clone(&recorder) as Arc<dyn OwnerHandler>);

    let filter = OwnerIdFilter::new(["keep", "ctl"]);
    let inserted = stack.insert_layer(&stack.access(), FilteredLayer::shared_creator(filter.predicate()));
    assert!(inserted.is_some());
    stack.insert_layer(&stack.access(), PassThroughLayer::creator());

    assert_eq!(stack.access().get_ids(), owner_set(["ctl", "keep"]));
    assert_eq!(
        recorder.events.lock().clone(),
        vec![(OwnerSet::new(), owner_set(["drop"]))]
    );

    reconciler
        .reconcile(&owner("a", "keep", false))
        .expect("named object");
    assert_eq!(stack.access().get_ids(), owner_set(["ctl"]));
    assert_eq!(registry.get_ids(), owner_set(["ctl", "drop"]));
}

#[test]
fn test_base_layer_is_the_registry() {
    let (stack, registry) = OwnerStack::new_owners();
    stack.insert_layer(&stack.access(), PassThroughLayer::creator());

    let base = stack.registry().expect("registry at the bottom");
    assert!(Arc::ptr_eq(&base, &registry));
}
