//! Store persistence behavior across processes' worth of state.

use std::fs;

use tempfile::TempDir;

use trafmon::core::store::Store;
use trafmon::core::threshold::{AlertTarget, ListKind, Threshold};
use trafmon::error::TrafmonError;

#[test]
fn test_full_round_trip_via_mutation_contract() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("counters.json");

    let mut store = Store::default();
    store.register_interface("router1", "eth0", 2);
    store.register_interface("router1", "eth1", 3);
    store.register_interface("switch1", "Gi0/1", 10001);
    store
        .add_threshold(
            "router1",
            "eth0",
            ListKind::MaxIn,
            Threshold::new(300.0, 2, AlertTarget::Email("noc@example.com".into())),
        )
        .unwrap();
    store
        .add_threshold(
            "router1",
            "eth0",
            ListKind::MaxIn,
            Threshold::new(1000.0, 1, AlertTarget::Critical),
        )
        .unwrap();
    store
        .add_threshold(
            "switch1",
            "Gi0/1",
            ListKind::MinOut,
            Threshold::new(50.0, 5, AlertTarget::Warning),
        )
        .unwrap();
    {
        let record = store.host_mut("router1").unwrap();
        record.uptime = Some(123_456);
        let iface = record.interfaces.get_mut("eth0").unwrap();
        iface.last_in = Some(42);
        iface.last_out = Some(4242);
        iface.hits.set(ListKind::MaxIn, 1);
    }

    store.save(&path).unwrap();
    let reloaded = Store::load(&path).unwrap();
    assert_eq!(reloaded, store);

    // Debounce streaks survive the round trip.
    let iface = &reloaded.host("router1").unwrap().interfaces["eth0"];
    assert_eq!(iface.hits.get(ListKind::MaxIn), 1);
    assert_eq!(iface.max_in.len(), 2);
}

#[test]
fn test_corrupt_store_is_fatal_not_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("counters.json");
    fs::write(&path, "]]] definitely not the store").unwrap();

    match Store::load(&path) {
        Err(TrafmonError::StoreCorrupt { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected StoreCorrupt, got {:?}", other),
    }
}

#[test]
fn test_store_document_is_human_auditable_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("counters.json");

    let mut store = Store::default();
    store.register_interface("router1", "eth0", 2);
    store
        .add_threshold(
            "router1",
            "eth0",
            ListKind::MaxOut,
            Threshold::new(500.0, 1, AlertTarget::Warning),
        )
        .unwrap();
    store.save(&path).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["hosts"]["router1"]["interfaces"]["eth0"]["index"], 2);
    assert_eq!(
        value["hosts"]["router1"]["interfaces"]["eth0"]["max_out"][0]["target"],
        "warn"
    );
}
