use m17routes::core::store::{RouteMap, StoreError};

#[test]
fn alias_keeps_first_base_across_updates() {
    let mut map = RouteMap::new();
    let first = map.update("M17-ABC C", "", "10.0.0.1", "", 17000);
    let second = map.update("M17-ABC C", "", "10.0.0.2", "", 17001);
    assert_eq!(first.as_deref(), Some("M17-ABC"));
    assert_eq!(second.as_deref(), Some("M17-ABC"));
    assert_eq!(map.len(), 1);
    assert_eq!(map.host_count(), 1);
    assert_eq!(map.find("M17-ABC C").expect("record").port, 17001);
}

#[test]
fn returned_records_survive_later_updates() {
    let mut map = RouteMap::new();
    map.update("N7TAE/A", "", "10.0.0.1", "", 1);
    let before = map.find("N7TAE/A").expect("before");
    map.update("N7TAE/A", "", "10.0.0.9", "", 9);
    assert_eq!(before.ip4addr.as_deref(), Some("10.0.0.1"));
    assert_eq!(map.find("N7TAE/A").expect("after").port, 9);
}

#[test]
fn snapshot_round_trips_and_rejects_dangling_aliases() {
    let mut map = RouteMap::new();
    map.update("M17-XOR A", "xor.example.net", "", "", 17000);
    map.update("W1AW/B", "", "192.0.2.1", "none", 17001);

    let snapshot = map.export_snapshot();
    let restored = RouteMap::from_snapshot(snapshot.clone()).expect("restore");
    assert_eq!(restored.export_snapshot(), snapshot);

    let mut broken = snapshot;
    broken.aliases.push(("K1ABC/C".to_string(), "K1ABC".to_string()));
    assert!(matches!(
        RouteMap::from_snapshot(broken),
        Err(StoreError::DanglingAlias { .. })
    ));
}
