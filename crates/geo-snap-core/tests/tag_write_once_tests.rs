//! Tests the write-once terminal lifecycle of record location tags.

use geo_snap_core::{
    Coordinates, CoreError, ImageData, LocationTag, RecordId, RecordStore, TagWrite,
};

fn store_with_one_record() -> (RecordStore, RecordId) {
    let mut store = RecordStore::new();
    let image = ImageData::new(1, 1, vec![9, 9, 9, 255]).expect("image fixture should be valid");
    let id = store.append(image, 500);
    (store, id)
}

#[test]
fn tag_write_once_tests_first_terminal_write_is_applied() {
    let (mut store, id) = store_with_one_record();
    let fix = Coordinates::new(37.0, -122.0);

    let write = store
        .tag_location(id, LocationTag::Resolved(fix))
        .expect("tag write should succeed");

    assert_eq!(write, TagWrite::Applied);
    assert_eq!(store.get(id).unwrap().location, LocationTag::Resolved(fix));
}

#[test]
fn tag_write_once_tests_second_write_is_ignored() {
    let (mut store, id) = store_with_one_record();
    store
        .tag_location(id, LocationTag::Denied)
        .expect("first write should succeed");
    let revision_after_first = store.revision();

    let write = store
        .tag_location(id, LocationTag::Resolved(Coordinates::new(1.0, 2.0)))
        .expect("second write should not error");

    assert_eq!(write, TagWrite::AlreadyTerminal);
    assert_eq!(store.get(id).unwrap().location, LocationTag::Denied);
    assert_eq!(store.revision(), revision_after_first);
}

#[test]
fn tag_write_once_tests_rejects_pending_writes_and_unknown_records() {
    let (mut store, id) = store_with_one_record();

    assert!(matches!(
        store.tag_location(id, LocationTag::Pending),
        Err(CoreError::NonTerminalTag)
    ));
    assert!(matches!(
        store.tag_location(RecordId(99), LocationTag::Denied),
        Err(CoreError::UnknownRecord(RecordId(99)))
    ));
}
